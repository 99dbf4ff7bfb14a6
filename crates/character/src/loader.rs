use crate::config::CharacterConfig;
use crate::error::CharacterError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Raw bytes of a character's model and texture files.
///
/// Parsing the formats is left to the backend that draws them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterParts {
    pub body: Vec<u8>,
    pub skins: Vec<Vec<u8>>,
    /// `(model, skin)` per weapon.
    pub weapons: Vec<(Vec<u8>, Vec<u8>)>,
}

impl CharacterParts {
    pub fn byte_len(&self) -> usize {
        self.body.len()
            + self.skins.iter().map(Vec::len).sum::<usize>()
            + self.weapons.iter().map(|(m, s)| m.len() + s.len()).sum::<usize>()
    }
}

/// One-shot completion callback, invoked from whichever thread did the work.
pub type LoadCallback = Box<dyn FnOnce(Result<CharacterParts, CharacterError>) + Send + 'static>;

/// Fetches character parts without blocking the caller.
pub trait CharacterLoader {
    /// Start loading. `on_complete` is called exactly once.
    fn load(&self, config: &CharacterConfig, on_complete: LoadCallback);
}

fn read_part(path: &Path) -> Result<Vec<u8>, CharacterError> {
    let bytes = std::fs::read(path).map_err(|source| CharacterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(CharacterError::EmptyPart(path.to_path_buf()));
    }
    Ok(bytes)
}

fn read_parts(config: &CharacterConfig) -> Result<CharacterParts, CharacterError> {
    let body = read_part(&config.body_path())?;
    let skins = config
        .skin_paths()
        .map(|p| read_part(&p))
        .collect::<Result<Vec<_>, _>>()?;
    let weapons = config
        .weapon_paths()
        .map(|(model, skin)| Ok((read_part(&model)?, read_part(&skin)?)))
        .collect::<Result<Vec<_>, CharacterError>>()?;
    Ok(CharacterParts {
        body,
        skins,
        weapons,
    })
}

/// Reads part files on a worker thread.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    /// Relative `base_path`s resolve against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CharacterLoader for FsLoader {
    fn load(&self, config: &CharacterConfig, on_complete: LoadCallback) {
        let config = config.rooted_at(&self.root);
        // Shared so the callback can still fire if the thread never starts.
        let slot = Arc::new(Mutex::new(Some(on_complete)));
        let worker_slot = Arc::clone(&slot);

        tracing::debug!(body = %config.body_path().display(), "character load started");
        let spawned = std::thread::Builder::new()
            .name("character-loader".into())
            .spawn(move || {
                let result = read_parts(&config);
                match &result {
                    Ok(parts) => tracing::debug!(bytes = parts.byte_len(), "character parts read"),
                    Err(e) => tracing::warn!("character load failed: {e}"),
                }
                let callback = worker_slot.lock().ok().and_then(|mut s| s.take());
                if let Some(callback) = callback {
                    callback(result);
                }
            });

        if let Err(e) = spawned {
            let callback = slot.lock().ok().and_then(|mut s| s.take());
            if let Some(callback) = callback {
                callback(Err(CharacterError::Unavailable(e.to_string())));
            }
        }
    }
}

/// Completes immediately, on the calling thread, with fixed parts or a fixed failure.
#[derive(Debug, Clone)]
pub struct MemoryLoader {
    outcome: Result<CharacterParts, String>,
}

impl MemoryLoader {
    pub fn new(parts: CharacterParts) -> Self {
        Self { outcome: Ok(parts) }
    }

    /// A loader whose every load fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(reason.into()),
        }
    }

    /// Placeholder parts sized to the config: one entry per skin and weapon.
    pub fn placeholder(config: &CharacterConfig) -> Self {
        Self::new(CharacterParts {
            body: config.body.as_bytes().to_vec(),
            skins: config.skins.iter().map(|s| s.as_bytes().to_vec()).collect(),
            weapons: config
                .weapons
                .iter()
                .map(|w| (w.model.as_bytes().to_vec(), w.skin.as_bytes().to_vec()))
                .collect(),
        })
    }
}

impl CharacterLoader for MemoryLoader {
    fn load(&self, _config: &CharacterConfig, on_complete: LoadCallback) {
        let result = self.outcome.clone().map_err(CharacterError::Unavailable);
        on_complete(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeaponParts;
    use std::sync::mpsc;
    use std::time::Duration;

    fn write_ogro(dir: &Path) {
        std::fs::write(dir.join("ogro.md2"), b"IDP2body").unwrap();
        std::fs::write(dir.join("ctf_r.png"), b"skin").unwrap();
        std::fs::write(dir.join("weapon.md2"), b"IDP2weapon").unwrap();
        std::fs::write(dir.join("weapon.jpg"), b"wskin").unwrap();
    }

    fn config_in(dir: &Path) -> CharacterConfig {
        CharacterConfig {
            base_path: dir.to_path_buf(),
            ..CharacterConfig::default()
        }
    }

    fn load_blocking(loader: &dyn CharacterLoader, config: &CharacterConfig) -> Result<CharacterParts, CharacterError> {
        let (tx, rx) = mpsc::channel();
        loader.load(
            config,
            Box::new(move |r| {
                let _ = tx.send(r);
            }),
        );
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn fs_loader_reads_all_parts() {
        let tmp = tempfile::tempdir().unwrap();
        write_ogro(tmp.path());
        let parts = load_blocking(&FsLoader::default(), &config_in(tmp.path())).unwrap();
        assert_eq!(parts.body, b"IDP2body");
        assert_eq!(parts.skins.len(), 1);
        assert_eq!(parts.weapons[0].1, b"wskin");
    }

    #[test]
    fn fs_loader_resolves_relative_base() {
        let tmp = tempfile::tempdir().unwrap();
        let models = tmp.path().join("models/ogro");
        std::fs::create_dir_all(&models).unwrap();
        write_ogro(&models);
        let parts = load_blocking(&FsLoader::new(tmp.path()), &CharacterConfig::default()).unwrap();
        assert!(parts.byte_len() > 0);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_blocking(&FsLoader::default(), &config_in(tmp.path())).unwrap_err();
        assert!(matches!(err, CharacterError::Io { .. }));
    }

    #[test]
    fn empty_part_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_ogro(tmp.path());
        std::fs::write(tmp.path().join("ctf_r.png"), b"").unwrap();
        let err = load_blocking(&FsLoader::default(), &config_in(tmp.path())).unwrap_err();
        assert!(matches!(err, CharacterError::EmptyPart(_)));
    }

    #[test]
    fn memory_loader_completes_synchronously() {
        let config = CharacterConfig {
            weapons: vec![
                WeaponParts {
                    model: "a.md2".into(),
                    skin: "a.jpg".into(),
                },
                WeaponParts {
                    model: "b.md2".into(),
                    skin: "b.jpg".into(),
                },
            ],
            ..CharacterConfig::default()
        };
        let parts = load_blocking(&MemoryLoader::placeholder(&config), &config).unwrap();
        assert_eq!(parts.weapons.len(), 2);

        let err = load_blocking(&MemoryLoader::failing("offline"), &config).unwrap_err();
        assert!(err.to_string().contains("offline"));
    }
}

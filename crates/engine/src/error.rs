use mirrorworld_character::CharacterError;
use mirrorworld_common::ViewRole;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0} view already has a character rig")]
    RigExists(ViewRole),
    #[error("{0} view has no character rig")]
    NoRig(ViewRole),
    #[error("{0} character rig is already attached")]
    RigAlreadyAttached(ViewRole),
    #[error("{0} character rig failed to load earlier")]
    RigFailed(ViewRole),
    #[error("{role} character failed to load: {source}")]
    CharacterLoad {
        role: ViewRole,
        #[source]
        source: CharacterError,
    },
}

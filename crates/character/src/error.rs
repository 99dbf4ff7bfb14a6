use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{part} index {index} out of range ({len} loaded)")]
    IndexOutOfRange {
        part: &'static str,
        index: usize,
        len: usize,
    },
    #[error("part file is empty: {0}")]
    EmptyPart(PathBuf),
    #[error("loader unavailable: {0}")]
    Unavailable(String),
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a tagged query document.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to read query file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read query stream: {0}")]
    Io(#[from] std::io::Error),
}

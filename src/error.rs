// Error types for the library layer.
// Binaries wrap these in anyhow with context.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("application not found: {0}")]
    NotFound(String),

    #[error("application already exists: {0}")]
    Duplicate(String),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document path has no file name: {0:?}")]
    NoFileName(PathBuf),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize registration: {0}")]
    Encode(#[from] serde_json::Error),
}

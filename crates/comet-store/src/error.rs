use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Home directory not found")]
    NoHomeDirectory,

    #[error("Notebook not found in storage: {0}")]
    NotebookNotFound(String),

    #[error("Version not found for {notebook}: {at}")]
    VersionNotFound { notebook: String, at: String },

    #[error("Invalid notebook identity: {0:?}")]
    InvalidIdentity(String),

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot search for volumes in {path}: {source}")]
    VolumeSearch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CometError>;

#[derive(Debug, Error)]
pub enum CometError {
    #[error("malformed action descriptor: {0}")]
    MalformedAction(#[source] serde_json::Error),

    #[error("malformed notebook: {0}")]
    MalformedNotebook(#[source] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CometError {
    /// Wrap any collaborator failure as a storage error.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        CometError::Storage(err.to_string())
    }
}

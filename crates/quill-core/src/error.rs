//! Error types for quill-core

use thiserror::Error;

/// Result type alias using quill-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quill-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Empty text or category on add/import
    #[error("Invalid quote: {0}")]
    Validation(String),

    /// Remote fetch failed (transport error or non-success status)
    #[error("Network error: {0}")]
    Network(String),

    /// Persistence read/write failure (e.g., quota exceeded)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed or empty import payload
    #[error("Import error: {0}")]
    Import(String),

    /// Random pick requested over an empty collection
    #[error("No quotes available in this category")]
    EmptyCollection,

    /// Conflict resolution supplied while none is pending
    #[error("No conflict resolution is pending")]
    NoPendingResolution,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quill_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No quote text provided")]
    EmptyText,
    #[error("No category provided")]
    EmptyCategory,
    #[error("Import file must be a .json file: {0}")]
    NotJsonFile(String),
    #[error("Invalid server URL (must start with http:// or https://): {0}")]
    InvalidServerUrl(String),
}

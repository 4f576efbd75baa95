//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Write conflict on {key} after {attempts} attempts")]
    Conflict { key: String, attempts: usize },
}

pub type Result<T> = std::result::Result<T, StorageError>;

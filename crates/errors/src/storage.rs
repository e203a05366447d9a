//! Local storage error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("corrupted data: {message}")]
    CorruptedData { message: String },
}

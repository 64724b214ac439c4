//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data, either stored or about to be stored.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A filter or sort referenced a field with no column.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A thread panicked while holding the connection.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

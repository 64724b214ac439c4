//! Error types for the sync layer.

use catalog_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport failure talking to the content source.
    #[error("network error: {0}")]
    Network(String),

    /// The content source answered with a non-success status.
    #[error("content source returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The content source answered with something we cannot follow.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// An entry could not be turned into a product.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// The work queue refused the jobs.
    #[error("queue error: {0}")]
    Queue(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,
}

impl SyncError {
    /// Whether running the same job again could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::Mapping(_))
    }
}

impl From<StorageError> for SyncError {
    fn from(err: StorageError) -> Self {
        SyncError::Storage(err.to_string())
    }
}

//! Event store error types
//!
//! Defines all errors that can occur while querying or writing an event store.

use thiserror::Error;

/// Errors that can occur in an event store
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite query or connection failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store returned a grouping key that is not a bucket of the
    /// requested granularity
    #[error("Invalid bucket key: {0}")]
    InvalidBucketKey(String),

    /// Blocking store task panicked or was cancelled
    #[error("Store task failed: {0}")]
    Task(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::InvalidBucketKey("2022-9".to_string());
        assert_eq!(err.to_string(), "Invalid bucket key: 2022-9");

        let err = StoreError::Lock("poisoned".to_string());
        assert_eq!(err.to_string(), "Lock error: poisoned");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}

//! Storage-specific error types.
//!
//! All storage operations return [`StorageError`] on failure, which can be
//! matched to determine the underlying cause (database driver, bad row data,
//! internal invariant).

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid data in database (e.g., an id outside the column range).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

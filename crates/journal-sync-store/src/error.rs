//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during resource store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Resource not found.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A resource with this uid already exists.
    #[error("duplicate uid: {0}")]
    DuplicateUid(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Background task failed (panicked or was cancelled).
    #[error("blocking task failed: {0}")]
    Task(String),

    /// Failure injected or reported by a store backend.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

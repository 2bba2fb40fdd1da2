//! Error types for the journal client.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by a journal client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure; retried on the next scheduled sync.
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials rejected by the journal service.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Service temporarily unavailable.
    #[error("service unavailable (retry after {retry_after:?})")]
    ServiceUnavailable { retry_after: Option<Duration> },

    /// Unexpected HTTP status from the journal service.
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },

    /// The remote history does not match what the client expects.
    #[error("integrity error: {0}")]
    Integrity(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

//! Error types for the reconciliation engine.

use journal_sync_client::ClientError;
use journal_sync_core::{ChainError, CoreError, EntryId};
use journal_sync_store::StoreError;
use thiserror::Error;

/// Errors that abort a sync session.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local resource store failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Remote journal failure.
    #[error("journal error: {0}")]
    Client(#[from] ClientError),

    /// An entry could not be sealed, opened, or parsed.
    #[error("entry codec error: {0}")]
    Codec(#[from] CoreError),

    /// The fetched entries do not continue the local chain.
    #[error("chain integrity error: {0}")]
    Chain(#[from] ChainError),

    /// The remote head moved between fetch and push.
    #[error("push conflict: remote head is now {remote_head:?}")]
    Conflict { remote_head: Option<EntryId> },

    /// The journal service speaks a newer protocol.
    #[error("protocol version mismatch: local={local}, remote={remote}")]
    VersionMismatch { local: u8, remote: u8 },
}

/// How a failure is reported and whether it heals by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Network or I/O failure.
    Transport,
    /// Service asked us to come back later.
    ServiceUnavailable,
    /// Credentials need attention.
    Authorization,
    /// Broken chain, forged id, or undecodable payload.
    Integrity,
    /// Unexpected service response.
    Http,
    /// The local store failed.
    LocalStorage,
    /// Concurrent writer won the race to the head.
    Conflict,
}

impl ErrorClass {
    /// Whether running the session again later is expected to succeed.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorClass::Transport | ErrorClass::ServiceUnavailable | ErrorClass::Conflict
        )
    }
}

impl SyncError {
    /// Classify this error for reporting.
    pub fn class(&self) -> ErrorClass {
        match self {
            SyncError::Store(_) => ErrorClass::LocalStorage,
            SyncError::Client(e) => match e {
                ClientError::Transport(_) => ErrorClass::Transport,
                ClientError::Unauthorized(_) => ErrorClass::Authorization,
                ClientError::ServiceUnavailable { .. } => ErrorClass::ServiceUnavailable,
                ClientError::Http { .. } => ErrorClass::Http,
                ClientError::Integrity(_) => ErrorClass::Integrity,
            },
            SyncError::Codec(_) | SyncError::Chain(_) => ErrorClass::Integrity,
            SyncError::Conflict { .. } => ErrorClass::Conflict,
            SyncError::VersionMismatch { .. } => ErrorClass::Http,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_classification() {
        let cases = [
            (SyncError::from(ClientError::Transport("reset".into())), ErrorClass::Transport),
            (SyncError::from(ClientError::Unauthorized("401".into())), ErrorClass::Authorization),
            (
                SyncError::from(ClientError::ServiceUnavailable {
                    retry_after: Some(Duration::from_secs(5)),
                }),
                ErrorClass::ServiceUnavailable,
            ),
            (
                SyncError::from(ClientError::Http {
                    status: 500,
                    message: "boom".into(),
                }),
                ErrorClass::Http,
            ),
            (SyncError::from(StoreError::Backend("disk".into())), ErrorClass::LocalStorage),
            (
                SyncError::from(CoreError::SchemaError("no UID".into())),
                ErrorClass::Integrity,
            ),
            (
                SyncError::from(ChainError::DuplicateEntry(EntryId::from_bytes([1; 32]))),
                ErrorClass::Integrity,
            ),
            (SyncError::Conflict { remote_head: None }, ErrorClass::Conflict),
        ];

        for (error, class) in cases {
            assert_eq!(error.class(), class, "{error}");
        }
    }

    #[test]
    fn test_integrity_and_auth_are_not_retryable() {
        assert!(!ErrorClass::Integrity.is_retryable());
        assert!(!ErrorClass::Authorization.is_retryable());
        assert!(!ErrorClass::LocalStorage.is_retryable());
        assert!(ErrorClass::Transport.is_retryable());
        assert!(ErrorClass::Conflict.is_retryable());
    }
}

//! Error types for journal sync core.

use thiserror::Error;

use crate::types::EntryId;

/// Errors raised while sealing, opening, or decoding journal entries.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("decryption error: {0}")]
    DecryptionError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    /// The payload decoded but does not match the collection's content schema.
    #[error("schema error: {0}")]
    SchemaError(String),

    #[error("invalid entry id: {0}")]
    InvalidEntryId(String),
}

/// Chain integrity violations found in a fetched batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("broken link at index {index}: expected prev {expected:?}, got {got:?}")]
    BrokenLink {
        index: usize,
        expected: Option<EntryId>,
        got: Option<EntryId>,
    },

    #[error("entry id at index {index} does not authenticate its contents: {id}")]
    ForgedId { index: usize, id: EntryId },

    #[error("entry {0} appears more than once in the batch")]
    DuplicateEntry(EntryId),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

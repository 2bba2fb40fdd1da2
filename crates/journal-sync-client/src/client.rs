//! JournalClient trait: the engine's view of the remote journal.
//!
//! Implementations may talk HTTP, a local socket, or nothing at all
//! (see [`MemoryJournal`](crate::memory::MemoryJournal)).

use async_trait::async_trait;
use journal_sync_core::{EntryId, JournalEntry};

use crate::error::Result;

/// Journal protocol version spoken by this client.
pub const PROTOCOL_VERSION: u8 = 1;

/// What the remote journal service supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Journal protocol version of the service.
    pub protocol_version: u8,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

/// Result of appending a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The batch was appended after the expected head.
    Accepted,

    /// The remote head moved since it was read. Nothing was appended.
    Conflict { remote_head: Option<EntryId> },
}

impl PushOutcome {
    /// Whether the batch was appended.
    pub fn is_accepted(&self) -> bool {
        matches!(self, PushOutcome::Accepted)
    }
}

/// Async interface to one remote journal.
#[async_trait]
pub trait JournalClient: Send + Sync {
    /// Negotiate capabilities. Most services need nothing here.
    async fn query_capabilities(&self) -> Result<Capabilities> {
        Ok(Capabilities::default())
    }

    /// All entries strictly after `cursor`, in chain order.
    ///
    /// `None` fetches the journal from the beginning.
    async fn fetch_since(&self, cursor: Option<&EntryId>) -> Result<Vec<JournalEntry>>;

    /// Append a pre-linked batch after `expected_head`, atomically.
    async fn push_batch(
        &self,
        entries: &[JournalEntry],
        expected_head: Option<&EntryId>,
    ) -> Result<PushOutcome>;
}

#[async_trait]
impl<J: JournalClient + ?Sized> JournalClient for std::sync::Arc<J> {
    async fn query_capabilities(&self) -> Result<Capabilities> {
        (**self).query_capabilities().await
    }

    async fn fetch_since(&self, cursor: Option<&EntryId>) -> Result<Vec<JournalEntry>> {
        (**self).fetch_since(cursor).await
    }

    async fn push_batch(
        &self,
        entries: &[JournalEntry],
        expected_head: Option<&EntryId>,
    ) -> Result<PushOutcome> {
        (**self).push_batch(entries, expected_head).await
    }
}

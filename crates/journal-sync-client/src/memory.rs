//! In-memory journal for tests and local experiments.
//!
//! Behaves like a well-formed journal service: strictly append-only,
//! compare-and-append on the head, and refuses batches that do not link.

use async_trait::async_trait;
use tokio::sync::RwLock;

use journal_sync_core::{verify_chain, EntryId, JournalEntry};

use crate::client::{JournalClient, PushOutcome};
use crate::error::{ClientError, Result};

/// In-memory remote journal.
#[derive(Default)]
pub struct MemoryJournal {
    entries: RwLock<Vec<JournalEntry>>,
}

impl MemoryJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a journal that already holds `entries`.
    ///
    /// The entries are taken as-is, linked or not.
    pub fn with_entries(entries: Vec<JournalEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Id of the last entry.
    pub async fn head(&self) -> Option<EntryId> {
        self.entries.read().await.last().map(|e| e.id)
    }

    /// Snapshot of the whole journal.
    pub async fn entries(&self) -> Vec<JournalEntry> {
        self.entries.read().await.clone()
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the journal is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl JournalClient for MemoryJournal {
    async fn fetch_since(&self, cursor: Option<&EntryId>) -> Result<Vec<JournalEntry>> {
        let entries = self.entries.read().await;
        let start = match cursor {
            None => 0,
            Some(cursor) => entries
                .iter()
                .position(|e| &e.id == cursor)
                .map(|i| i + 1)
                .ok_or_else(|| {
                    ClientError::Integrity(format!("cursor {cursor} is not in this journal"))
                })?,
        };
        Ok(entries[start..].to_vec())
    }

    async fn push_batch(
        &self,
        batch: &[JournalEntry],
        expected_head: Option<&EntryId>,
    ) -> Result<PushOutcome> {
        let mut entries = self.entries.write().await;
        let head = entries.last().map(|e| e.id);

        if head.as_ref() != expected_head {
            tracing::debug!(?head, ?expected_head, "rejecting push: head moved");
            return Ok(PushOutcome::Conflict { remote_head: head });
        }

        verify_chain(head.as_ref(), batch)
            .map_err(|e| ClientError::Integrity(format!("rejected batch: {e}")))?;

        entries.extend_from_slice(batch);
        Ok(PushOutcome::Accepted)
    }
}

//! Chain rules: building pre-linked batches and verifying fetched ones.

use std::collections::HashSet;

use crate::crypto::ChainCodec;
use crate::entry::{JournalEntry, SyncEntry};
use crate::error::{ChainError, Result};
use crate::types::EntryId;

/// Builds a batch of entries, each linked to the one before it.
///
/// The first entry is anchored to the last known remote CTag, so the whole
/// batch can be appended atomically after that head.
#[derive(Debug)]
pub struct ChainBuilder {
    anchor: Option<EntryId>,
    entries: Vec<JournalEntry>,
}

impl ChainBuilder {
    /// Start a batch after `anchor`.
    pub fn new(anchor: Option<EntryId>) -> Self {
        Self {
            anchor,
            entries: Vec::new(),
        }
    }

    /// The id the next entry will link to.
    pub fn head(&self) -> Option<EntryId> {
        self.entries.last().map(|e| e.id).or(self.anchor)
    }

    /// Seal `entry` and append it to the batch.
    pub fn push<C: ChainCodec + ?Sized>(&mut self, codec: &C, entry: &SyncEntry) -> Result<EntryId> {
        let sealed = JournalEntry::seal(codec, entry, self.head())?;
        let id = sealed.id;
        self.entries.push(sealed);
        Ok(id)
    }

    /// Number of entries built so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish and return the linked batch.
    pub fn finish(self) -> Vec<JournalEntry> {
        self.entries
    }
}

/// Verify that `entries` continue the chain from `cursor` without gaps.
///
/// Entry 0 must link to `cursor`; entry *i* must link to entry *i-1*.
/// No entry may repeat.
pub fn verify_chain(cursor: Option<&EntryId>, entries: &[JournalEntry]) -> std::result::Result<(), ChainError> {
    let mut expected = cursor.copied();
    let mut seen = HashSet::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        if entry.prev != expected {
            return Err(ChainError::BrokenLink {
                index,
                expected,
                got: entry.prev,
            });
        }
        if !seen.insert(entry.id) || Some(entry.id) == cursor.copied() {
            return Err(ChainError::DuplicateEntry(entry.id));
        }
        expected = Some(entry.id);
    }

    Ok(())
}

/// Verify linkage and that every id authenticates its entry under `codec`.
pub fn verify_chain_with<C: ChainCodec + ?Sized>(
    codec: &C,
    cursor: Option<&EntryId>,
    entries: &[JournalEntry],
) -> std::result::Result<(), ChainError> {
    verify_chain(cursor, entries)?;

    for (index, entry) in entries.iter().enumerate() {
        if !codec.verify_id(entry) {
            return Err(ChainError::ForgedId {
                index,
                id: entry.id,
            });
        }
    }

    Ok(())
}

//! Per-session working state.
//!
//! Everything a session learns lives in a [`SessionContext`] that is dropped
//! when the session ends. Nothing survives into the next session except what
//! was committed to the store.

use std::collections::HashMap;

use journal_sync_client::Capabilities;
use journal_sync_core::{EntryId, JournalEntry, Resource, SyncEntry};

use crate::phase::Phase;
use crate::report::SyncStats;

/// Local resources keyed by uid.
///
/// Resources live in a flat arena; `by_uid` maps each uid to its slot.
#[derive(Debug, Default)]
pub struct LocalIndex {
    resources: Vec<Resource>,
    by_uid: HashMap<String, usize>,
}

impl LocalIndex {
    /// Index `resources`. Resources without a uid are left out.
    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut index = Self::default();
        for resource in resources {
            index.upsert(resource);
        }
        index
    }

    /// Insert or replace the resource with the same uid.
    pub fn upsert(&mut self, resource: Resource) {
        let Some(uid) = resource.uid().map(String::from) else {
            tracing::debug!(id = resource.id, "not indexing resource without uid");
            return;
        };

        match self.by_uid.get(&uid) {
            Some(&slot) => self.resources[slot] = resource,
            None => {
                self.by_uid.insert(uid, self.resources.len());
                self.resources.push(resource);
            }
        }
    }

    /// Remove the resource with this uid.
    pub fn remove(&mut self, uid: &str) -> Option<Resource> {
        let slot = self.by_uid.remove(uid)?;
        let removed = self.resources.swap_remove(slot);

        // The former last element now occupies `slot`.
        if let Some(moved) = self.resources.get(slot).and_then(|r| r.uid()) {
            self.by_uid.insert(moved.to_string(), slot);
        }
        Some(removed)
    }

    pub fn get(&self, uid: &str) -> Option<&Resource> {
        self.by_uid.get(uid).map(|&slot| &self.resources[slot])
    }

    pub fn get_mut(&mut self, uid: &str) -> Option<&mut Resource> {
        let slot = *self.by_uid.get(uid)?;
        self.resources.get_mut(slot)
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.by_uid.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }
}

/// A local change waiting to be pushed.
#[derive(Debug, Clone)]
pub struct OutgoingEntry {
    /// Store id of the resource the change came from.
    pub resource_id: i64,
    pub uid: String,
    pub entry: SyncEntry,
}

/// A fetched entry, opened and parsed.
#[derive(Debug, Clone)]
pub struct DecodedEntry {
    pub id: EntryId,
    /// Uid of the resource the entry is about.
    pub uid: String,
    pub entry: SyncEntry,
}

/// Working state of one session.
#[derive(Debug)]
pub struct SessionContext {
    /// The phase currently running.
    pub phase: Phase,
    /// CTag as loaded from the store.
    pub saved_ctag: Option<EntryId>,
    /// Working remote cursor, committed only by SAVE_SYNC_TAG.
    pub remote_ctag: Option<EntryId>,
    pub capabilities: Capabilities,
    pub local: LocalIndex,
    /// Local changes, in push order.
    pub outgoing: Vec<OutgoingEntry>,
    /// `outgoing`, sealed and linked.
    pub batch: Vec<JournalEntry>,
    /// Where `batch` is anchored.
    pub batch_anchor: Option<EntryId>,
    pub fetched: Vec<DecodedEntry>,
    pub stats: SyncStats,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            phase: Phase::Prepare,
            saved_ctag: None,
            remote_ctag: None,
            capabilities: Capabilities::default(),
            local: LocalIndex::default(),
            outgoing: Vec::new(),
            batch: Vec::new(),
            batch_anchor: None,
            fetched: Vec::new(),
            stats: SyncStats::default(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

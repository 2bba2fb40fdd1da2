//! Journal entries and the logical sync entries they carry.
//!
//! A [`JournalEntry`] is immutable once the journal service accepts it.
//! Changes are represented as new entries appended to the chain.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::ChainCodec;
use crate::error::{CoreError, Result};
use crate::types::EntryId;

/// The change an entry records for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncAction {
    #[serde(rename = "ADD")]
    Add,
    #[serde(rename = "CHANGE")]
    Change,
    #[serde(rename = "DELETE")]
    Delete,
}

impl SyncAction {
    /// The wire tag of this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Change => "CHANGE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded, logical change record: resource content plus action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntry {
    /// Serialized resource content (vCard, iCalendar, ...).
    pub content: String,
    /// What happened to the resource.
    pub action: SyncAction,
}

impl SyncEntry {
    /// Create a new sync entry.
    pub fn new(content: impl Into<String>, action: SyncAction) -> Self {
        Self {
            content: content.into(),
            action,
        }
    }

    /// Check the action.
    pub fn is_action(&self, action: SyncAction) -> bool {
        self.action == action
    }

    /// Encode to the JSON payload that gets sealed into a journal entry.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Decode from a JSON payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }

    /// Open a journal entry with the codec and decode its payload.
    pub fn from_journal_entry<C: ChainCodec + ?Sized>(codec: &C, entry: &JournalEntry) -> Result<Self> {
        let payload = codec.open(&entry.sealed)?;
        Self::from_json(&payload)
    }
}

/// One link in the remote journal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Content identifier, bound to `prev` and `sealed` by the codec.
    pub id: EntryId,
    /// The chain predecessor. `None` only for the first entry of a journal.
    pub prev: Option<EntryId>,
    /// Encrypted payload, opaque without the collection secret.
    pub sealed: Bytes,
}

impl JournalEntry {
    /// Seal a sync entry into a new journal entry linked after `prev`.
    pub fn seal<C: ChainCodec + ?Sized>(
        codec: &C,
        entry: &SyncEntry,
        prev: Option<EntryId>,
    ) -> Result<Self> {
        let payload = entry.to_json()?;
        let (id, sealed) = codec.seal(&payload, prev.as_ref())?;
        Ok(Self { id, prev, sealed })
    }

    /// Whether this entry directly follows `cursor`.
    pub fn follows(&self, cursor: Option<&EntryId>) -> bool {
        self.prev.as_ref() == cursor
    }
}

impl fmt::Debug for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JournalEntry")
            .field("id", &self.id)
            .field("prev", &self.prev)
            .field("sealed_len", &self.sealed.len())
            .finish()
    }
}

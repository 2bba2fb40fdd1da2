//! Local resources as seen by the sync engine.

use serde::{Deserialize, Serialize};

/// A record in the local collection (a contact, an event, ...).
///
/// Owned by the resource store. The engine reads the flags and asks the store
/// to clear or delete at defined points of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Store-local identifier.
    pub id: i64,
    /// Globally unique id, the key visible in the journal. Assigned once.
    pub uid: Option<String>,
    /// Serialized content.
    pub content: String,
    /// True until the resource has been pushed once.
    pub local_only: bool,
    /// Locally modified and not yet pushed.
    pub dirty: bool,
    /// Tombstone, pending propagation.
    pub deleted: bool,
}

impl Resource {
    /// A new locally created resource: dirty, never pushed.
    pub fn new_local(id: i64, uid: Option<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            uid,
            content: content.into(),
            local_only: true,
            dirty: true,
            deleted: false,
        }
    }

    /// A resource materialized from a remote entry: clean and known remotely.
    pub fn from_remote(id: i64, uid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            uid: Some(uid.into()),
            content: content.into(),
            local_only: false,
            dirty: false,
            deleted: false,
        }
    }

    /// The uid, if one has been assigned.
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref().filter(|u| !u.is_empty())
    }

    /// Whether the resource still needs a uid.
    pub fn needs_uid(&self) -> bool {
        self.uid().is_none()
    }
}

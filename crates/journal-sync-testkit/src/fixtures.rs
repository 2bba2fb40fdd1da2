//! Test fixtures and helpers.
//!
//! Common setup code for engine and integration tests.

use std::sync::Arc;

use journal_sync_client::MemoryJournal;
use journal_sync_core::{
    ChainBuilder, CollectionSecret, EntryId, JournalEntry, SealedChainCodec, SyncAction, SyncEntry,
};
use journal_sync_store::MemoryResourceStore;

/// Secret used by [`TestFixture::new`].
pub const TEST_SECRET: [u8; 32] = [0x42; 32];

/// A codec with a fixed secret, a memory store, and a memory journal.
///
/// Store and journal are behind `Arc` so a test can hand clones to an
/// engine and still inspect them afterwards.
pub struct TestFixture {
    pub codec: SealedChainCodec,
    pub store: Arc<MemoryResourceStore>,
    pub journal: Arc<MemoryJournal>,
}

impl TestFixture {
    /// Fixture keyed with [`TEST_SECRET`].
    pub fn new() -> Self {
        Self::with_secret(TEST_SECRET)
    }

    /// Fixture keyed with a specific secret.
    pub fn with_secret(secret: [u8; 32]) -> Self {
        Self {
            codec: SealedChainCodec::new(CollectionSecret::from_bytes(secret)),
            store: Arc::new(MemoryResourceStore::new()),
            journal: Arc::new(MemoryJournal::new()),
        }
    }

    /// A second client of the same collection: same secret and journal, its
    /// own local store.
    pub fn peer(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            store: Arc::new(MemoryResourceStore::new()),
            journal: Arc::clone(&self.journal),
        }
    }

    /// Start a remote chain after `anchor`, sealed with this fixture's codec.
    pub fn remote_chain(&self, anchor: Option<EntryId>) -> RemoteChain {
        RemoteChain::new(self.codec.clone(), anchor)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds synthetic journal histories.
pub struct RemoteChain {
    codec: SealedChainCodec,
    builder: ChainBuilder,
}

impl RemoteChain {
    pub fn new(codec: SealedChainCodec, anchor: Option<EntryId>) -> Self {
        Self {
            codec,
            builder: ChainBuilder::new(anchor),
        }
    }

    /// Append an entry.
    pub fn entry(mut self, content: impl Into<String>, action: SyncAction) -> Self {
        self.builder
            .push(&self.codec, &SyncEntry::new(content, action))
            .expect("sealing a test entry failed");
        self
    }

    pub fn add(self, content: impl Into<String>) -> Self {
        self.entry(content, SyncAction::Add)
    }

    pub fn change(self, content: impl Into<String>) -> Self {
        self.entry(content, SyncAction::Change)
    }

    pub fn delete(self, content: impl Into<String>) -> Self {
        self.entry(content, SyncAction::Delete)
    }

    /// Id the next entry would link to.
    pub fn head(&self) -> Option<EntryId> {
        self.builder.head()
    }

    pub fn build(self) -> Vec<JournalEntry> {
        self.builder.finish()
    }
}

/// A minimal vCard with the given uid.
pub fn vcard(uid: &str, name: &str) -> String {
    format!("BEGIN:VCARD\r\nVERSION:4.0\r\nUID:{uid}\r\nFN:{name}\r\nEND:VCARD\r\n")
}

/// A minimal iCalendar event with the given uid.
pub fn vevent(uid: &str, summary: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:{uid}\r\nSUMMARY:{summary}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
    )
}

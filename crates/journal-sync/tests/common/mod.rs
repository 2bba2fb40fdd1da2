//! Shared setup for engine integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use journal_sync::client::JournalClient;
use journal_sync::collection::uid_property;
use journal_sync::core::{CoreError, Resource, SealedChainCodec};
use journal_sync::store::ResourceStore;
use journal_sync::{
    CancellationToken, CollectionKind, ContactsCollection, LocalIndex, SyncConfig, SyncEngine,
};
use journal_sync_testkit::TestFixture;

pub const ACCOUNT: &str = "test@example.com";

pub type ContactsEngine<S, J> = SyncEngine<S, J, SealedChainCodec, ContactsCollection>;

/// Engine for a contacts collection keyed like `fixture`.
pub fn contacts_engine<S: ResourceStore, J: JournalClient>(
    fixture: &TestFixture,
    store: S,
    journal: J,
) -> ContactsEngine<S, J> {
    contacts_engine_with(fixture, store, journal, SyncConfig::default())
}

pub fn contacts_engine_with<S: ResourceStore, J: JournalClient>(
    fixture: &TestFixture,
    store: S,
    journal: J,
    config: SyncConfig,
) -> ContactsEngine<S, J> {
    SyncEngine::new(
        store,
        journal,
        fixture.codec.clone(),
        ContactsCollection::new(ACCOUNT),
        config,
    )
}

/// Install a test subscriber; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `(uid, content)` of every resource, sorted.
pub async fn snapshot<S: ResourceStore>(store: &S) -> Vec<(String, String)> {
    let mut all: Vec<_> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.uid().unwrap_or_default().to_string(), r.content))
        .collect();
    all.sort();
    all
}

/// A collection kind that records its hooks and can cancel the session
/// from inside one.
#[derive(Default)]
pub struct RecordingKind {
    pub calls: Mutex<Vec<&'static str>>,
    /// Uids visible to `apply_local_entries`.
    pub seen_uids: Mutex<Vec<String>>,
    pub cancel_on_apply_local: Option<CancellationToken>,
    /// Payloads built so far.
    pub outgoing_calls: AtomicUsize,
    pub cancel_on_outgoing: Option<CancellationToken>,
}

impl RecordingKind {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn outgoing_calls(&self) -> usize {
        self.outgoing_calls.load(Ordering::SeqCst)
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CollectionKind for RecordingKind {
    fn notification_id(&self) -> u32 {
        99
    }

    fn sync_error_title(&self) -> String {
        "Recording sync failed".into()
    }

    fn extract_uid(&self, content: &str) -> Result<String, CoreError> {
        uid_property(content)
    }

    fn outgoing_content(&self, resource: &Resource, _uid: &str) -> String {
        self.outgoing_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_outgoing {
            token.cancel();
        }
        resource.content.clone()
    }

    async fn prepare(&self, store: &dyn ResourceStore) -> journal_sync::Result<bool> {
        self.record("prepare");
        Ok(store.collection_exists().await?)
    }

    async fn apply_local_entries(
        &self,
        _store: &dyn ResourceStore,
        local: &LocalIndex,
    ) -> journal_sync::Result<()> {
        self.record("apply_local_entries");
        let mut uids: Vec<String> = local.iter().filter_map(|r| r.uid()).map(String::from).collect();
        uids.sort();
        *self.seen_uids.lock().unwrap() = uids;
        if let Some(token) = &self.cancel_on_apply_local {
            token.cancel();
        }
        Ok(())
    }

    async fn post_process(&self, _store: &dyn ResourceStore) -> journal_sync::Result<()> {
        self.record("post_process");
        Ok(())
    }
}

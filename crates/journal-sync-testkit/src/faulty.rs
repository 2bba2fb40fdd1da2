//! Fault injection for resource stores.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use journal_sync_core::{EntryId, Resource};
use journal_sync_store::{ResourceStore, Result, StoreError};

/// A [`ResourceStore`] operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListAll,
    ListDirty,
    ListDeleted,
    ListWithoutUid,
    GetByUid,
    AssignUid,
    ClearDirty,
    HardDelete,
    InsertRemote,
    UpdateRemote,
    DeleteByUid,
    GetCtag,
    SetCtag,
    CollectionExists,
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// Wraps a store and fails chosen operations with a backend error.
///
/// Hooks run when an operation is called, before it reaches the inner
/// store, so a test can act at an exact point of a session.
pub struct FaultyStore<S> {
    inner: S,
    failing: RwLock<HashSet<StoreOp>>,
    hooks: RwLock<HashMap<StoreOp, Hook>>,
}

impl<S: ResourceStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing: RwLock::new(HashSet::new()),
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Make `op` fail until [`heal`](Self::heal) is called.
    pub async fn fail_on(&self, op: StoreOp) {
        self.failing.write().await.insert(op);
    }

    /// Run `hook` every time `op` is called.
    pub async fn on_call(&self, op: StoreOp, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks.write().await.insert(op, Box::new(hook));
    }

    /// Stop failing anything.
    pub async fn heal(&self) {
        self.failing.write().await.clear();
    }

    async fn check(&self, op: StoreOp) -> Result<()> {
        if let Some(hook) = self.hooks.read().await.get(&op) {
            hook();
        }
        if self.failing.read().await.contains(&op) {
            return Err(StoreError::Backend(format!("injected failure in {op:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: ResourceStore> ResourceStore for FaultyStore<S> {
    async fn list_all(&self) -> Result<Vec<Resource>> {
        self.check(StoreOp::ListAll).await?;
        self.inner.list_all().await
    }

    async fn list_dirty(&self) -> Result<Vec<Resource>> {
        self.check(StoreOp::ListDirty).await?;
        self.inner.list_dirty().await
    }

    async fn list_deleted(&self) -> Result<Vec<Resource>> {
        self.check(StoreOp::ListDeleted).await?;
        self.inner.list_deleted().await
    }

    async fn list_without_uid(&self) -> Result<Vec<Resource>> {
        self.check(StoreOp::ListWithoutUid).await?;
        self.inner.list_without_uid().await
    }

    async fn get_by_uid(&self, uid: &str) -> Result<Option<Resource>> {
        self.check(StoreOp::GetByUid).await?;
        self.inner.get_by_uid(uid).await
    }

    async fn assign_uid(&self, id: i64, uid: &str) -> Result<()> {
        self.check(StoreOp::AssignUid).await?;
        self.inner.assign_uid(id, uid).await
    }

    async fn clear_dirty(&self, uid: &str) -> Result<()> {
        self.check(StoreOp::ClearDirty).await?;
        self.inner.clear_dirty(uid).await
    }

    async fn hard_delete(&self, id: i64) -> Result<()> {
        self.check(StoreOp::HardDelete).await?;
        self.inner.hard_delete(id).await
    }

    async fn insert_remote(&self, uid: &str, content: &str) -> Result<Resource> {
        self.check(StoreOp::InsertRemote).await?;
        self.inner.insert_remote(uid, content).await
    }

    async fn update_remote(&self, uid: &str, content: &str) -> Result<()> {
        self.check(StoreOp::UpdateRemote).await?;
        self.inner.update_remote(uid, content).await
    }

    async fn delete_by_uid(&self, uid: &str) -> Result<bool> {
        self.check(StoreOp::DeleteByUid).await?;
        self.inner.delete_by_uid(uid).await
    }

    async fn get_ctag(&self) -> Result<Option<EntryId>> {
        self.check(StoreOp::GetCtag).await?;
        self.inner.get_ctag().await
    }

    async fn set_ctag(&self, ctag: Option<EntryId>) -> Result<()> {
        self.check(StoreOp::SetCtag).await?;
        self.inner.set_ctag(ctag).await
    }

    async fn collection_exists(&self) -> Result<bool> {
        self.check(StoreOp::CollectionExists).await?;
        self.inner.collection_exists().await
    }
}

//! In-memory implementation of the ResourceStore trait.
//!
//! Primarily for testing. Same semantics as SQLite, nothing persisted.
//! Besides the trait, it exposes the edits an application makes between
//! sessions (create, modify, delete) so tests can stage local state.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use journal_sync_core::{EntryId, Resource};

use crate::error::{Result, StoreError};
use crate::traits::ResourceStore;

/// In-memory resource store.
///
/// Thread-safe via an async RwLock.
pub struct MemoryResourceStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Resources by store id, in creation order.
    resources: BTreeMap<i64, Resource>,

    /// uid -> store id.
    uids: HashMap<String, i64>,

    next_id: i64,

    ctag: Option<EntryId>,

    /// When false, `collection_exists` reports the collection as gone.
    exists: bool,
}

impl MemoryStoreInner {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn by_uid_mut(&mut self, uid: &str) -> Result<&mut Resource> {
        let id = *self
            .uids
            .get(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        self.resources
            .get_mut(&id)
            .ok_or_else(|| StoreError::InvalidData(format!("dangling uid index: {uid}")))
    }

    fn remove(&mut self, id: i64) -> Option<Resource> {
        let removed = self.resources.remove(&id)?;
        if let Some(uid) = removed.uid() {
            self.uids.remove(uid);
        }
        Some(removed)
    }
}

impl MemoryResourceStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                exists: true,
                ..Default::default()
            }),
        }
    }

    /// Create a resource the way an application would: dirty and local-only.
    ///
    /// `uid` may be `None` to simulate records created by other apps.
    pub async fn create_local(&self, uid: Option<&str>, content: &str) -> Result<Resource> {
        let mut inner = self.inner.write().await;
        if let Some(uid) = uid {
            if inner.uids.contains_key(uid) {
                return Err(StoreError::DuplicateUid(uid.to_string()));
            }
        }

        let id = inner.allocate_id();
        let resource = Resource::new_local(id, uid.map(String::from), content);
        if let Some(uid) = resource.uid() {
            inner.uids.insert(uid.to_string(), id);
        }
        inner.resources.insert(id, resource.clone());
        Ok(resource)
    }

    /// Edit a resource locally, marking it dirty.
    pub async fn modify_local(&self, uid: &str, content: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let resource = inner.by_uid_mut(uid)?;
        resource.content = content.to_string();
        resource.dirty = true;
        Ok(())
    }

    /// Delete a resource locally, leaving a tombstone.
    pub async fn delete_local(&self, uid: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.by_uid_mut(uid)?.deleted = true;
        Ok(())
    }

    /// Insert a resource with explicit flags.
    pub async fn insert_raw(&self, mut resource: Resource) -> Result<Resource> {
        let mut inner = self.inner.write().await;
        let id = inner.allocate_id();
        resource.id = id;
        if let Some(uid) = resource.uid() {
            if inner.uids.contains_key(uid) {
                return Err(StoreError::DuplicateUid(uid.to_string()));
            }
            inner.uids.insert(uid.to_string(), id);
        }
        inner.resources.insert(id, resource.clone());
        Ok(resource)
    }

    /// Mark the collection as removed (or restored).
    pub async fn set_exists(&self, exists: bool) {
        self.inner.write().await.exists = exists;
    }

    /// Number of stored resources, tombstones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.resources.len()
    }

    /// Whether the store holds no resources.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.resources.is_empty()
    }
}

impl Default for MemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn list_all(&self) -> Result<Vec<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner.resources.values().cloned().collect())
    }

    async fn list_dirty(&self) -> Result<Vec<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner
            .resources
            .values()
            .filter(|r| r.dirty && !r.deleted)
            .cloned()
            .collect())
    }

    async fn list_deleted(&self) -> Result<Vec<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner
            .resources
            .values()
            .filter(|r| r.deleted)
            .cloned()
            .collect())
    }

    async fn list_without_uid(&self) -> Result<Vec<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner
            .resources
            .values()
            .filter(|r| r.needs_uid())
            .cloned()
            .collect())
    }

    async fn get_by_uid(&self, uid: &str) -> Result<Option<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner
            .uids
            .get(uid)
            .and_then(|id| inner.resources.get(id))
            .cloned())
    }

    async fn assign_uid(&self, id: i64, uid: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.uids.contains_key(uid) {
            return Err(StoreError::DuplicateUid(uid.to_string()));
        }

        let resource = inner
            .resources
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("#{id}")))?;
        let old = resource.uid.replace(uid.to_string());
        if let Some(old) = old.filter(|u| !u.is_empty()) {
            inner.uids.remove(&old);
        }
        inner.uids.insert(uid.to_string(), id);
        Ok(())
    }

    async fn clear_dirty(&self, uid: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let resource = inner.by_uid_mut(uid)?;
        resource.dirty = false;
        resource.local_only = false;
        Ok(())
    }

    async fn hard_delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.remove(id);
        Ok(())
    }

    async fn insert_remote(&self, uid: &str, content: &str) -> Result<Resource> {
        let mut inner = self.inner.write().await;
        if inner.uids.contains_key(uid) {
            return Err(StoreError::DuplicateUid(uid.to_string()));
        }

        let id = inner.allocate_id();
        let resource = Resource::from_remote(id, uid, content);
        inner.uids.insert(uid.to_string(), id);
        inner.resources.insert(id, resource.clone());
        Ok(resource)
    }

    async fn update_remote(&self, uid: &str, content: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let resource = inner.by_uid_mut(uid)?;
        resource.content = content.to_string();
        resource.local_only = false;
        Ok(())
    }

    async fn delete_by_uid(&self, uid: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.uids.get(uid).copied() {
            Some(id) => Ok(inner.remove(id).is_some()),
            None => Ok(false),
        }
    }

    async fn get_ctag(&self) -> Result<Option<EntryId>> {
        Ok(self.inner.read().await.ctag)
    }

    async fn set_ctag(&self, ctag: Option<EntryId>) -> Result<()> {
        self.inner.write().await.ctag = ctag;
        Ok(())
    }

    async fn collection_exists(&self) -> Result<bool> {
        Ok(self.inner.read().await.exists)
    }
}

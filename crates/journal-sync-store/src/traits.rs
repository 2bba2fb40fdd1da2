//! ResourceStore trait: the engine's view of the local collection.
//!
//! The engine is storage-agnostic. Implementations include SQLite (primary)
//! and in-memory (for tests).

use async_trait::async_trait;
use journal_sync_core::{EntryId, Resource};

use crate::error::Result;

/// Async interface to one local collection.
///
/// # Design Notes
///
/// - **Resources are keyed by uid** once one is assigned; `id` is only used
///   for resources that do not have a uid yet and for hard deletes.
/// - **CTag** is the only sync state kept by the store. It is read once at
///   session start and written once at session end.
/// - **Remote application** (`insert_remote`, `update_remote`,
///   `delete_by_uid`) never marks anything dirty.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Enumeration
    // ─────────────────────────────────────────────────────────────────────────

    /// All resources, including dirty and deleted ones.
    async fn list_all(&self) -> Result<Vec<Resource>>;

    /// Resources modified locally and not deleted.
    async fn list_dirty(&self) -> Result<Vec<Resource>>;

    /// Resources marked deleted (tombstones).
    async fn list_deleted(&self) -> Result<Vec<Resource>>;

    /// Resources that have no uid yet.
    async fn list_without_uid(&self) -> Result<Vec<Resource>>;

    /// Look a resource up by uid.
    async fn get_by_uid(&self, uid: &str) -> Result<Option<Resource>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Local flag maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// Assign a uid to the resource with store id `id`.
    async fn assign_uid(&self, id: i64, uid: &str) -> Result<()>;

    /// Mark the resource as pushed: clears `dirty` and `local_only`.
    async fn clear_dirty(&self, uid: &str) -> Result<()>;

    /// Remove the resource with store id `id` for good.
    async fn hard_delete(&self, id: i64) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Remote application
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a clean resource from remote content.
    async fn insert_remote(&self, uid: &str, content: &str) -> Result<Resource>;

    /// Overwrite the content of an existing resource with remote content.
    async fn update_remote(&self, uid: &str, content: &str) -> Result<()>;

    /// Remove the resource with this uid. Returns whether one existed.
    async fn delete_by_uid(&self, uid: &str) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Sync tag
    // ─────────────────────────────────────────────────────────────────────────

    /// The last saved CTag, if any.
    async fn get_ctag(&self) -> Result<Option<EntryId>>;

    /// Persist the CTag.
    async fn set_ctag(&self, ctag: Option<EntryId>) -> Result<()>;

    /// Whether the collection still exists and should be synced.
    async fn collection_exists(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl<S: ResourceStore + ?Sized> ResourceStore for std::sync::Arc<S> {
    async fn list_all(&self) -> Result<Vec<Resource>> {
        (**self).list_all().await
    }

    async fn list_dirty(&self) -> Result<Vec<Resource>> {
        (**self).list_dirty().await
    }

    async fn list_deleted(&self) -> Result<Vec<Resource>> {
        (**self).list_deleted().await
    }

    async fn list_without_uid(&self) -> Result<Vec<Resource>> {
        (**self).list_without_uid().await
    }

    async fn get_by_uid(&self, uid: &str) -> Result<Option<Resource>> {
        (**self).get_by_uid(uid).await
    }

    async fn assign_uid(&self, id: i64, uid: &str) -> Result<()> {
        (**self).assign_uid(id, uid).await
    }

    async fn clear_dirty(&self, uid: &str) -> Result<()> {
        (**self).clear_dirty(uid).await
    }

    async fn hard_delete(&self, id: i64) -> Result<()> {
        (**self).hard_delete(id).await
    }

    async fn insert_remote(&self, uid: &str, content: &str) -> Result<Resource> {
        (**self).insert_remote(uid, content).await
    }

    async fn update_remote(&self, uid: &str, content: &str) -> Result<()> {
        (**self).update_remote(uid, content).await
    }

    async fn delete_by_uid(&self, uid: &str) -> Result<bool> {
        (**self).delete_by_uid(uid).await
    }

    async fn get_ctag(&self) -> Result<Option<EntryId>> {
        (**self).get_ctag().await
    }

    async fn set_ctag(&self, ctag: Option<EntryId>) -> Result<()> {
        (**self).set_ctag(ctag).await
    }

    async fn collection_exists(&self) -> Result<bool> {
        (**self).collection_exists().await
    }
}

//! SQLite implementation of the ResourceStore trait.
//!
//! The primary persistent backend. Uses rusqlite with bundled SQLite, made
//! async via `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use journal_sync_core::{EntryId, Resource};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::ResourceStore;

const RESOURCE_COLUMNS: &str = "id, uid, content, local_only, dirty, deleted";

/// SQLite-based resource store.
///
/// Thread-safe via an internal Mutex. Every operation runs on the blocking
/// thread pool.
#[derive(Clone)]
pub struct SqliteResourceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteResourceStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Backend(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn query_resources(&self, filter: &'static str) -> Result<Vec<Resource>> {
        self.run(move |conn| {
            let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE {filter} ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let resources = stmt
                .query_map([], row_to_resource)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(resources)
        })
        .await
    }

    /// Create a resource the way an application would: dirty and local-only.
    pub async fn create_local(&self, uid: Option<&str>, content: &str) -> Result<Resource> {
        let uid = uid.map(String::from);
        let content = content.to_string();
        self.run(move |conn| {
            if let Some(uid) = &uid {
                ensure_uid_free(conn, uid)?;
            }
            conn.execute(
                "INSERT INTO resources (uid, content, local_only, dirty, deleted, updated_at)
                 VALUES (?1, ?2, 1, 1, 0, ?3)",
                params![uid, content, now_millis()],
            )?;
            Ok(Resource::new_local(conn.last_insert_rowid(), uid, content))
        })
        .await
    }

    /// Edit a resource locally, marking it dirty.
    pub async fn modify_local(&self, uid: &str, content: &str) -> Result<()> {
        let uid = uid.to_string();
        let content = content.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE resources SET content = ?2, dirty = 1, updated_at = ?3 WHERE uid = ?1",
                params![uid, content, now_millis()],
            )?;
            expect_one(changed, &uid)
        })
        .await
    }

    /// Delete a resource locally, leaving a tombstone.
    pub async fn delete_local(&self, uid: &str) -> Result<()> {
        let uid = uid.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE resources SET deleted = 1, updated_at = ?2 WHERE uid = ?1",
                params![uid, now_millis()],
            )?;
            expect_one(changed, &uid)
        })
        .await
    }

    /// Enable or disable syncing of the collection.
    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.run(move |conn| {
            conn.execute(
                "UPDATE sync_state SET enabled = ?1, updated_at = ?2 WHERE id = 1",
                params![enabled, now_millis()],
            )?;
            Ok(())
        })
        .await
    }
}

fn row_to_resource(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get("id")?,
        uid: row.get("uid")?,
        content: row.get("content")?,
        local_only: row.get("local_only")?,
        dirty: row.get("dirty")?,
        deleted: row.get("deleted")?,
    })
}

fn ensure_uid_free(conn: &Connection, uid: &str) -> Result<()> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM resources WHERE uid = ?1)",
        params![uid],
        |row| row.get(0),
    )?;
    if taken {
        return Err(StoreError::DuplicateUid(uid.to_string()));
    }
    Ok(())
}

fn expect_one(changed: usize, key: &str) -> Result<()> {
    if changed == 0 {
        return Err(StoreError::NotFound(key.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ResourceStore for SqliteResourceStore {
    async fn list_all(&self) -> Result<Vec<Resource>> {
        self.query_resources("1 = 1").await
    }

    async fn list_dirty(&self) -> Result<Vec<Resource>> {
        self.query_resources("dirty = 1 AND deleted = 0").await
    }

    async fn list_deleted(&self) -> Result<Vec<Resource>> {
        self.query_resources("deleted = 1").await
    }

    async fn list_without_uid(&self) -> Result<Vec<Resource>> {
        self.query_resources("uid IS NULL OR uid = ''").await
    }

    async fn get_by_uid(&self, uid: &str) -> Result<Option<Resource>> {
        let uid = uid.to_string();
        self.run(move |conn| {
            let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE uid = ?1");
            conn.query_row(&sql, params![uid], row_to_resource)
                .optional()
                .map_err(StoreError::from)
        })
        .await
    }

    async fn assign_uid(&self, id: i64, uid: &str) -> Result<()> {
        let uid = uid.to_string();
        self.run(move |conn| {
            ensure_uid_free(conn, &uid)?;
            let changed = conn.execute(
                "UPDATE resources SET uid = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, uid, now_millis()],
            )?;
            expect_one(changed, &format!("#{id}"))
        })
        .await
    }

    async fn clear_dirty(&self, uid: &str) -> Result<()> {
        let uid = uid.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE resources SET dirty = 0, local_only = 0, updated_at = ?2 WHERE uid = ?1",
                params![uid, now_millis()],
            )?;
            expect_one(changed, &uid)
        })
        .await
    }

    async fn hard_delete(&self, id: i64) -> Result<()> {
        self.run(move |conn| {
            conn.execute("DELETE FROM resources WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }

    async fn insert_remote(&self, uid: &str, content: &str) -> Result<Resource> {
        let uid = uid.to_string();
        let content = content.to_string();
        self.run(move |conn| {
            ensure_uid_free(conn, &uid)?;
            conn.execute(
                "INSERT INTO resources (uid, content, local_only, dirty, deleted, updated_at)
                 VALUES (?1, ?2, 0, 0, 0, ?3)",
                params![uid, content, now_millis()],
            )?;
            Ok(Resource::from_remote(conn.last_insert_rowid(), uid, content))
        })
        .await
    }

    async fn update_remote(&self, uid: &str, content: &str) -> Result<()> {
        let uid = uid.to_string();
        let content = content.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE resources SET content = ?2, local_only = 0, updated_at = ?3 WHERE uid = ?1",
                params![uid, content, now_millis()],
            )?;
            expect_one(changed, &uid)
        })
        .await
    }

    async fn delete_by_uid(&self, uid: &str) -> Result<bool> {
        let uid = uid.to_string();
        self.run(move |conn| {
            let changed = conn.execute("DELETE FROM resources WHERE uid = ?1", params![uid])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn get_ctag(&self) -> Result<Option<EntryId>> {
        self.run(|conn| {
            let raw: Option<String> =
                conn.query_row("SELECT ctag FROM sync_state WHERE id = 1", [], |row| {
                    row.get(0)
                })?;
            match raw {
                Some(hex) => EntryId::parse_ctag(&hex)
                    .map_err(|e| StoreError::InvalidData(format!("stored ctag: {e}"))),
                None => Ok(None),
            }
        })
        .await
    }

    async fn set_ctag(&self, ctag: Option<EntryId>) -> Result<()> {
        self.run(move |conn| {
            conn.execute(
                "UPDATE sync_state SET ctag = ?1, updated_at = ?2 WHERE id = 1",
                params![ctag.map(|id| id.to_hex()), now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn collection_exists(&self) -> Result<bool> {
        self.run(|conn| {
            conn.query_row("SELECT enabled FROM sync_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .map_err(StoreError::from)
        })
        .await
    }
}

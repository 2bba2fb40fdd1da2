//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system. Each migration transforms the schema
//! from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Initialize or migrate the database schema.
///
/// Idempotent: safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            tracing::debug!(version, "applying resource store migration");
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        2 => apply_v2(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: resources and the per-collection sync state.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Local resources of the collection
        CREATE TABLE resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uid TEXT UNIQUE,                    -- journal-visible key, NULL until assigned
            content TEXT NOT NULL,              -- serialized vCard / iCalendar
            local_only INTEGER NOT NULL DEFAULT 1,
            dirty INTEGER NOT NULL DEFAULT 1,
            deleted INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL
        );

        -- Single-row sync state
        CREATE TABLE sync_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            ctag TEXT,                          -- hex entry id, NULL if nothing synced
            updated_at INTEGER NOT NULL
        );

        INSERT INTO sync_state (id, ctag, updated_at) VALUES (1, NULL, 0);
        "#,
    )?;

    Ok(())
}

/// Migration v2: collection enable flag and flag indexes.
fn apply_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        ALTER TABLE sync_state ADD COLUMN enabled INTEGER NOT NULL DEFAULT 1;

        CREATE INDEX idx_resources_dirty ON resources(dirty) WHERE dirty = 1;
        CREATE INDEX idx_resources_deleted ON resources(deleted) WHERE deleted = 1;
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

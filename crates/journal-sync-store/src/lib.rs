//! # Journal Sync Store
//!
//! Local collection storage for the journal sync engine. Provides a
//! trait-based interface over the resources of one address book or calendar,
//! with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The engine never touches storage directly; it goes through the
//! [`ResourceStore`] trait. The primary implementation is
//! [`SqliteResourceStore`], with [`MemoryResourceStore`] for testing.
//!
//! ## Key Types
//!
//! - [`ResourceStore`] - The async trait for all collection operations
//! - [`SqliteResourceStore`] - SQLite-based persistent storage
//! - [`MemoryResourceStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use journal_sync_store::{ResourceStore, SqliteResourceStore};
//!
//! async fn example() {
//!     let store = SqliteResourceStore::open("contacts.db").unwrap();
//!
//!     // An application edit, picked up by the next sync
//!     store.create_local(Some("uid-1"), "BEGIN:VCARD\r\nUID:uid-1\r\nEND:VCARD").await.unwrap();
//!
//!     let dirty = store.list_dirty().await.unwrap();
//!     assert_eq!(dirty.len(), 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Flags, not queues**: pending work is derived from `dirty` and
//!   `deleted` flags on each resource
//! - **Single CTag**: the only sync state persisted per collection
//! - **Remote writes stay clean**: applying journal entries never marks a
//!   resource dirty

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryResourceStore;
pub use sqlite::SqliteResourceStore;
pub use traits::ResourceStore;

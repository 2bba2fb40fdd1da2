//! # Journal Sync
//!
//! Reconciles a local collection of resources (contacts, calendar items)
//! with a remote, append-only, cryptographically chained journal shared by
//! several clients.
//!
//! ## Overview
//!
//! A sync session runs a fixed sequence of [`Phase`]s:
//!
//! 1. **Prepare** - does the collection still want syncing?
//! 2. **Query capabilities** - negotiate with the journal service
//! 3. **Prepare local** - assign missing uids, index local resources, load the CTag
//! 4. **Create local entries** - turn tombstones and dirty resources into a linked batch
//! 5. **Fetch entries** - pull everything after the CTag, verify the chain, decode
//! 6. **Apply remote entries** - ADD / CHANGE / DELETE into the local store
//! 7. **Apply local entries** - collection-specific fixups
//! 8. **Push entries** - append the batch after the remote head
//! 9. **Post processing** - collection-specific cleanup
//! 10. **Save sync tag** - the single commit point
//!
//! ## Usage
//!
//! ```rust,no_run
//! use journal_sync::{CancellationToken, ContactsCollection, SyncConfig, SyncEngine};
//! use journal_sync::client::MemoryJournal;
//! use journal_sync::core::{CollectionSecret, SealedChainCodec};
//! use journal_sync::store::SqliteResourceStore;
//!
//! async fn example() {
//!     let store = SqliteResourceStore::open("contacts.db").unwrap();
//!     let codec = SealedChainCodec::new(CollectionSecret::derive("password", "collection-1"));
//!
//!     let engine = SyncEngine::new(
//!         store,
//!         MemoryJournal::new(),
//!         codec,
//!         ContactsCollection::new("alice@example.com"),
//!         SyncConfig::default(),
//!     );
//!
//!     let report = engine.perform_sync(&CancellationToken::new()).await;
//!     if let Some(notification) = report.notification {
//!         eprintln!("{}: {}", notification.title, notification.message);
//!     }
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Resumable**: the CTag is written only after every phase succeeded;
//!   anything less leaves it untouched and the next session starts over
//! - **No partial apply**: a broken link, forged id, or undecodable payload
//!   anywhere in the fetched batch aborts before the store is touched
//! - **No blind overwrite**: a push whose expected head is stale is rejected
//!   and the session reruns from the start
//!
//! ## Re-exports
//!
//! - `journal_sync::core` - Entry ids, entries, the chain codec
//! - `journal_sync::store` - Resource store abstraction and SQLite
//! - `journal_sync::client` - Journal client abstraction

pub mod cancel;
pub mod collection;
pub mod config;
pub mod engine;
pub mod error;
pub mod phase;
pub mod report;
pub mod session;

// Re-export component crates
pub use journal_sync_client as client;
pub use journal_sync_core as core;
pub use journal_sync_store as store;

pub use cancel::CancellationToken;
pub use collection::{CalendarCollection, CollectionKind, ContactsCollection};
pub use config::SyncConfig;
pub use engine::{SessionEnd, SyncEngine};
pub use error::{ErrorClass, Result, SyncError};
pub use phase::Phase;
pub use report::{NotificationTarget, SyncNotification, SyncOutcome, SyncReport, SyncStats};
pub use session::{LocalIndex, SessionContext};

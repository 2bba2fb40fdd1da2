//! # Journal Sync Testkit
//!
//! Testing utilities for journal sync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a codec with a fixed secret plus memory store and journal
//! - **Remote chains**: builders for synthetic journal histories
//! - **Scripted journal**: a client answering from a queue, for broken
//!   chains and injected failures
//! - **Faulty store**: a store wrapper that fails chosen operations
//! - **Generators**: proptest strategies
//!
//! ## Test Fixtures
//!
//! ```rust
//! use journal_sync_testkit::{vcard, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let entries = fixture
//!     .remote_chain(None)
//!     .add(vcard("x", "Ada"))
//!     .change(vcard("x", "Ada Lovelace"))
//!     .build();
//! assert_eq!(entries[1].prev, Some(entries[0].id));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use journal_sync_testkit::generators::vcard_entry;
//!
//! proptest! {
//!     #[test]
//!     fn entry_json_roundtrips(entry in vcard_entry()) {
//!         let json = entry.to_json().unwrap();
//!         prop_assert_eq!(SyncEntry::from_json(&json).unwrap(), entry);
//!     }
//! }
//! ```

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod scripted;

pub use faulty::{FaultyStore, StoreOp};
pub use fixtures::{vcard, vevent, RemoteChain, TestFixture, TEST_SECRET};
pub use scripted::{RecordedPush, ScriptedJournal};

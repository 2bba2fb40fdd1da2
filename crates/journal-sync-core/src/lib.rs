//! # Journal Sync Core
//!
//! Pure primitives for journal synchronization: entry identifiers, chained
//! journal entries, the logical sync entries they carry, and the chain codec.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`EntryId`] - Content identifier of a journal entry, also used as CTag
//! - [`JournalEntry`] - One immutable link of the remote journal
//! - [`SyncEntry`] / [`SyncAction`] - Decoded change record (ADD/CHANGE/DELETE)
//! - [`Resource`] - A local record with its sync flags
//! - [`ChainCodec`] - Seals payloads into entries bound to their predecessor
//!
//! ## Chain Rules
//!
//! Entry *i* of a fetched batch must link to entry *i-1*, and the first entry
//! to the local cursor. See [`verify_chain`] and [`ChainBuilder`].

pub mod canonical;
pub mod chain;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod resource;
pub mod types;

pub use chain::{verify_chain, verify_chain_with, ChainBuilder};
pub use crypto::{ChainCodec, CollectionSecret, SealedChainCodec};
pub use entry::{JournalEntry, SyncAction, SyncEntry};
pub use error::{ChainError, CoreError};
pub use resource::Resource;
pub use types::{generate_uid, EntryId};

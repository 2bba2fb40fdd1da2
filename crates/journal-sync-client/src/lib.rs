//! # Journal Sync Client
//!
//! The remote side of journal synchronization: fetch entries after a cursor,
//! append a pre-linked batch after an expected head.
//!
//! ## Key Types
//!
//! - [`JournalClient`] - Async trait implemented by journal transports
//! - [`PushOutcome`] - Accepted, or a conflict when the head moved
//! - [`Capabilities`] - What the remote service supports
//! - [`MemoryJournal`] - In-memory reference journal
//!
//! ## Design Notes
//!
//! - **Append is compare-and-set**: a push names the head it was built on,
//!   and a service whose head has moved answers with
//!   [`PushOutcome::Conflict`] instead of appending.
//! - **No retries here**: timeouts and retry policy live in concrete
//!   transports; the engine reruns whole sessions.

pub mod client;
pub mod error;
pub mod memory;

pub use client::{Capabilities, JournalClient, PushOutcome, PROTOCOL_VERSION};
pub use error::{ClientError, Result};
pub use memory::MemoryJournal;

//! What a sync run reports back to its caller.

use std::time::SystemTime;

use journal_sync_core::EntryId;

use crate::error::ErrorClass;
use crate::phase::Phase;

/// Counters for one sync run.
///
/// The exception counters and `database_error` mirror what a platform sync
/// framework expects from a sync adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Transport failures.
    pub num_io_exceptions: u64,
    /// Authorization failures.
    pub num_auth_exceptions: u64,
    /// Integrity and unexpected-response failures.
    pub num_parse_exceptions: u64,
    /// The local store failed.
    pub database_error: bool,
    /// Push conflicts, including those healed by a restart.
    pub num_conflicts: u64,
    /// Resources created from remote entries.
    pub num_inserts: u64,
    /// Resources updated from remote entries.
    pub num_updates: u64,
    /// Deletions: local tombstones processed and remote deletes applied.
    pub num_deletes: u64,
    /// Remote entries skipped because a local change to the same resource
    /// is pushed after them.
    pub num_superseded: u64,
    /// Uids assigned to resources that had none.
    pub num_uids_assigned: u64,
    /// Entries fetched from the journal.
    pub num_entries_fetched: u64,
    /// Entries appended to the journal.
    pub num_entries_pushed: u64,
}

impl SyncStats {
    /// Add the counters of `other` to these.
    pub fn merge(&mut self, other: &SyncStats) {
        self.num_io_exceptions += other.num_io_exceptions;
        self.num_auth_exceptions += other.num_auth_exceptions;
        self.num_parse_exceptions += other.num_parse_exceptions;
        self.database_error |= other.database_error;
        self.num_conflicts += other.num_conflicts;
        self.num_inserts += other.num_inserts;
        self.num_updates += other.num_updates;
        self.num_deletes += other.num_deletes;
        self.num_superseded += other.num_superseded;
        self.num_uids_assigned += other.num_uids_assigned;
        self.num_entries_fetched += other.num_entries_fetched;
        self.num_entries_pushed += other.num_entries_pushed;
    }

    /// Count a failure of the given class.
    pub fn record_failure(&mut self, class: ErrorClass) {
        match class {
            ErrorClass::Transport => self.num_io_exceptions += 1,
            ErrorClass::Authorization => self.num_auth_exceptions += 1,
            ErrorClass::Integrity | ErrorClass::Http => self.num_parse_exceptions += 1,
            ErrorClass::LocalStorage => self.database_error = true,
            ErrorClass::Conflict => self.num_conflicts += 1,
            ErrorClass::ServiceUnavailable => {}
        }
    }

    /// Whether any failure was counted.
    pub fn has_errors(&self) -> bool {
        self.num_io_exceptions > 0
            || self.num_auth_exceptions > 0
            || self.num_parse_exceptions > 0
            || self.database_error
    }
}

/// How a sync run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Every phase ran and the CTag was saved.
    Completed { ctag: Option<EntryId> },
    /// The collection needs no sync.
    Skipped,
    /// Stopped by the cancellation token. Nothing committed.
    Cancelled,
    /// A phase failed. Nothing committed.
    Failed {
        phase: Phase,
        class: ErrorClass,
        message: String,
    },
}

/// Where a notification sends the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    /// Re-enter credentials.
    AccountSettings,
    /// Inspect the failure, with the phase it happened in.
    DebugInfo { phase: Phase },
}

/// A user-facing error notification for a failed sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotification {
    /// Notification slot of the collection kind.
    pub notification_id: u32,
    pub title: String,
    pub phase: Phase,
    pub message: String,
    pub target: NotificationTarget,
}

/// Result of [`SyncEngine::perform_sync`](crate::SyncEngine::perform_sync).
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub stats: SyncStats,
    /// Do not sync this collection again before this instant.
    pub delay_until: Option<SystemTime>,
    pub notification: Option<SyncNotification>,
    /// Sessions started, restarts after conflicts included.
    pub sessions: u32,
}

impl SyncReport {
    /// Whether the run completed.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Completed { .. })
    }

    /// The saved CTag, when the run completed.
    pub fn ctag(&self) -> Option<EntryId> {
        match &self.outcome {
            SyncOutcome::Completed { ctag } => *ctag,
            _ => None,
        }
    }

    /// The class of the failure, when the run failed.
    pub fn error_class(&self) -> Option<ErrorClass> {
        match &self.outcome {
            SyncOutcome::Failed { class, .. } => Some(*class),
            _ => None,
        }
    }
}

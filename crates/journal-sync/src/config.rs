//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for sync sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How many times a session is rerun after a push conflict.
    pub max_conflict_retries: u32,
    /// Whether fetched entry ids are authenticated under the collection secret.
    pub verify_entry_ids: bool,
}

impl SyncConfig {
    /// Sets the conflict retry budget.
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Enables or disables entry id authentication.
    pub fn with_verify_entry_ids(mut self, verify: bool) -> Self {
        self.verify_entry_ids = verify;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            verify_entry_ids: true,
        }
    }
}

//! Session phases.

use std::fmt;

/// One step of a sync session. Phases run strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Prepare,
    QueryCapabilities,
    PrepareLocal,
    CreateLocalEntries,
    FetchEntries,
    ApplyRemoteEntries,
    ApplyLocalEntries,
    PushEntries,
    PostProcessing,
    SaveSyncTag,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 10] = [
        Phase::Prepare,
        Phase::QueryCapabilities,
        Phase::PrepareLocal,
        Phase::CreateLocalEntries,
        Phase::FetchEntries,
        Phase::ApplyRemoteEntries,
        Phase::ApplyLocalEntries,
        Phase::PushEntries,
        Phase::PostProcessing,
        Phase::SaveSyncTag,
    ];

    /// Stable name used in logs and error reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Prepare => "sync_phase_prepare",
            Phase::QueryCapabilities => "sync_phase_query_capabilities",
            Phase::PrepareLocal => "sync_phase_prepare_local",
            Phase::CreateLocalEntries => "sync_phase_create_local_entries",
            Phase::FetchEntries => "sync_phase_fetch_entries",
            Phase::ApplyRemoteEntries => "sync_phase_apply_remote_entries",
            Phase::ApplyLocalEntries => "sync_phase_apply_local_entries",
            Phase::PushEntries => "sync_phase_push_entries",
            Phase::PostProcessing => "sync_phase_post_processing",
            Phase::SaveSyncTag => "sync_phase_save_sync_tag",
        }
    }

    /// The phase after this one, `None` after SAVE_SYNC_TAG.
    pub fn next(self) -> Option<Phase> {
        let index = Self::ALL.iter().position(|p| *p == self)?;
        Self::ALL.get(index + 1).copied()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

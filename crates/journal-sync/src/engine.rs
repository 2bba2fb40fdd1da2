//! The reconciliation engine.
//!
//! A session walks the [`Phase`]s in order over an explicit
//! [`SessionContext`]. Any failure aborts the remaining phases; the CTag is
//! written only by the last phase, so an aborted or cancelled session leaves
//! the store's resumption point where it was.

use std::collections::HashSet;
use std::time::SystemTime;

use journal_sync_client::{ClientError, JournalClient, PushOutcome, PROTOCOL_VERSION};
use journal_sync_core::{
    generate_uid, verify_chain, verify_chain_with, ChainBuilder, ChainCodec, EntryId, Resource,
    SyncAction, SyncEntry,
};
use journal_sync_store::{ResourceStore, StoreError};
use tracing::{debug, error, info, warn};

use crate::cancel::CancellationToken;
use crate::collection::CollectionKind;
use crate::config::SyncConfig;
use crate::error::{ErrorClass, Result, SyncError};
use crate::phase::Phase;
use crate::report::{NotificationTarget, SyncNotification, SyncOutcome, SyncReport, SyncStats};
use crate::session::{DecodedEntry, LocalIndex, OutgoingEntry, SessionContext};

/// How a single session ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// All phases ran; `ctag` was saved.
    Completed { ctag: Option<EntryId> },
    /// PREPARE decided there is nothing to do.
    Skipped,
    /// The token was cancelled. Nothing committed.
    Cancelled,
}

/// Whether the session goes on after a phase.
enum Step {
    Continue,
    Skip,
    Cancelled,
}

/// Reconciles one local collection with its remote journal.
///
/// Holds no state between sessions. Callers must not run two sessions for
/// the same collection at once.
pub struct SyncEngine<S, J, C, K>
where
    S: ResourceStore,
    J: JournalClient,
    C: ChainCodec,
    K: CollectionKind,
{
    store: S,
    client: J,
    codec: C,
    kind: K,
    config: SyncConfig,
}

impl<S, J, C, K> SyncEngine<S, J, C, K>
where
    S: ResourceStore,
    J: JournalClient,
    C: ChainCodec,
    K: CollectionKind,
{
    /// Create an engine for one collection.
    pub fn new(store: S, client: J, codec: C, kind: K, config: SyncConfig) -> Self {
        Self {
            store,
            client,
            codec,
            kind,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &J {
        &self.client
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entry points
    // ─────────────────────────────────────────────────────────────────────────

    /// Run a full sync and report how it went.
    ///
    /// Never fails: errors are classified, counted, and turned into a
    /// notification. A push conflict reruns the whole session, up to
    /// `max_conflict_retries` times.
    pub async fn perform_sync(&self, cancel: &CancellationToken) -> SyncReport {
        let mut stats = SyncStats::default();
        let mut sessions = 0u32;
        let mut restarts = 0u32;

        loop {
            sessions += 1;
            let mut ctx = SessionContext::new();
            let result = self.run_phases(&mut ctx, cancel).await;
            stats.merge(&ctx.stats);

            let error = match result {
                Ok(SessionEnd::Completed { ctag }) => {
                    return SyncReport {
                        outcome: SyncOutcome::Completed { ctag },
                        stats,
                        delay_until: None,
                        notification: None,
                        sessions,
                    };
                }
                Ok(SessionEnd::Skipped) => {
                    return SyncReport {
                        outcome: SyncOutcome::Skipped,
                        stats,
                        delay_until: None,
                        notification: None,
                        sessions,
                    };
                }
                Ok(SessionEnd::Cancelled) => {
                    info!(phase = %ctx.phase, "sync cancelled");
                    return SyncReport {
                        outcome: SyncOutcome::Cancelled,
                        stats,
                        delay_until: None,
                        notification: None,
                        sessions,
                    };
                }
                Err(error) => error,
            };

            if let SyncError::Conflict { remote_head } = &error {
                if restarts < self.config.max_conflict_retries {
                    restarts += 1;
                    stats.num_conflicts += 1;
                    info!(
                        ?remote_head,
                        attempt = restarts,
                        "remote head moved during sync, restarting session"
                    );
                    continue;
                }
            }

            return self.report_failure(ctx.phase, error, stats, sessions);
        }
    }

    /// Run one session, without conflict restarts or error classification.
    pub async fn run_session(&self, cancel: &CancellationToken) -> Result<SessionEnd> {
        let mut ctx = SessionContext::new();
        self.run_phases(&mut ctx, cancel).await
    }

    fn report_failure(
        &self,
        phase: Phase,
        error: SyncError,
        mut stats: SyncStats,
        sessions: u32,
    ) -> SyncReport {
        let class = error.class();
        let message = error.to_string();
        stats.record_failure(class);

        let mut delay_until = None;
        let notification = match &error {
            SyncError::Client(ClientError::ServiceUnavailable { retry_after }) => {
                warn!(phase = %phase, ?retry_after, "journal service unavailable");
                delay_until = retry_after.and_then(|d| SystemTime::now().checked_add(d));
                None
            }
            _ => {
                match class {
                    ErrorClass::Transport | ErrorClass::Conflict => {
                        warn!(phase = %phase, %error, "sync failed, trying again later")
                    }
                    _ => error!(phase = %phase, ?class, %error, "sync failed"),
                }
                let target = match class {
                    ErrorClass::Authorization => NotificationTarget::AccountSettings,
                    _ => NotificationTarget::DebugInfo { phase },
                };
                Some(SyncNotification {
                    notification_id: self.kind.notification_id(),
                    title: self.kind.sync_error_title(),
                    phase,
                    message: message.clone(),
                    target,
                })
            }
        };

        SyncReport {
            outcome: SyncOutcome::Failed {
                phase,
                class,
                message,
            },
            stats,
            delay_until,
            notification,
            sessions,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Phase dispatch
    // ─────────────────────────────────────────────────────────────────────────

    async fn run_phases(
        &self,
        ctx: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<SessionEnd> {
        let mut next = Some(Phase::Prepare);

        while let Some(phase) = next {
            if cancel.is_cancelled() {
                return Ok(SessionEnd::Cancelled);
            }
            ctx.phase = phase;
            info!(phase = %phase, "sync phase");

            let step = match phase {
                Phase::Prepare => self.prepare(ctx).await?,
                Phase::QueryCapabilities => self.query_capabilities(ctx).await?,
                Phase::PrepareLocal => self.prepare_local(ctx).await?,
                Phase::CreateLocalEntries => self.create_local_entries(ctx, cancel).await?,
                Phase::FetchEntries => self.fetch_entries(ctx).await?,
                Phase::ApplyRemoteEntries => self.apply_remote_entries(ctx, cancel).await?,
                Phase::ApplyLocalEntries => self.apply_local_entries(ctx).await?,
                Phase::PushEntries => self.push_entries(ctx).await?,
                Phase::PostProcessing => self.post_process(ctx).await?,
                Phase::SaveSyncTag => self.save_sync_tag(ctx).await?,
            };

            match step {
                Step::Continue => next = phase.next(),
                Step::Skip => {
                    info!("no reason to synchronize, skipping");
                    return Ok(SessionEnd::Skipped);
                }
                Step::Cancelled => return Ok(SessionEnd::Cancelled),
            }
        }

        Ok(SessionEnd::Completed {
            ctag: ctx.remote_ctag,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Phases
    // ─────────────────────────────────────────────────────────────────────────

    async fn prepare(&self, _ctx: &mut SessionContext) -> Result<Step> {
        if self.kind.prepare(&self.store).await? {
            Ok(Step::Continue)
        } else {
            Ok(Step::Skip)
        }
    }

    async fn query_capabilities(&self, ctx: &mut SessionContext) -> Result<Step> {
        let capabilities = self.client.query_capabilities().await?;
        if capabilities.protocol_version > PROTOCOL_VERSION {
            return Err(SyncError::VersionMismatch {
                local: PROTOCOL_VERSION,
                remote: capabilities.protocol_version,
            });
        }
        ctx.capabilities = capabilities;
        Ok(Step::Continue)
    }

    async fn prepare_local(&self, ctx: &mut SessionContext) -> Result<Step> {
        for resource in self.store.list_without_uid().await? {
            let uid = generate_uid();
            debug!(id = resource.id, %uid, "assigning uid to local resource");
            self.store.assign_uid(resource.id, &uid).await?;
            ctx.stats.num_uids_assigned += 1;
        }

        ctx.local = LocalIndex::from_resources(self.store.list_all().await?);
        debug!(count = ctx.local.len(), "indexed local resources");

        ctx.saved_ctag = self.store.get_ctag().await?;
        ctx.remote_ctag = ctx.saved_ctag;
        Ok(Step::Continue)
    }

    async fn create_local_entries(
        &self,
        ctx: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<Step> {
        let mut outgoing = Vec::new();

        for resource in self.store.list_deleted().await? {
            if cancel.is_cancelled() {
                return Ok(Step::Cancelled);
            }

            if resource.local_only {
                debug!(id = resource.id, "removing local resource that was never pushed");
                self.store.hard_delete(resource.id).await?;
                if let Some(uid) = resource.uid() {
                    ctx.local.remove(uid);
                }
            } else {
                let uid = required_uid(&resource)?;
                info!(%uid, "deleted locally, deleting from journal");
                outgoing.push(OutgoingEntry {
                    resource_id: resource.id,
                    uid: uid.to_string(),
                    entry: SyncEntry::new(
                        self.kind.outgoing_content(&resource, uid),
                        SyncAction::Delete,
                    ),
                });
            }
            ctx.stats.num_deletes += 1;
        }

        for resource in self.store.list_dirty().await? {
            if cancel.is_cancelled() {
                return Ok(Step::Cancelled);
            }

            let uid = required_uid(&resource)?;
            let action = if resource.local_only {
                SyncAction::Add
            } else {
                SyncAction::Change
            };
            debug!(%uid, %action, "queueing local change");
            outgoing.push(OutgoingEntry {
                resource_id: resource.id,
                uid: uid.to_string(),
                entry: SyncEntry::new(self.kind.outgoing_content(&resource, uid), action),
            });
        }

        ctx.outgoing = outgoing;
        let anchor = ctx.remote_ctag;
        self.seal_outgoing(ctx, anchor)?;
        Ok(Step::Continue)
    }

    async fn fetch_entries(&self, ctx: &mut SessionContext) -> Result<Step> {
        let cursor = ctx.remote_ctag;
        let entries = self.client.fetch_since(cursor.as_ref()).await?;

        if self.config.verify_entry_ids {
            verify_chain_with(&self.codec, cursor.as_ref(), &entries)?;
        } else {
            verify_chain(cursor.as_ref(), &entries)?;
        }

        let mut fetched = Vec::with_capacity(entries.len());
        for entry in &entries {
            let decoded = SyncEntry::from_journal_entry(&self.codec, entry)?;
            let uid = self.kind.extract_uid(&decoded.content)?;
            fetched.push(DecodedEntry {
                id: entry.id,
                uid,
                entry: decoded,
            });
        }

        if let Some(last) = entries.last() {
            ctx.remote_ctag = Some(last.id);
        }
        info!(count = fetched.len(), remote_ctag = ?ctx.remote_ctag, "fetched journal entries");
        ctx.stats.num_entries_fetched += fetched.len() as u64;
        ctx.fetched = fetched;
        Ok(Step::Continue)
    }

    async fn apply_remote_entries(
        &self,
        ctx: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<Step> {
        let fetched = std::mem::take(&mut ctx.fetched);

        // The outgoing entry for these uids lands after every fetched one.
        let pending: HashSet<String> = ctx.outgoing.iter().map(|o| o.uid.clone()).collect();

        for decoded in &fetched {
            if cancel.is_cancelled() {
                return Ok(Step::Cancelled);
            }
            info!(entry = %decoded.id, uid = %decoded.uid, action = %decoded.entry.action, "processing journal entry");

            if pending.contains(&decoded.uid) {
                info!(uid = %decoded.uid, "superseded by pending local change, skipping");
                ctx.stats.num_superseded += 1;
                continue;
            }
            self.apply_entry(ctx, decoded).await?;
        }

        ctx.fetched = fetched;
        Ok(Step::Continue)
    }

    async fn apply_local_entries(&self, ctx: &mut SessionContext) -> Result<Step> {
        self.kind.apply_local_entries(&self.store, &ctx.local).await?;
        Ok(Step::Continue)
    }

    async fn push_entries(&self, ctx: &mut SessionContext) -> Result<Step> {
        if ctx.outgoing.is_empty() {
            return Ok(Step::Continue);
        }

        // Remote entries arrived after the batch was sealed; relink it.
        if ctx.batch_anchor != ctx.remote_ctag {
            debug!(anchor = ?ctx.batch_anchor, head = ?ctx.remote_ctag, "relinking outgoing batch");
            let anchor = ctx.remote_ctag;
            self.seal_outgoing(ctx, anchor)?;
        }

        let outcome = self
            .client
            .push_batch(&ctx.batch, ctx.remote_ctag.as_ref())
            .await?;
        if let PushOutcome::Conflict { remote_head } = outcome {
            return Err(SyncError::Conflict { remote_head });
        }

        for pushed in &ctx.outgoing {
            if pushed.entry.is_action(SyncAction::Delete) {
                self.store.hard_delete(pushed.resource_id).await?;
                ctx.local.remove(&pushed.uid);
                continue;
            }

            info!(uid = %pushed.uid, "added/changed resource pushed");
            self.store.clear_dirty(&pushed.uid).await?;
            if let Some(resource) = ctx.local.get_mut(&pushed.uid) {
                resource.dirty = false;
                resource.local_only = false;
            }
        }

        ctx.stats.num_entries_pushed += ctx.batch.len() as u64;
        ctx.remote_ctag = ctx.batch.last().map(|e| e.id);
        Ok(Step::Continue)
    }

    async fn post_process(&self, _ctx: &mut SessionContext) -> Result<Step> {
        self.kind.post_process(&self.store).await?;
        Ok(Step::Continue)
    }

    async fn save_sync_tag(&self, ctx: &mut SessionContext) -> Result<Step> {
        info!(ctag = ?ctx.remote_ctag, "saving CTag");
        self.store.set_ctag(ctx.remote_ctag).await?;
        Ok(Step::Continue)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Seal `ctx.outgoing` into a batch linked after `anchor`.
    fn seal_outgoing(&self, ctx: &mut SessionContext, anchor: Option<EntryId>) -> Result<()> {
        let mut builder = ChainBuilder::new(anchor);
        for outgoing in &ctx.outgoing {
            builder.push(&self.codec, &outgoing.entry)?;
        }
        ctx.batch = builder.finish();
        ctx.batch_anchor = anchor;
        Ok(())
    }

    /// Apply one remote entry. Applying the same entry again is a no-op.
    async fn apply_entry(&self, ctx: &mut SessionContext, decoded: &DecodedEntry) -> Result<()> {
        let uid = decoded.uid.as_str();
        let content = decoded.entry.content.as_str();

        match decoded.entry.action {
            SyncAction::Add | SyncAction::Change => {
                if ctx.local.contains(uid) {
                    debug!(%uid, "updating local resource");
                    self.store.update_remote(uid, content).await?;
                    if let Some(resource) = ctx.local.get_mut(uid) {
                        resource.content = content.to_string();
                        resource.local_only = false;
                    }
                    ctx.stats.num_updates += 1;
                } else {
                    debug!(%uid, "creating local resource");
                    let resource = self.store.insert_remote(uid, content).await?;
                    ctx.local.upsert(resource);
                    ctx.stats.num_inserts += 1;
                }
            }
            SyncAction::Delete => {
                if self.store.delete_by_uid(uid).await? {
                    debug!(%uid, "deleted local resource");
                    ctx.stats.num_deletes += 1;
                }
                ctx.local.remove(uid);
            }
        }
        Ok(())
    }
}

fn required_uid(resource: &Resource) -> Result<&str> {
    resource.uid().ok_or_else(|| {
        SyncError::Store(StoreError::InvalidData(format!(
            "resource #{} has no uid after preparation",
            resource.id
        )))
    })
}

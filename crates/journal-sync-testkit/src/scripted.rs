//! A journal client that answers from a script.
//!
//! Lets tests return entry sequences no well-formed journal would produce
//! (broken links, forged ids, garbage payloads) and inject failures at
//! exact points.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use journal_sync_client::{Capabilities, ClientError, JournalClient, PushOutcome, Result};
use journal_sync_core::{EntryId, JournalEntry};

/// A push the engine made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub entries: Vec<JournalEntry>,
    pub expected_head: Option<EntryId>,
}

#[derive(Default)]
struct Script {
    capabilities: VecDeque<Result<Capabilities>>,
    fetches: VecDeque<Result<Vec<JournalEntry>>>,
    pushes: VecDeque<Result<PushOutcome>>,
    fetch_cursors: Vec<Option<EntryId>>,
    recorded_pushes: Vec<RecordedPush>,
}

/// Scripted journal client.
///
/// Unscripted calls succeed: capabilities are the defaults, fetches return
/// nothing, pushes are accepted.
#[derive(Default)]
pub struct ScriptedJournal {
    script: Mutex<Script>,
}

impl ScriptedJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer to the next capabilities query.
    pub async fn on_capabilities(&self, answer: Result<Capabilities>) {
        self.script.lock().await.capabilities.push_back(answer);
    }

    /// Queue entries for the next fetch.
    pub async fn on_fetch(&self, entries: Vec<JournalEntry>) {
        self.script.lock().await.fetches.push_back(Ok(entries));
    }

    /// Make the next fetch fail.
    pub async fn fail_fetch(&self, error: ClientError) {
        self.script.lock().await.fetches.push_back(Err(error));
    }

    /// Queue the outcome of the next push.
    pub async fn on_push(&self, outcome: PushOutcome) {
        self.script.lock().await.pushes.push_back(Ok(outcome));
    }

    /// Make the next push fail.
    pub async fn fail_push(&self, error: ClientError) {
        self.script.lock().await.pushes.push_back(Err(error));
    }

    /// Cursors of every fetch so far.
    pub async fn fetch_cursors(&self) -> Vec<Option<EntryId>> {
        self.script.lock().await.fetch_cursors.clone()
    }

    /// Every push so far, accepted or not.
    pub async fn pushes(&self) -> Vec<RecordedPush> {
        self.script.lock().await.recorded_pushes.clone()
    }
}

#[async_trait]
impl JournalClient for ScriptedJournal {
    async fn query_capabilities(&self) -> Result<Capabilities> {
        self.script
            .lock()
            .await
            .capabilities
            .pop_front()
            .unwrap_or_else(|| Ok(Capabilities::default()))
    }

    async fn fetch_since(&self, cursor: Option<&EntryId>) -> Result<Vec<JournalEntry>> {
        let mut script = self.script.lock().await;
        script.fetch_cursors.push(cursor.copied());
        script.fetches.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn push_batch(
        &self,
        entries: &[JournalEntry],
        expected_head: Option<&EntryId>,
    ) -> Result<PushOutcome> {
        let mut script = self.script.lock().await;
        script.recorded_pushes.push(RecordedPush {
            entries: entries.to_vec(),
            expected_head: expected_head.copied(),
        });
        script
            .pushes
            .pop_front()
            .unwrap_or(Ok(PushOutcome::Accepted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_calls_succeed() {
        let journal = ScriptedJournal::new();
        assert!(journal.fetch_since(None).await.unwrap().is_empty());
        assert!(journal.push_batch(&[], None).await.unwrap().is_accepted());
        assert_eq!(journal.fetch_cursors().await, vec![None]);
        assert_eq!(journal.pushes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_answers_in_order() {
        let journal = ScriptedJournal::new();
        journal.fail_fetch(ClientError::Transport("down".into())).await;
        journal.on_fetch(Vec::new()).await;
        journal
            .on_push(PushOutcome::Conflict { remote_head: None })
            .await;

        assert!(matches!(
            journal.fetch_since(None).await,
            Err(ClientError::Transport(_))
        ));
        assert!(journal.fetch_since(None).await.is_ok());
        assert!(!journal.push_batch(&[], None).await.unwrap().is_accepted());
    }
}

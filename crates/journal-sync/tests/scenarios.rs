//! End-to-end session scenarios against scripted and in-memory journals.

mod common;

use std::sync::Arc;

use journal_sync::core::{EntryId, Resource, SyncAction, SyncEntry};
use journal_sync::store::ResourceStore;
use journal_sync::{CancellationToken, Phase, SessionEnd, SyncConfig, SyncEngine, SyncOutcome};
use journal_sync_testkit::{vcard, ScriptedJournal, TestFixture};

use common::{contacts_engine, init_tracing, snapshot, RecordingKind};

fn c0() -> EntryId {
    EntryId::from_bytes([0xc0; 32])
}

#[tokio::test]
async fn test_local_changes_pushed_as_one_linked_batch() {
    init_tracing();
    let fixture = TestFixture::new();
    fixture
        .store
        .create_local(Some("a"), &vcard("a", "Alice"))
        .await
        .unwrap();
    fixture
        .store
        .insert_raw(Resource {
            id: 0,
            uid: Some("b".into()),
            content: vcard("b", "Bob"),
            local_only: false,
            dirty: false,
            deleted: true,
        })
        .await
        .unwrap();

    let journal = Arc::new(ScriptedJournal::new());
    let engine = contacts_engine(&fixture, fixture.store.clone(), journal.clone());
    let report = engine.perform_sync(&CancellationToken::new()).await;
    assert!(report.is_success(), "{:?}", report.outcome);

    let pushes = journal.pushes().await;
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].expected_head, None);

    let batch = &pushes[0].entries;
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].prev, None);
    assert_eq!(batch[1].prev, Some(batch[0].id));

    let first = SyncEntry::from_journal_entry(&fixture.codec, &batch[0]).unwrap();
    let second = SyncEntry::from_journal_entry(&fixture.codec, &batch[1]).unwrap();
    assert_eq!(first, SyncEntry::new(vcard("b", "Bob"), SyncAction::Delete));
    assert_eq!(second, SyncEntry::new(vcard("a", "Alice"), SyncAction::Add));

    let a = fixture.store.get_by_uid("a").await.unwrap().unwrap();
    assert!(!a.dirty);
    assert!(!a.local_only);
    assert!(fixture.store.get_by_uid("b").await.unwrap().is_none());

    assert_eq!(fixture.store.get_ctag().await.unwrap(), Some(batch[1].id));
    assert_eq!(report.ctag(), Some(batch[1].id));
    assert_eq!(report.stats.num_entries_pushed, 2);
    assert_eq!(report.stats.num_deletes, 1);
}

#[tokio::test]
async fn test_remote_add_then_change_from_saved_ctag() {
    init_tracing();
    let fixture = TestFixture::new();
    fixture.store.set_ctag(Some(c0())).await.unwrap();

    let remote = fixture
        .remote_chain(Some(c0()))
        .add(vcard("x", "First"))
        .change(vcard("x", "Second"))
        .build();
    let journal = Arc::new(ScriptedJournal::new());
    journal.on_fetch(remote.clone()).await;

    let engine = contacts_engine(&fixture, fixture.store.clone(), journal.clone());
    let report = engine.perform_sync(&CancellationToken::new()).await;
    assert!(report.is_success(), "{:?}", report.outcome);

    assert_eq!(journal.fetch_cursors().await, vec![Some(c0())]);
    assert_eq!(
        snapshot(&*fixture.store).await,
        vec![("x".to_string(), vcard("x", "Second"))]
    );
    let x = fixture.store.get_by_uid("x").await.unwrap().unwrap();
    assert!(!x.dirty && !x.local_only);

    assert_eq!(fixture.store.get_ctag().await.unwrap(), Some(remote[1].id));
    assert!(journal.pushes().await.is_empty());
    assert_eq!(report.stats.num_inserts, 1);
    assert_eq!(report.stats.num_updates, 1);
}

#[tokio::test]
async fn test_broken_first_link_aborts_before_any_mutation() {
    init_tracing();
    let fixture = TestFixture::new();
    fixture.store.set_ctag(Some(c0())).await.unwrap();
    fixture
        .store
        .create_local(Some("mine"), &vcard("mine", "Mine"))
        .await
        .unwrap();

    let elsewhere = EntryId::from_bytes([0xee; 32]);
    let remote = fixture
        .remote_chain(Some(elsewhere))
        .add(vcard("x", "Intruder"))
        .build();
    let journal = Arc::new(ScriptedJournal::new());
    journal.on_fetch(remote).await;

    let engine = contacts_engine(&fixture, fixture.store.clone(), journal.clone());
    let report = engine.perform_sync(&CancellationToken::new()).await;

    match &report.outcome {
        SyncOutcome::Failed { phase, class, .. } => {
            assert_eq!(*phase, Phase::FetchEntries);
            assert_eq!(*class, journal_sync::ErrorClass::Integrity);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(report.stats.num_parse_exceptions, 1);

    assert!(fixture.store.get_by_uid("x").await.unwrap().is_none());
    assert!(fixture.store.get_by_uid("mine").await.unwrap().unwrap().dirty);
    assert_eq!(fixture.store.get_ctag().await.unwrap(), Some(c0()));
    assert!(journal.pushes().await.is_empty());
}

#[tokio::test]
async fn test_broken_link_mid_batch_applies_nothing() {
    let fixture = TestFixture::new();
    let mut remote = fixture.remote_chain(None).add(vcard("x", "X")).build();
    remote.extend(
        fixture
            .remote_chain(Some(EntryId::from_bytes([1; 32])))
            .add(vcard("y", "Y"))
            .build(),
    );

    let journal = Arc::new(ScriptedJournal::new());
    journal.on_fetch(remote).await;
    let engine = contacts_engine(&fixture, fixture.store.clone(), journal);

    let result = engine.run_session(&CancellationToken::new()).await;
    assert!(matches!(result, Err(journal_sync::SyncError::Chain(_))));
    assert!(fixture.store.is_empty().await);
    assert_eq!(fixture.store.get_ctag().await.unwrap(), None);
}

#[tokio::test]
async fn test_tombstone_of_unpushed_resource_is_never_pushed() {
    let fixture = TestFixture::new();
    fixture
        .store
        .create_local(Some("t"), &vcard("t", "Temp"))
        .await
        .unwrap();
    fixture.store.delete_local("t").await.unwrap();

    let journal = Arc::new(ScriptedJournal::new());
    let engine = contacts_engine(&fixture, fixture.store.clone(), journal.clone());
    let report = engine.perform_sync(&CancellationToken::new()).await;

    assert!(report.is_success());
    assert!(journal.pushes().await.is_empty());
    assert!(fixture.store.is_empty().await);
    assert_eq!(report.stats.num_deletes, 1);
    assert_eq!(report.ctag(), None);
}

#[tokio::test]
async fn test_apply_is_idempotent() {
    let once = TestFixture::new();
    let twice = TestFixture::new();

    let entries = [
        SyncEntry::new(vcard("x", "One"), SyncAction::Add),
        SyncEntry::new(vcard("x", "Two"), SyncAction::Change),
        SyncEntry::new(vcard("y", "Why"), SyncAction::Add),
        SyncEntry::new(vcard("y", "Why"), SyncAction::Delete),
        SyncEntry::new(vcard("z", "Zed"), SyncAction::Change),
    ];

    let mut single = once.remote_chain(None);
    let mut doubled = twice.remote_chain(None);
    for entry in &entries {
        single = single.entry(entry.content.clone(), entry.action);
        doubled = doubled
            .entry(entry.content.clone(), entry.action)
            .entry(entry.content.clone(), entry.action);
    }

    for (fixture, remote) in [(&once, single.build()), (&twice, doubled.build())] {
        let journal = Arc::new(ScriptedJournal::new());
        journal.on_fetch(remote).await;
        let engine = contacts_engine(fixture, fixture.store.clone(), journal);
        assert!(engine.perform_sync(&CancellationToken::new()).await.is_success());
    }

    let expected = vec![
        ("x".to_string(), vcard("x", "Two")),
        ("z".to_string(), vcard("z", "Zed")),
    ];
    assert_eq!(snapshot(&*once.store).await, expected);
    assert_eq!(snapshot(&*twice.store).await, expected);
}

#[tokio::test]
async fn test_change_for_unknown_uid_creates_and_delete_of_unknown_is_ignored() {
    let fixture = TestFixture::new();
    let remote = fixture
        .remote_chain(None)
        .delete(vcard("ghost", "Gone"))
        .change(vcard("new", "Healed"))
        .build();

    let journal = Arc::new(ScriptedJournal::new());
    journal.on_fetch(remote.clone()).await;
    let engine = contacts_engine(&fixture, fixture.store.clone(), journal);
    let report = engine.perform_sync(&CancellationToken::new()).await;

    assert!(report.is_success());
    assert_eq!(
        snapshot(&*fixture.store).await,
        vec![("new".to_string(), vcard("new", "Healed"))]
    );
    assert_eq!(report.stats.num_deletes, 0);
    assert_eq!(report.ctag(), Some(remote[1].id));
}

#[tokio::test]
async fn test_batch_relinked_after_fetched_entries() {
    let fixture = TestFixture::new();
    fixture
        .store
        .create_local(Some("mine"), &vcard("mine", "Mine"))
        .await
        .unwrap();

    let remote = fixture.remote_chain(None).add(vcard("theirs", "Theirs")).build();
    let journal = Arc::new(ScriptedJournal::new());
    journal.on_fetch(remote.clone()).await;

    let engine = contacts_engine(&fixture, fixture.store.clone(), journal.clone());
    let report = engine.perform_sync(&CancellationToken::new()).await;
    assert!(report.is_success());

    let pushes = journal.pushes().await;
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].expected_head, Some(remote[0].id));
    assert_eq!(pushes[0].entries[0].prev, Some(remote[0].id));
    assert_eq!(report.ctag(), Some(pushes[0].entries[0].id));
    assert_eq!(fixture.store.len().await, 2);
}

#[tokio::test]
async fn test_resource_without_uid_gets_one_in_store_and_payload() {
    let fixture = TestFixture::new();
    fixture
        .store
        .create_local(None, "BEGIN:VCARD\r\nFN:Anon\r\nEND:VCARD\r\n")
        .await
        .unwrap();

    let journal = Arc::new(ScriptedJournal::new());
    let engine = contacts_engine(&fixture, fixture.store.clone(), journal.clone());
    let report = engine.perform_sync(&CancellationToken::new()).await;
    assert!(report.is_success());
    assert_eq!(report.stats.num_uids_assigned, 1);

    let stored = fixture.store.list_all().await.unwrap();
    let uid = stored[0].uid().unwrap().to_string();

    let pushes = journal.pushes().await;
    let pushed = SyncEntry::from_journal_entry(&fixture.codec, &pushes[0].entries[0]).unwrap();
    assert_eq!(pushed.action, SyncAction::Add);
    assert!(pushed.content.contains(&format!("UID:{uid}\r\n")));
}

#[tokio::test]
async fn test_skipped_when_collection_is_gone() {
    let fixture = TestFixture::new();
    fixture.store.set_exists(false).await;

    let journal = Arc::new(ScriptedJournal::new());
    let engine = contacts_engine(&fixture, fixture.store.clone(), journal.clone());
    let report = engine.perform_sync(&CancellationToken::new()).await;

    assert_eq!(report.outcome, SyncOutcome::Skipped);
    assert!(report.notification.is_none());
    assert!(journal.fetch_cursors().await.is_empty());
}

#[tokio::test]
async fn test_hooks_run_in_phase_order_and_see_applied_state() {
    let fixture = TestFixture::new();
    fixture
        .store
        .create_local(Some("local"), &vcard("local", "L"))
        .await
        .unwrap();
    let journal = Arc::new(ScriptedJournal::new());
    journal
        .on_fetch(fixture.remote_chain(None).add(vcard("remote", "R")).build())
        .await;

    let engine = SyncEngine::new(
        fixture.store.clone(),
        journal,
        fixture.codec.clone(),
        RecordingKind::default(),
        SyncConfig::default(),
    );
    let end = engine.run_session(&CancellationToken::new()).await.unwrap();
    assert!(matches!(end, SessionEnd::Completed { .. }));

    assert_eq!(
        engine.kind().calls(),
        vec!["prepare", "apply_local_entries", "post_process"]
    );
    assert_eq!(
        *engine.kind().seen_uids.lock().unwrap(),
        vec!["local".to_string(), "remote".to_string()]
    );
}

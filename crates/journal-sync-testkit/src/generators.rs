//! Proptest generators for property-based testing.

use proptest::prelude::*;

use journal_sync_core::{EntryId, Resource, SyncAction, SyncEntry};

use crate::fixtures::vcard;

/// Generate a random EntryId.
pub fn entry_id() -> impl Strategy<Value = EntryId> {
    any::<[u8; 32]>().prop_map(EntryId::from_bytes)
}

/// Generate a resource uid.
pub fn uid() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}(-[a-z0-9]{1,8}){0,3}".prop_map(String::from)
}

/// Generate a display name safe for a single content line.
pub fn display_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ]{0,23}".prop_map(String::from)
}

/// Generate a SyncAction.
pub fn sync_action() -> impl Strategy<Value = SyncAction> {
    prop_oneof![
        Just(SyncAction::Add),
        Just(SyncAction::Change),
        Just(SyncAction::Delete),
    ]
}

/// Generate a sync entry carrying a vCard.
pub fn vcard_entry() -> impl Strategy<Value = SyncEntry> {
    (uid(), display_name(), sync_action())
        .prop_map(|(uid, name, action)| SyncEntry::new(vcard(&uid, &name), action))
}

/// Sync flags of a local resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFlags {
    pub local_only: bool,
    pub dirty: bool,
    pub deleted: bool,
}

impl Arbitrary for LocalFlags {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<bool>(), any::<bool>(), any::<bool>())
            .prop_map(|(local_only, dirty, deleted)| LocalFlags {
                local_only,
                dirty: dirty || local_only,
                deleted,
            })
            .boxed()
    }
}

/// Generate local resources with distinct uids and arbitrary flags.
pub fn local_resources(max: usize) -> impl Strategy<Value = Vec<Resource>> {
    prop::collection::btree_map(uid(), (display_name(), any::<LocalFlags>()), 0..=max).prop_map(
        |resources| {
            resources
                .into_iter()
                .map(|(uid, (name, flags))| Resource {
                    id: 0,
                    content: vcard(&uid, &name),
                    uid: Some(uid),
                    local_only: flags.local_only,
                    dirty: flags.dirty,
                    deleted: flags.deleted,
                })
                .collect()
        },
    )
}

//! End-to-end publishing behaviour over the memory store.

mod support;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use mockable::Clock;
use rstest::rstest;
use string_manager::domain::ports::{
    PublishRequest, RecordStoreError, StringCommand, StringItemRepository, UpdateStringRequest,
    VersionCommand,
};
use string_manager::domain::{
    AppId, ChangeLabel, ErrorCode, NewStringItem, Page, PageRequest, Role, SnapshotFidelity,
    SnapshotPolicy, StringEdit, StringId, StringItem, StringPatch, StringStatus, StringValue,
    VersionService,
};
use string_manager::outbound::memory::MemoryRecordStore;
use string_manager::test_support::FixtureClock;

use support::{Harness, constrained};

#[tokio::test]
async fn publishing_a_settled_table_advances_the_counter() {
    let harness = Harness::new(SnapshotPolicy::Full).await;
    let scope = harness.app().await;
    harness.add_string(scope, "1", "Hello").await;
    harness.settle(scope).await;

    let version = harness.publish(scope).await;

    assert_eq!(version.version_number, 1);
    assert!(version.notifications.is_empty());
    assert_eq!(version.snapshot.fidelity, SnapshotFidelity::Full);
    assert_eq!(version.snapshot.strings.len(), 1);
    assert_eq!(harness.current_version(scope).await, 2);
}

#[tokio::test]
async fn edits_after_a_publish_are_modified_and_publish_as_such() {
    let harness = Harness::new(SnapshotPolicy::Full).await;
    let scope = harness.app().await;
    let item = harness.add_string(scope, "1", "Hello").await;
    harness.settle(scope).await;
    harness.publish(scope).await;

    harness.edit_value(scope, item.id, "Hello there").await;
    let pending = harness
        .ports
        .versions_query
        .pending_changes(harness.owner.clone(), scope)
        .await
        .expect("pending changes");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].label, ChangeLabel::Modified);
    assert_eq!(pending[0].key, "1");

    harness.clock.advance(60);
    let version = harness.publish(scope).await;
    assert_eq!(version.version_number, 2);
    assert_eq!(version.notifications.len(), 1);
    assert_eq!(version.notifications[0].status, ChangeLabel::Modified);
    assert_eq!(version.notifications[0].string_number, 1);
    assert_eq!(version.notifications[0].string_id, item.id);

    let strings = harness.strings(scope).await;
    assert_eq!(strings[0].status, None);
    assert_eq!(strings[0].modified_at, None);
    assert_eq!(harness.current_version(scope).await, 3);
}

#[tokio::test]
async fn large_tables_publish_only_their_pending_strings_when_constrained() {
    let harness = Harness::new(constrained(1600, 5 * 1024 * 1024, 3)).await;
    let scope = harness.app().await;
    let mut ids = Vec::new();
    for index in 1..=2000 {
        let item = harness
            .add_string(scope, &format!("key_{index}"), &format!("value {index}"))
            .await;
        ids.push(item.id);
    }
    harness.settle(scope).await;
    let edited: Vec<_> = ids.iter().step_by(400).copied().collect();
    for id in &edited {
        harness.edit_value(scope, *id, "changed").await;
    }

    let version = harness.publish(scope).await;

    assert_eq!(version.snapshot.fidelity, SnapshotFidelity::PendingOnly);
    let snapshot_ids: BTreeSet<_> = version.snapshot.strings.iter().map(|e| e.id).collect();
    let notified_ids: BTreeSet<_> = version.notifications.iter().map(|n| n.string_id).collect();
    let expected: BTreeSet<_> = edited.iter().copied().collect();
    assert_eq!(snapshot_ids, expected);
    assert_eq!(notified_ids, expected);
    assert!(
        version
            .snapshot
            .strings
            .iter()
            .all(|entry| entry.additional_columns.is_none())
    );

    let stored = harness
        .ports
        .versions_query
        .get_version(harness.owner.clone(), scope, version.id)
        .await
        .expect("get version");
    assert_eq!(stored.snapshot, version.snapshot);
}

#[tokio::test]
async fn evicted_snapshots_read_back_as_omitted() {
    let harness = Harness::new(constrained(1, 5 * 1024 * 1024, 1)).await;
    let scope = harness.app().await;
    let first = harness.add_string(scope, "a", "one").await;
    harness.add_string(scope, "b", "two").await;
    let older = harness.publish(scope).await;
    assert_eq!(older.snapshot.fidelity, SnapshotFidelity::PendingOnly);

    harness.edit_value(scope, first.id, "uno").await;
    let newer = harness.publish(scope).await;
    assert_eq!(newer.snapshot.strings.len(), 1);

    let reread = harness
        .ports
        .versions_query
        .get_version(harness.owner.clone(), scope, older.id)
        .await
        .expect("get version");
    assert_eq!(reread.snapshot.fidelity, SnapshotFidelity::Omitted);
    assert!(reread.snapshot.strings.is_empty());
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(7)]
#[tokio::test]
async fn n_publishes_advance_the_counter_by_n(#[case] publishes: i64) {
    let harness = Harness::new(SnapshotPolicy::Full).await;
    let scope = harness.app().await;
    for _ in 0..publishes {
        let version = harness.publish(scope).await;
        assert!(version.notifications.is_empty());
    }

    assert_eq!(harness.current_version(scope).await, 1 + publishes);
    let versions = harness
        .ports
        .versions_query
        .list_versions(harness.owner.clone(), scope)
        .await
        .expect("list versions");
    let numbers: Vec<_> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, (1..=publishes).collect::<Vec<_>>());
}

#[tokio::test]
async fn numeric_keys_become_string_numbers() {
    let harness = Harness::new(SnapshotPolicy::Full).await;
    let scope = harness.app().await;
    harness.add_string(scope, "greeting", "Hi").await;
    harness.add_string(scope, "42", "The answer").await;

    let version = harness.publish(scope).await;

    let numbers: Vec<_> = version
        .notifications
        .iter()
        .map(|n| (n.status, n.string_number))
        .collect();
    assert_eq!(numbers, vec![(ChangeLabel::New, 1), (ChangeLabel::New, 42)]);
}

#[tokio::test]
async fn viewers_cannot_publish() {
    let harness = Harness::new(SnapshotPolicy::Full).await;
    let scope = harness.app().await;
    let viewer = harness
        .member(scope.project_id, Role::Viewer, "viewer")
        .await;

    let err = harness
        .publish_as(&viewer, scope)
        .await
        .expect_err("viewer publish");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(harness.current_version(scope).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishes_get_distinct_numbers() {
    let harness = Harness::new(SnapshotPolicy::Full).await;
    let scope = harness.app().await;
    harness.add_string(scope, "title", "Title").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let versions = harness.ports.versions.clone();
            let caller = harness.owner.clone();
            tokio::spawn(async move {
                versions
                    .publish(PublishRequest {
                        caller,
                        scope,
                        version_number: None,
                        publisher_name: None,
                        notes: None,
                    })
                    .await
            })
        })
        .collect();

    let mut numbers = BTreeSet::new();
    let mut notified = 0;
    for handle in handles {
        let version = handle.await.expect("task joins").expect("publish succeeds");
        notified += version.notifications.len();
        assert!(numbers.insert(version.version_number), "duplicate number");
    }

    assert_eq!(numbers, (1..=8).collect());
    assert_eq!(notified, 1, "the pending string is published exactly once");
    assert_eq!(harness.current_version(scope).await, 9);
}

/// Lands one edit right after the publisher has read the string table.
struct EditAfterRead {
    store: Arc<MemoryRecordStore>,
    strings: Arc<dyn StringCommand>,
    clock: Arc<FixtureClock>,
    edit: Mutex<Option<UpdateStringRequest>>,
}

#[async_trait]
impl StringItemRepository for EditAfterRead {
    async fn create_string(&self, item: NewStringItem) -> Result<StringItem, RecordStoreError> {
        self.store.create_string(item).await
    }

    async fn find_string(&self, id: StringId) -> Result<Option<StringItem>, RecordStoreError> {
        self.store.find_string(id).await
    }

    async fn list_strings(
        &self,
        app: AppId,
        page: PageRequest,
    ) -> Result<Page<StringItem>, RecordStoreError> {
        self.store.list_strings(app, page).await
    }

    async fn list_all_strings(&self, app: AppId) -> Result<Vec<StringItem>, RecordStoreError> {
        let read = self.store.list_all_strings(app).await?;
        let edit = self
            .edit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(edit) = edit {
            self.clock.advance(5);
            self.strings.update_string(edit).await.expect("concurrent edit");
        }
        Ok(read)
    }

    async fn update_string(
        &self,
        id: StringId,
        patch: StringPatch,
    ) -> Result<Option<StringItem>, RecordStoreError> {
        self.store.update_string(id, patch).await
    }

    async fn reset_pending(&self, app: AppId) -> Result<u64, RecordStoreError> {
        self.store.reset_pending(app).await
    }

    async fn delete_string(&self, id: StringId) -> Result<bool, RecordStoreError> {
        self.store.delete_string(id).await
    }
}

#[tokio::test]
async fn edits_landing_during_a_publish_stay_pending() {
    let harness = Harness::new(SnapshotPolicy::Full).await;
    let scope = harness.app().await;
    let item = harness.add_string(scope, "1", "Hello").await;

    let strings = Arc::new(EditAfterRead {
        store: Arc::clone(&harness.store),
        strings: Arc::clone(&harness.ports.strings),
        clock: Arc::clone(&harness.clock),
        edit: Mutex::new(Some(UpdateStringRequest {
            caller: harness.owner.clone(),
            scope,
            string_id: item.id,
            edit: StringEdit {
                key: None,
                value: Some(StringValue::new("Edited mid-publish").expect("value")),
                additional_columns: None,
            },
        })),
    });
    let clock: Arc<dyn Clock> = harness.clock.clone();
    let publisher = VersionService::new(
        Arc::clone(&harness.store),
        strings,
        Arc::clone(&harness.store),
        Arc::clone(&harness.store),
        SnapshotPolicy::Full,
        clock,
    );

    let first = publisher
        .publish(PublishRequest {
            caller: harness.owner.clone(),
            scope,
            version_number: None,
            publisher_name: None,
            notes: None,
        })
        .await
        .expect("publish succeeds");
    assert_eq!(first.snapshot.strings[0].value, "Hello");

    let stored = harness.strings(scope).await;
    assert_eq!(stored[0].value.as_str(), "Edited mid-publish");
    assert_eq!(stored[0].status, Some(StringStatus::New));
    assert!(stored[0].modified_at.is_some());

    let second = harness.publish(scope).await;
    assert_eq!(second.notifications.len(), 1);
    assert_eq!(second.notifications[0].string_id, item.id);
    assert_eq!(second.snapshot.strings[0].value, "Edited mid-publish");
}

//! Byte-budgeted snapshot archive.
//!
//! Models a small key-value store with a hard capacity, such as browser local
//! storage. Each snapshot is held as its encoded JSON text and charged by
//! length. Degraded snapshots use single-letter field names to stretch the
//! budget. The archive lives in memory and, when opened over a
//! [`SnapshotFile`], is written through to disk so it survives restarts.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{ArchiveUsage, SnapshotArchive, SnapshotArchiveError, SnapshotKey};
use crate::domain::{AppId, SnapshotEntry, SnapshotFidelity, StringId, StringStatus, VersionSnapshot};
use crate::outbound::memory::SnapshotFile;

/// Default archive capacity: 5 MiB.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;
/// Default number of snapshots retained per app.
pub const DEFAULT_HISTORY_PER_APP: usize = 3;

/// Pending-only entry with abbreviated field names.
#[derive(Debug, Serialize, Deserialize)]
struct CompactEntry {
    i: StringId,
    k: String,
    v: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    s: Option<StringStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    m: Option<DateTime<Utc>>,
}

impl From<&SnapshotEntry> for CompactEntry {
    fn from(entry: &SnapshotEntry) -> Self {
        Self {
            i: entry.id,
            k: entry.key.clone(),
            v: entry.value.clone(),
            s: entry.status,
            m: entry.modified_at,
        }
    }
}

impl From<CompactEntry> for SnapshotEntry {
    fn from(entry: CompactEntry) -> Self {
        Self {
            id: entry.i,
            key: entry.k,
            value: entry.v,
            status: entry.s,
            modified_at: entry.m,
            additional_columns: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "fidelity", rename_all = "snake_case")]
enum ArchivedSnapshot {
    Full { strings: Vec<SnapshotEntry> },
    WithoutColumns { strings: Vec<SnapshotEntry> },
    PendingOnly { strings: Vec<CompactEntry> },
    Omitted,
}

impl ArchivedSnapshot {
    fn encode(snapshot: &VersionSnapshot) -> Self {
        match snapshot.fidelity {
            SnapshotFidelity::Full => Self::Full {
                strings: snapshot.strings.clone(),
            },
            SnapshotFidelity::WithoutColumns => Self::WithoutColumns {
                strings: snapshot
                    .strings
                    .iter()
                    .cloned()
                    .map(|mut entry| {
                        entry.additional_columns = None;
                        entry
                    })
                    .collect(),
            },
            SnapshotFidelity::PendingOnly => Self::PendingOnly {
                strings: snapshot.strings.iter().map(CompactEntry::from).collect(),
            },
            SnapshotFidelity::Omitted => Self::Omitted,
        }
    }

    fn decode(self) -> VersionSnapshot {
        let (fidelity, strings) = match self {
            Self::Full { strings } => (SnapshotFidelity::Full, strings),
            Self::WithoutColumns { strings } => (SnapshotFidelity::WithoutColumns, strings),
            Self::PendingOnly { strings } => (
                SnapshotFidelity::PendingOnly,
                strings.into_iter().map(SnapshotEntry::from).collect(),
            ),
            Self::Omitted => (SnapshotFidelity::Omitted, Vec::new()),
        };
        VersionSnapshot { fidelity, strings }
    }
}

#[derive(Debug, Clone, Default)]
struct ArchiveState {
    entries: BTreeMap<SnapshotKey, String>,
    used_bytes: u64,
}

impl ArchiveState {
    fn from_entries(entries: BTreeMap<SnapshotKey, String>) -> Self {
        let used_bytes = entries
            .values()
            .map(|text| byte_len(text))
            .fold(0, u64::saturating_add);
        Self {
            entries,
            used_bytes,
        }
    }

    fn remove(&mut self, key: &SnapshotKey) -> bool {
        match self.entries.remove(key) {
            Some(text) => {
                self.used_bytes = self.used_bytes.saturating_sub(byte_len(&text));
                true
            }
            None => false,
        }
    }

    fn keys_for(&self, app: AppId) -> Vec<SnapshotKey> {
        self.entries
            .keys()
            .filter(|key| key.app_id == app)
            .copied()
            .collect()
    }
}

/// On-disk form of the archive: each snapshot keeps its encoded text so the
/// byte charge survives a reload unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveDocument {
    entries: Vec<ArchiveDocumentEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveDocumentEntry {
    app_id: AppId,
    version_number: i64,
    snapshot: String,
}

impl From<&ArchiveState> for ArchiveDocument {
    fn from(state: &ArchiveState) -> Self {
        Self {
            entries: state
                .entries
                .iter()
                .map(|(key, text)| ArchiveDocumentEntry {
                    app_id: key.app_id,
                    version_number: key.version_number,
                    snapshot: text.clone(),
                })
                .collect(),
        }
    }
}

impl From<ArchiveDocument> for ArchiveState {
    fn from(document: ArchiveDocument) -> Self {
        Self::from_entries(
            document
                .entries
                .into_iter()
                .map(|entry| {
                    (
                        SnapshotKey {
                            app_id: entry.app_id,
                            version_number: entry.version_number,
                        },
                        entry.snapshot,
                    )
                })
                .collect(),
        )
    }
}

fn byte_len(text: &str) -> u64 {
    u64::try_from(text.len()).unwrap_or(u64::MAX)
}

fn backend_error(err: impl std::fmt::Display) -> SnapshotArchiveError {
    SnapshotArchiveError::backend(err.to_string())
}

/// [`SnapshotArchive`] with a fixed byte capacity and per-app retention.
///
/// Every mutation is staged on a copy of the state, written to the backing
/// file when there is one, and only then made visible. A refused or failed
/// write leaves the archive as it was.
#[derive(Debug)]
pub struct QuotaSnapshotArchive {
    capacity_bytes: u64,
    history_per_app: usize,
    file: Option<SnapshotFile>,
    state: Mutex<ArchiveState>,
}

impl QuotaSnapshotArchive {
    /// Process-local archive holding at most `capacity_bytes` of encoded
    /// snapshots and `history_per_app` snapshots per app (at least one).
    pub fn new(capacity_bytes: u64, history_per_app: usize) -> Self {
        Self {
            capacity_bytes,
            history_per_app: history_per_app.max(1),
            file: None,
            state: Mutex::new(ArchiveState::default()),
        }
    }

    /// Archive persisted to `file`, reloading whatever it already holds.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotArchiveError::Backend`] when the file cannot be read
    /// and [`SnapshotArchiveError::Serialization`] when it does not parse.
    pub fn open(
        file: SnapshotFile,
        capacity_bytes: u64,
        history_per_app: usize,
    ) -> Result<Self, SnapshotArchiveError> {
        let state = match file.load().map_err(backend_error)? {
            Some(contents) => serde_json::from_str::<ArchiveDocument>(&contents)
                .map(ArchiveState::from)
                .map_err(|err| SnapshotArchiveError::serialization(err.to_string()))?,
            None => ArchiveState::default(),
        };
        debug!(
            path = %file.path().display(),
            entries = state.entries.len(),
            used_bytes = state.used_bytes,
            "opened snapshot archive"
        );
        Ok(Self {
            capacity_bytes,
            history_per_app: history_per_app.max(1),
            file: Some(file),
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ArchiveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(
        &self,
        current: &mut ArchiveState,
        next: ArchiveState,
    ) -> Result<(), SnapshotArchiveError> {
        if let Some(file) = &self.file {
            let contents = serde_json::to_vec(&ArchiveDocument::from(&next))
                .map_err(|err| SnapshotArchiveError::serialization(err.to_string()))?;
            file.save(&contents).map_err(backend_error)?;
        }
        *current = next;
        Ok(())
    }
}

impl Default for QuotaSnapshotArchive {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_BYTES, DEFAULT_HISTORY_PER_APP)
    }
}

#[async_trait]
impl SnapshotArchive for QuotaSnapshotArchive {
    async fn store(
        &self,
        key: SnapshotKey,
        snapshot: &VersionSnapshot,
    ) -> Result<(), SnapshotArchiveError> {
        let text = serde_json::to_string(&ArchivedSnapshot::encode(snapshot))
            .map_err(|err| SnapshotArchiveError::serialization(err.to_string()))?;
        let required = byte_len(&text);

        let mut state = self.lock();
        let mut next = state.clone();
        next.remove(&key);
        let mut retained = next.keys_for(key.app_id);
        let mut pruned = Vec::new();
        while retained.len() >= self.history_per_app {
            let oldest = retained.remove(0);
            next.remove(&oldest);
            pruned.push(oldest);
        }

        let available = self.capacity_bytes.saturating_sub(next.used_bytes);
        if required > available {
            return Err(SnapshotArchiveError::quota_exceeded(required, available));
        }
        next.used_bytes = next.used_bytes.saturating_add(required);
        next.entries.insert(key, text);
        self.commit(&mut state, next)?;

        for oldest in pruned {
            debug!(app_id = %oldest.app_id, version = oldest.version_number, "pruned archived snapshot");
        }
        Ok(())
    }

    async fn load(
        &self,
        key: SnapshotKey,
    ) -> Result<Option<VersionSnapshot>, SnapshotArchiveError> {
        let Some(text) = self.lock().entries.get(&key).cloned() else {
            return Ok(None);
        };
        let archived: ArchivedSnapshot = serde_json::from_str(&text)
            .map_err(|err| SnapshotArchiveError::serialization(err.to_string()))?;
        Ok(Some(archived.decode()))
    }

    async fn evict_app(&self, app: AppId) -> Result<usize, SnapshotArchiveError> {
        let mut state = self.lock();
        let keys = state.keys_for(app);
        if keys.is_empty() {
            return Ok(0);
        }
        let mut next = state.clone();
        for key in &keys {
            next.remove(key);
        }
        self.commit(&mut state, next)?;
        Ok(keys.len())
    }

    async fn evict_all(&self) -> Result<usize, SnapshotArchiveError> {
        let mut state = self.lock();
        let count = state.entries.len();
        self.commit(&mut state, ArchiveState::default())?;
        Ok(count)
    }

    async fn usage(&self) -> ArchiveUsage {
        let state = self.lock();
        ArchiveUsage {
            used_bytes: state.used_bytes,
            capacity_bytes: self.capacity_bytes,
            entries: state.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn entry(id: i64, status: Option<StringStatus>) -> SnapshotEntry {
        SnapshotEntry {
            id: StringId::new(id),
            key: format!("key_{id}"),
            value: format!("value {id}"),
            status,
            modified_at: None,
            additional_columns: None,
        }
    }

    fn key(app: i64, version_number: i64) -> SnapshotKey {
        SnapshotKey {
            app_id: AppId::new(app),
            version_number,
        }
    }

    fn pending_snapshot() -> VersionSnapshot {
        VersionSnapshot {
            fidelity: SnapshotFidelity::PendingOnly,
            strings: vec![entry(1, Some(StringStatus::New)), entry(2, Some(StringStatus::Modified))],
        }
    }

    #[tokio::test]
    async fn pending_only_snapshots_use_abbreviated_names() {
        let archive = QuotaSnapshotArchive::default();
        archive.store(key(1, 1), &pending_snapshot()).await.expect("store");

        let text = archive
            .lock()
            .entries
            .get(&key(1, 1))
            .cloned()
            .expect("archived text");
        assert!(text.contains("\"k\":\"key_1\""));
        assert!(!text.contains("\"key\""));

        let loaded = archive.load(key(1, 1)).await.expect("load");
        assert_eq!(loaded, Some(pending_snapshot()));
    }

    #[tokio::test]
    async fn without_columns_snapshots_keep_long_names() {
        let archive = QuotaSnapshotArchive::default();
        let snapshot = VersionSnapshot {
            fidelity: SnapshotFidelity::WithoutColumns,
            strings: vec![entry(7, None)],
        };
        archive.store(key(2, 4), &snapshot).await.expect("store");
        let text = archive.lock().entries.get(&key(2, 4)).cloned().expect("text");
        assert!(text.contains("\"key\":\"key_7\""));
        assert_eq!(archive.load(key(2, 4)).await.expect("load"), Some(snapshot));
    }

    #[tokio::test]
    async fn keeps_only_recent_history_per_app() {
        let archive = QuotaSnapshotArchive::new(DEFAULT_QUOTA_BYTES, 2);
        for version in 1..=3 {
            archive
                .store(key(1, version), &pending_snapshot())
                .await
                .expect("store");
        }
        archive.store(key(2, 1), &pending_snapshot()).await.expect("other app");

        assert_eq!(archive.load(key(1, 1)).await.expect("load"), None);
        assert!(archive.load(key(1, 2)).await.expect("load").is_some());
        assert!(archive.load(key(1, 3)).await.expect("load").is_some());
        assert_eq!(archive.usage().await.entries, 3);
    }

    #[rstest]
    #[case(8)]
    #[case(0)]
    #[tokio::test]
    async fn rejects_writes_beyond_capacity(#[case] capacity: u64) {
        let archive = QuotaSnapshotArchive::new(capacity, 3);
        let err = archive
            .store(key(1, 1), &pending_snapshot())
            .await
            .expect_err("quota");
        match err {
            SnapshotArchiveError::QuotaExceeded { required, available } => {
                assert!(required > available);
                assert_eq!(available, capacity);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(archive.usage().await, ArchiveUsage {
            used_bytes: 0,
            capacity_bytes: capacity,
            entries: 0,
        });
    }

    #[tokio::test]
    async fn eviction_frees_space() {
        let archive = QuotaSnapshotArchive::default();
        archive.store(key(1, 1), &pending_snapshot()).await.expect("store");
        archive.store(key(1, 2), &pending_snapshot()).await.expect("store");
        archive.store(key(2, 1), &pending_snapshot()).await.expect("store");

        assert_eq!(archive.evict_app(AppId::new(1)).await.expect("evict"), 2);
        assert_eq!(archive.usage().await.entries, 1);
        assert_eq!(archive.evict_all().await.expect("evict all"), 1);
        assert_eq!(archive.usage().await.used_bytes, 0);
    }

    #[tokio::test]
    async fn restoring_a_key_replaces_its_charge() {
        let archive = QuotaSnapshotArchive::default();
        archive.store(key(1, 1), &pending_snapshot()).await.expect("store");
        let first = archive.usage().await.used_bytes;
        archive.store(key(1, 1), &pending_snapshot()).await.expect("restore");
        assert_eq!(archive.usage().await.used_bytes, first);
    }

    #[tokio::test]
    async fn reopened_archives_reload_their_snapshots() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("data/snapshot-archive.json");

        let archive =
            QuotaSnapshotArchive::open(SnapshotFile::new(&path), DEFAULT_QUOTA_BYTES, 3)
                .expect("open");
        archive.store(key(1, 1), &pending_snapshot()).await.expect("store");
        archive.store(key(2, 1), &pending_snapshot()).await.expect("store");
        archive.evict_app(AppId::new(2)).await.expect("evict");
        let usage = archive.usage().await;
        drop(archive);

        let reopened =
            QuotaSnapshotArchive::open(SnapshotFile::new(&path), DEFAULT_QUOTA_BYTES, 3)
                .expect("reopen");
        assert_eq!(reopened.usage().await, usage);
        assert_eq!(
            reopened.load(key(1, 1)).await.expect("load"),
            Some(pending_snapshot())
        );
        assert_eq!(reopened.load(key(2, 1)).await.expect("load"), None);
    }

    #[tokio::test]
    async fn corrupt_archive_files_refuse_to_open() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("snapshot-archive.json");
        std::fs::write(&path, b"[not an archive").expect("write");

        let err = QuotaSnapshotArchive::open(SnapshotFile::new(&path), DEFAULT_QUOTA_BYTES, 3)
            .expect_err("corrupt file");
        assert!(matches!(err, SnapshotArchiveError::Serialization { .. }));
    }

    #[tokio::test]
    async fn refused_writes_keep_existing_snapshots() {
        let probe = QuotaSnapshotArchive::default();
        probe.store(key(1, 1), &pending_snapshot()).await.expect("measure");
        let one_snapshot = probe.usage().await.used_bytes;

        let archive = QuotaSnapshotArchive::new(one_snapshot + 4, 1);
        archive.store(key(1, 1), &pending_snapshot()).await.expect("store");
        let larger = VersionSnapshot {
            fidelity: SnapshotFidelity::PendingOnly,
            strings: (1..=20).map(|id| entry(id, Some(StringStatus::New))).collect(),
        };

        let err = archive.store(key(1, 2), &larger).await.expect_err("quota");
        assert!(matches!(err, SnapshotArchiveError::QuotaExceeded { .. }));
        assert_eq!(
            archive.load(key(1, 1)).await.expect("load"),
            Some(pending_snapshot())
        );
        assert_eq!(archive.usage().await.used_bytes, one_snapshot);
    }

    #[tokio::test]
    async fn failed_persists_leave_the_archive_unchanged() {
        let dir = tempfile::tempdir().expect("temp dir");
        let data_dir = dir.path().join("data");
        let archive = QuotaSnapshotArchive::open(
            SnapshotFile::new(data_dir.join("snapshot-archive.json")),
            DEFAULT_QUOTA_BYTES,
            3,
        )
        .expect("open over a missing file");
        std::fs::write(&data_dir, b"not a directory").expect("block the directory");

        let err = archive
            .store(key(1, 1), &pending_snapshot())
            .await
            .expect_err("directory is blocked");
        assert!(matches!(err, SnapshotArchiveError::Backend { .. }));
        assert_eq!(archive.usage().await.entries, 0);
        assert_eq!(archive.load(key(1, 1)).await.expect("load"), None);
    }
}

//! How much of the string table a publish keeps.
//!
//! Server-side stores keep every string with all columns. The constrained
//! policy models a capacity-limited client store: columns are dropped, large
//! tables keep only their pending entries, and the entries live in a
//! [`SnapshotArchive`] rather than in the version record.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{SnapshotArchive, SnapshotArchiveError, SnapshotKey};
use crate::domain::service_support::describe_archive_error;
use crate::domain::{SnapshotFidelity, StringItem, VersionSnapshot};

/// String count above which the constrained policy keeps only pending entries.
pub const DEFAULT_LARGE_APP_THRESHOLD: usize = 1600;

/// Settings for the constrained policy.
#[derive(Clone)]
pub struct ConstrainedSnapshots {
    large_app_threshold: usize,
    archive: Arc<dyn SnapshotArchive>,
}

impl fmt::Debug for ConstrainedSnapshots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstrainedSnapshots")
            .field("large_app_threshold", &self.large_app_threshold)
            .finish_non_exhaustive()
    }
}

impl ConstrainedSnapshots {
    /// Constrained snapshots archived in `archive`.
    #[must_use]
    pub fn new(large_app_threshold: usize, archive: Arc<dyn SnapshotArchive>) -> Self {
        Self {
            large_app_threshold,
            archive,
        }
    }

    /// Archive backing this policy.
    #[must_use]
    pub fn archive(&self) -> &Arc<dyn SnapshotArchive> {
        &self.archive
    }

    /// Reduce the table according to its size.
    ///
    /// Large tables with nothing pending produce an omitted snapshot.
    #[must_use]
    pub fn plan(&self, strings: &[StringItem]) -> VersionSnapshot {
        if strings.len() <= self.large_app_threshold {
            return VersionSnapshot::without_columns(strings);
        }
        let pending = VersionSnapshot::pending_only(strings);
        if pending.strings.is_empty() {
            VersionSnapshot::omitted()
        } else {
            pending
        }
    }

    /// Write a planned snapshot, evicting and retrying once when the archive
    /// is full. Returns what was actually retained.
    pub async fn archive_snapshot(
        &self,
        key: SnapshotKey,
        snapshot: VersionSnapshot,
    ) -> VersionSnapshot {
        if snapshot.fidelity == SnapshotFidelity::Omitted {
            return snapshot;
        }
        match self.archive.store(key, &snapshot).await {
            Ok(()) => snapshot,
            Err(SnapshotArchiveError::QuotaExceeded {
                required,
                available,
            }) => {
                warn!(
                    app_id = %key.app_id,
                    version_number = key.version_number,
                    required,
                    available,
                    "snapshot archive full, evicting"
                );
                self.evict_for(key).await;
                match self.archive.store(key, &snapshot).await {
                    Ok(()) => snapshot,
                    Err(err) => Self::skipped(key, &err),
                }
            }
            Err(err) => Self::skipped(key, &err),
        }
    }

    async fn evict_for(&self, key: SnapshotKey) {
        let evicted = match self.archive.evict_app(key.app_id).await {
            Ok(0) => self.archive.evict_all().await,
            other => other,
        };
        match evicted {
            Ok(count) => info!(app_id = %key.app_id, count, "evicted archived snapshots"),
            Err(err) => warn!(
                app_id = %key.app_id,
                reason = describe_archive_error(&err),
                error = %err,
                "snapshot eviction failed"
            ),
        }
    }

    fn skipped(key: SnapshotKey, err: &SnapshotArchiveError) -> VersionSnapshot {
        warn!(
            app_id = %key.app_id,
            version_number = key.version_number,
            reason = describe_archive_error(err),
            error = %err,
            "snapshot not archived"
        );
        VersionSnapshot::omitted()
    }

    /// Fill in entries for a record whose snapshot lives in the archive.
    ///
    /// Records that carry their entries inline, or that retained nothing, are
    /// returned unchanged. An evicted or unreadable entry reads as omitted.
    pub async fn hydrate(&self, key: SnapshotKey, header: VersionSnapshot) -> VersionSnapshot {
        if matches!(
            header.fidelity,
            SnapshotFidelity::Full | SnapshotFidelity::Omitted
        ) || !header.strings.is_empty()
        {
            return header;
        }
        match self.archive.load(key).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => VersionSnapshot::omitted(),
            Err(err) => {
                warn!(
                    app_id = %key.app_id,
                    version_number = key.version_number,
                    error = %err,
                    "archived snapshot unreadable"
                );
                VersionSnapshot::omitted()
            }
        }
    }
}

/// Snapshot policy applied by the publisher.
#[derive(Debug, Clone, Default)]
pub enum SnapshotPolicy {
    /// Keep every string with all columns in the version record.
    #[default]
    Full,
    /// Reduce and archive snapshots under a byte budget.
    Constrained(ConstrainedSnapshots),
}

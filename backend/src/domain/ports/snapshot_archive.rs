//! Port for capacity-limited snapshot storage.
//!
//! Under the constrained snapshot policy a version's string entries are kept
//! in an archive with a byte budget rather than in the version record. The
//! archive may refuse writes or lose old entries; the version record itself is
//! unaffected.

use async_trait::async_trait;

use crate::domain::{AppId, VersionSnapshot};

use super::define_port_error;

define_port_error! {
    /// Errors raised by snapshot archive adapters.
    pub enum SnapshotArchiveError {
        /// The write would exceed the archive's capacity.
        QuotaExceeded { required: u64, available: u64 } =>
            "snapshot archive quota exceeded: need {required} bytes, {available} available",
        /// The snapshot could not be encoded or decoded.
        Serialization { message: String } =>
            "snapshot archive serialization failed: {message}",
        /// The archive backend failed.
        Backend { message: String } =>
            "snapshot archive backend failed: {message}",
    }
}

/// Address of one archived snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotKey {
    pub app_id: AppId,
    pub version_number: i64,
}

/// Space accounting for an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveUsage {
    pub used_bytes: u64,
    pub capacity_bytes: u64,
    pub entries: usize,
}

/// Byte-budgeted storage for version snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotArchive: Send + Sync {
    /// Store a snapshot, first pruning the app's oldest entries down to the
    /// archive's per-app retention.
    async fn store(
        &self,
        key: SnapshotKey,
        snapshot: &VersionSnapshot,
    ) -> Result<(), SnapshotArchiveError>;

    /// Load a snapshot if it is still archived.
    async fn load(&self, key: SnapshotKey) -> Result<Option<VersionSnapshot>, SnapshotArchiveError>;

    /// Drop every snapshot of one app, returning how many were removed.
    async fn evict_app(&self, app: AppId) -> Result<usize, SnapshotArchiveError>;

    /// Drop every snapshot, returning how many were removed.
    async fn evict_all(&self) -> Result<usize, SnapshotArchiveError>;

    /// Current space accounting.
    async fn usage(&self) -> ArchiveUsage;
}

//! Published versions: an immutable snapshot plus change notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AdditionalColumns, AppId, StringId, StringItem, StringStatus, UserId, VersionId};

/// Label shown for a change in a notification or pending list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeLabel {
    New,
    Modified,
}

impl From<StringStatus> for ChangeLabel {
    fn from(value: StringStatus) -> Self {
        match value {
            StringStatus::New => Self::New,
            StringStatus::Modified => Self::Modified,
        }
    }
}

/// Audit record of one change included in a publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub status: ChangeLabel,
    pub string_number: i64,
    pub string_id: StringId,
    pub modified_at: DateTime<Utc>,
}

/// How much of the string table a snapshot retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFidelity {
    /// Every string, including additional columns.
    Full,
    /// Every string, additional columns dropped.
    WithoutColumns,
    /// Only the strings that were pending at publish time.
    PendingOnly,
    /// Nothing was retained.
    Omitted,
}

impl SnapshotFidelity {
    /// Stable label used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::WithoutColumns => "without_columns",
            Self::PendingOnly => "pending_only",
            Self::Omitted => "omitted",
        }
    }

    /// Parse a stored label. Unknown labels yield `None`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "full" => Some(Self::Full),
            "without_columns" => Some(Self::WithoutColumns),
            "pending_only" => Some(Self::PendingOnly),
            "omitted" => Some(Self::Omitted),
            _ => None,
        }
    }
}

/// Value copy of a string as it was when published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub id: StringId,
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StringStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_columns: Option<AdditionalColumns>,
}

impl SnapshotEntry {
    fn copy_of(item: &StringItem, keep_columns: bool) -> Self {
        Self {
            id: item.id,
            key: item.key.as_str().to_owned(),
            value: item.value.as_str().to_owned(),
            status: item.status,
            modified_at: item.modified_at,
            additional_columns: keep_columns.then(|| item.additional_columns.clone()),
        }
    }
}

/// Snapshot of an app's string table at publish time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub fidelity: SnapshotFidelity,
    pub strings: Vec<SnapshotEntry>,
}

impl VersionSnapshot {
    /// Every string with all columns.
    #[must_use]
    pub fn full(strings: &[StringItem]) -> Self {
        Self {
            fidelity: SnapshotFidelity::Full,
            strings: strings
                .iter()
                .map(|item| SnapshotEntry::copy_of(item, true))
                .collect(),
        }
    }

    /// Every string without additional columns.
    #[must_use]
    pub fn without_columns(strings: &[StringItem]) -> Self {
        Self {
            fidelity: SnapshotFidelity::WithoutColumns,
            strings: strings
                .iter()
                .map(|item| SnapshotEntry::copy_of(item, false))
                .collect(),
        }
    }

    /// Only pending strings, without additional columns.
    #[must_use]
    pub fn pending_only(strings: &[StringItem]) -> Self {
        Self {
            fidelity: SnapshotFidelity::PendingOnly,
            strings: strings
                .iter()
                .filter(|item| item.is_pending())
                .map(|item| SnapshotEntry::copy_of(item, false))
                .collect(),
        }
    }

    /// A snapshot that retained nothing.
    #[must_use]
    pub const fn omitted() -> Self {
        Self {
            fidelity: SnapshotFidelity::Omitted,
            strings: Vec::new(),
        }
    }

    /// Same fidelity with the entries stripped, for records whose entries
    /// live elsewhere.
    #[must_use]
    pub const fn header(&self) -> Self {
        Self {
            fidelity: self.fidelity,
            strings: Vec::new(),
        }
    }
}

/// An immutable published version of an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: VersionId,
    pub app_id: AppId,
    pub version_number: i64,
    pub publisher_id: Option<UserId>,
    pub publisher_name: Option<String>,
    pub notes: Option<String>,
    pub snapshot: VersionSnapshot,
    pub notifications: Vec<Notification>,
    pub published_at: DateTime<Utc>,
}

/// A version ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
    pub app_id: AppId,
    pub version_number: i64,
    pub publisher_id: Option<UserId>,
    pub publisher_name: Option<String>,
    pub notes: Option<String>,
    pub snapshot: VersionSnapshot,
    pub notifications: Vec<Notification>,
    pub published_at: DateTime<Utc>,
}

impl NewVersion {
    /// Attach the identifier assigned by the store.
    #[must_use]
    pub fn with_id(self, id: VersionId) -> Version {
        Version {
            id,
            app_id: self.app_id,
            version_number: self.version_number,
            publisher_id: self.publisher_id,
            publisher_name: self.publisher_name,
            notes: self.notes,
            snapshot: self.snapshot,
            notifications: self.notifications,
            published_at: self.published_at,
        }
    }
}

/// A pending marker as the publisher read it.
///
/// Stores clear the marker only while the string still carries the same
/// `modified_at`. An edit that lands after the read bumps the timestamp, so
/// its marker survives for the next publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMarker {
    pub string_id: StringId,
    pub modified_at: Option<DateTime<Utc>>,
}

impl PendingMarker {
    /// Marker for a string as currently read.
    #[must_use]
    pub const fn of(item: &StringItem) -> Self {
        Self {
            string_id: item.id,
            modified_at: item.modified_at,
        }
    }

    /// Whether `item` is still the string this marker was read from.
    #[must_use]
    pub fn still_matches(&self, item: &StringItem) -> bool {
        item.id == self.string_id && item.is_pending() && item.modified_at == self.modified_at
    }
}

/// Everything a store must write atomically to complete a publish.
///
/// The store inserts `version`, advances the app's counter from
/// `expected_current_version` to `version.version_number + 1`, and clears
/// each entry of `pending` whose string has not been edited since it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub version: NewVersion,
    pub expected_current_version: i64,
    pub pending: Vec<PendingMarker>,
}

impl Publication {
    /// Counter value the app holds after the publish commits.
    #[must_use]
    pub const fn next_current_version(&self) -> i64 {
        self.version.version_number.saturating_add(1)
    }
}

/// Result of attempting to commit a [`Publication`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationOutcome {
    /// All writes were applied.
    Committed(Version),
    /// The app no longer exists. Nothing was written.
    AppMissing,
    /// Another publish moved the counter first. Nothing was written.
    VersionMoved { actual: i64 },
}

//! Translatable strings and their pending-change marker.
//!
//! A string carries a status only while it has changes that have not been
//! published. The status moves through a small state machine:
//!
//! ```text
//! (absent) --create--> new
//! (absent) --edit----> modified
//! new      --edit----> new
//! modified --edit----> modified
//! new | modified --publish or reset--> (absent)
//! ```
//!
//! `status` and `modified_at` are only ever cleared together, by
//! [`StringItem::clear_pending`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AppId, StringId, StringKey, StringValue, UserId};

/// Extra columns of a string row, keyed by column name.
pub type AdditionalColumns = BTreeMap<String, String>;

/// Uncommitted-change marker on a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringStatus {
    New,
    Modified,
}

impl StringStatus {
    /// Stable lowercase label used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Modified => "modified",
        }
    }

    /// Parse a stored label. Unknown labels yield `None`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "new" => Some(Self::New),
            "modified" => Some(Self::Modified),
            _ => None,
        }
    }

    /// Status after an edit, given the status before it.
    #[must_use]
    pub const fn after_edit(current: Option<Self>) -> Self {
        match current {
            Some(Self::New) => Self::New,
            Some(Self::Modified) | None => Self::Modified,
        }
    }
}

impl fmt::Display for StringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row in an app's string table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringItem {
    pub id: StringId,
    pub app_id: AppId,
    pub key: StringKey,
    pub value: StringValue,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_columns: AdditionalColumns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StringStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl StringItem {
    /// Whether the item has unpublished changes.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.status.is_some()
    }

    /// Drop the pending marker. Status and timestamp go together.
    pub fn clear_pending(&mut self) {
        self.status = None;
        self.modified_at = None;
    }
}

/// Data required to create a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStringItem {
    pub app_id: AppId,
    pub key: StringKey,
    pub value: StringValue,
    pub additional_columns: AdditionalColumns,
    pub status: Option<StringStatus>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<UserId>,
}

impl NewStringItem {
    /// A freshly authored string, pending as [`StringStatus::New`].
    #[must_use]
    pub const fn draft(
        app_id: AppId,
        key: StringKey,
        value: StringValue,
        additional_columns: AdditionalColumns,
        author: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            app_id,
            key,
            value,
            additional_columns,
            status: Some(StringStatus::New),
            modified_at: Some(now),
            modified_by: Some(author),
        }
    }

    /// A string that is already part of the published baseline.
    #[must_use]
    pub const fn published(
        app_id: AppId,
        key: StringKey,
        value: StringValue,
        additional_columns: AdditionalColumns,
    ) -> Self {
        Self {
            app_id,
            key,
            value,
            additional_columns,
            status: None,
            modified_at: None,
            modified_by: None,
        }
    }
}

/// Changes requested by an editor. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringEdit {
    pub key: Option<StringKey>,
    pub value: Option<StringValue>,
    pub additional_columns: Option<AdditionalColumns>,
}

/// Fully resolved update handed to the record store.
///
/// Produced from a [`StringEdit`] by [`StringEdit::into_patch`], which applies
/// the status state machine so every backend stores the same transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringPatch {
    pub key: Option<StringKey>,
    pub value: Option<StringValue>,
    pub additional_columns: Option<AdditionalColumns>,
    pub status: StringStatus,
    pub modified_at: DateTime<Utc>,
    pub modified_by: UserId,
}

impl StringEdit {
    /// Resolve the edit against the item's current status.
    #[must_use]
    pub fn into_patch(
        self,
        current: Option<StringStatus>,
        editor: UserId,
        now: DateTime<Utc>,
    ) -> StringPatch {
        StringPatch {
            key: self.key,
            value: self.value,
            additional_columns: self.additional_columns,
            status: StringStatus::after_edit(current),
            modified_at: now,
            modified_by: editor,
        }
    }
}

impl StringPatch {
    /// Apply the patch to a stored item.
    pub fn apply(self, item: &mut StringItem) {
        if let Some(key) = self.key {
            item.key = key;
        }
        if let Some(value) = self.value {
            item.value = value;
        }
        if let Some(columns) = self.additional_columns {
            item.additional_columns = columns;
        }
        item.status = Some(self.status);
        item.modified_at = Some(self.modified_at);
        item.modified_by = Some(self.modified_by);
    }
}

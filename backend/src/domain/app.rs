//! Apps hold a string table and a publish counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AppId, AppName, ProjectId};

/// Version number a freshly created app publishes first.
pub const INITIAL_VERSION: i64 = 1;

/// Column layout of an app's string table.
///
/// `key_column` and `value_column` name the columns that map onto
/// [`crate::domain::StringItem::key`] and [`crate::domain::StringItem::value`];
/// every other column lives in the item's additional columns map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    pub columns: Option<Vec<String>>,
    pub key_column: Option<String>,
    pub value_column: Option<String>,
}

/// An app within a project.
///
/// ## Invariants
/// - `current_version` starts at [`INITIAL_VERSION`] and only ever moves
///   forward, by publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: AppId,
    pub project_id: ProjectId,
    pub name: AppName,
    pub current_version: i64,
    #[serde(flatten)]
    pub layout: ColumnLayout,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Path-style address of an app: the app and the project it must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppScope {
    pub project_id: ProjectId,
    pub app_id: AppId,
}

impl AppScope {
    /// Address `app_id` under `project_id`.
    #[must_use]
    pub const fn new(project_id: ProjectId, app_id: AppId) -> Self {
        Self { project_id, app_id }
    }
}

/// Data required to create an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApp {
    pub project_id: ProjectId,
    pub name: AppName,
    pub layout: ColumnLayout,
}

/// Mutable app fields. The version counter is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppPatch {
    pub name: Option<AppName>,
    pub columns: Option<Vec<String>>,
    pub key_column: Option<String>,
    pub value_column: Option<String>,
}

impl AppPatch {
    /// Apply the patch to a stored app, bumping `updated_at`.
    pub fn apply(self, app: &mut App, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            app.name = name;
        }
        if let Some(columns) = self.columns {
            app.layout.columns = Some(columns);
        }
        if let Some(key_column) = self.key_column {
            app.layout.key_column = Some(key_column);
        }
        if let Some(value_column) = self.value_column {
            app.layout.value_column = Some(value_column);
        }
        app.updated_at = now;
    }
}

//! Internal Diesel row structs and their conversions to domain types.
//!
//! These types are implementation details of the persistence layer and never
//! leave it. Decoding validates through the domain constructors, so a row
//! that no longer satisfies them surfaces as a serialization error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::ports::RecordStoreError;
use crate::domain::{
    App, AppId, AppName, ColumnLayout, DisplayName, EmailAddress, Membership, Notification,
    Project, ProjectId, ProjectName, Role, StringId, StringItem, StringKey, StringStatus,
    StringValue, TextValidationError, User, UserId, Version, VersionId, VersionSnapshot,
};

use super::schema::{apps, project_members, projects, string_items, users, versions};

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, RecordStoreError> {
    serde_json::to_value(value).map_err(|err| RecordStoreError::serialization(err.to_string()))
}

fn from_json<T: DeserializeOwned>(
    value: Value,
    table: &str,
    id: i64,
) -> Result<T, RecordStoreError> {
    serde_json::from_value(value).map_err(|err| {
        RecordStoreError::serialization(format!("{table} row {id}: {err}"))
    })
}

fn checked<T>(
    value: Result<T, TextValidationError>,
    table: &str,
    id: i64,
) -> Result<T, RecordStoreError> {
    value.map_err(|err| RecordStoreError::serialization(format!("{table} row {id}: {err}")))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RecordStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id),
            email: checked(EmailAddress::new(&row.email), "users", row.id)?,
            name: checked(DisplayName::new(&row.name), "users", row.id)?,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub avatar_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `None` fields are left unchanged.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Projects and memberships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = RecordStoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProjectId::new(row.id),
            name: checked(ProjectName::new(&row.name), "projects", row.id)?,
            description: row.description,
            created_by: UserId::new(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = projects)]
pub(crate) struct NewProjectRow<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = projects)]
pub(crate) struct ProjectChangeset<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = project_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MembershipRow {
    pub project_id: i64,
    pub user_id: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = RecordStoreError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(|err| {
            RecordStoreError::serialization(format!(
                "project_members row ({}, {}): {err}",
                row.project_id, row.user_id
            ))
        })?;
        Ok(Self {
            project_id: ProjectId::new(row.project_id),
            user_id: UserId::new(row.user_id),
            role,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Apps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = apps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AppRow {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub current_version: i64,
    pub column_names: Option<Value>,
    pub key_column: Option<String>,
    pub value_column: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AppRow> for App {
    type Error = RecordStoreError;

    fn try_from(row: AppRow) -> Result<Self, Self::Error> {
        let columns = row
            .column_names
            .map(|value| from_json::<Vec<String>>(value, "apps", row.id))
            .transpose()?;
        Ok(Self {
            id: AppId::new(row.id),
            project_id: ProjectId::new(row.project_id),
            name: checked(AppName::new(&row.name), "apps", row.id)?,
            current_version: row.current_version,
            layout: ColumnLayout {
                columns,
                key_column: row.key_column,
                value_column: row.value_column,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = apps)]
pub(crate) struct NewAppRow<'a> {
    pub project_id: i64,
    pub name: &'a str,
    pub current_version: i64,
    pub column_names: Option<Value>,
    pub key_column: Option<&'a str>,
    pub value_column: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Never touches `current_version`.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = apps)]
pub(crate) struct AppChangeset<'a> {
    pub name: Option<&'a str>,
    pub column_names: Option<Value>,
    pub key_column: Option<&'a str>,
    pub value_column: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// String items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = string_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StringRow {
    pub id: i64,
    pub app_id: i64,
    pub key: String,
    pub value: String,
    pub additional_columns: Value,
    pub status: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<StringRow> for StringItem {
    type Error = RecordStoreError;

    fn try_from(row: StringRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .as_deref()
            .map(|label| {
                StringStatus::from_label(label).ok_or_else(|| {
                    RecordStoreError::serialization(format!(
                        "string_items row {}: unknown status {label}",
                        row.id
                    ))
                })
            })
            .transpose()?;
        Ok(Self {
            id: StringId::new(row.id),
            app_id: AppId::new(row.app_id),
            key: checked(StringKey::new(&row.key), "string_items", row.id)?,
            value: checked(StringValue::new(&row.value), "string_items", row.id)?,
            additional_columns: from_json(row.additional_columns, "string_items", row.id)?,
            status,
            modified_at: row.modified_at,
            modified_by: row.modified_by.map(UserId::new),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = string_items)]
pub(crate) struct NewStringRow<'a> {
    pub app_id: i64,
    pub key: &'a str,
    pub value: &'a str,
    pub additional_columns: Value,
    pub status: Option<&'static str>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// An edit always sets the pending marker and author.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = string_items)]
pub(crate) struct StringChangeset<'a> {
    pub key: Option<&'a str>,
    pub value: Option<&'a str>,
    pub additional_columns: Option<Value>,
    pub status: Option<&'static str>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<i64>,
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = versions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VersionRow {
    pub id: i64,
    pub app_id: i64,
    pub version_number: i64,
    pub publisher_id: Option<i64>,
    pub publisher_name: Option<String>,
    pub notes: Option<String>,
    pub snapshot: Value,
    pub notifications: Value,
    pub published_at: DateTime<Utc>,
}

impl TryFrom<VersionRow> for Version {
    type Error = RecordStoreError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        let snapshot: VersionSnapshot = from_json(row.snapshot, "versions", row.id)?;
        let notifications: Vec<Notification> = from_json(row.notifications, "versions", row.id)?;
        Ok(Self {
            id: VersionId::new(row.id),
            app_id: AppId::new(row.app_id),
            version_number: row.version_number,
            publisher_id: row.publisher_id.map(UserId::new),
            publisher_name: row.publisher_name,
            notes: row.notes,
            snapshot,
            notifications,
            published_at: row.published_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = versions)]
pub(crate) struct NewVersionRow<'a> {
    pub app_id: i64,
    pub version_number: i64,
    pub publisher_id: Option<i64>,
    pub publisher_name: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub snapshot: Value,
    pub notifications: Value,
    pub published_at: DateTime<Utc>,
}

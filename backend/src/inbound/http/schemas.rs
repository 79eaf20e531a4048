//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the JSON shape of their domain types but live
//! in the inbound adapter layer where framework concerns belong.

#![expect(
    dead_code,
    reason = "Schema wrappers are used only for OpenAPI generation via utoipa"
)]

use std::collections::BTreeMap;

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No caller identity is available.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The caller's role is too low for this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// A concurrent change or uniqueness rule rejected the request.
    #[schema(rename = "conflict")]
    Conflict,
    /// The record store cannot be reached.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "name must not be empty")]
    message: String,
    /// Correlation identifier echoed in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::Project`].
#[derive(ToSchema)]
#[schema(as = Project, rename_all = "camelCase")]
pub struct ProjectSchema {
    #[schema(example = 1)]
    id: i64,
    #[schema(example = "Mobile client")]
    name: String,
    description: Option<String>,
    created_by: i64,
    created_at: String,
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::App`].
#[derive(ToSchema)]
#[schema(as = App, rename_all = "camelCase")]
pub struct AppSchema {
    id: i64,
    project_id: i64,
    #[schema(example = "iOS")]
    name: String,
    /// Next version number a publish will use.
    #[schema(example = 1)]
    current_version: i64,
    columns: Option<Vec<String>>,
    key_column: Option<String>,
    value_column: Option<String>,
    created_at: String,
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::Membership`].
#[derive(ToSchema)]
#[schema(as = Membership, rename_all = "camelCase")]
pub struct MembershipSchema {
    project_id: i64,
    user_id: i64,
    #[schema(example = "member")]
    role: String,
    created_at: String,
}

/// OpenAPI schema for [`crate::domain::ports::ProjectSummary`].
#[derive(ToSchema)]
#[schema(as = ProjectSummary, rename_all = "camelCase")]
pub struct ProjectSummarySchema {
    id: i64,
    name: String,
    description: Option<String>,
    created_by: i64,
    created_at: String,
    updated_at: String,
    apps: Vec<AppSchema>,
}

/// OpenAPI schema for [`crate::domain::ports::ProjectDetails`].
#[derive(ToSchema)]
#[schema(as = ProjectDetails, rename_all = "camelCase")]
pub struct ProjectDetailsSchema {
    id: i64,
    name: String,
    description: Option<String>,
    created_by: i64,
    created_at: String,
    updated_at: String,
    apps: Vec<AppSchema>,
    members: Vec<MembershipSchema>,
}

/// OpenAPI schema for [`crate::domain::StringItem`].
#[derive(ToSchema)]
#[schema(as = StringItem, rename_all = "camelCase")]
pub struct StringItemSchema {
    id: i64,
    app_id: i64,
    #[schema(example = "welcome_message")]
    key: String,
    #[schema(example = "Welcome!")]
    value: String,
    additional_columns: Option<BTreeMap<String, String>>,
    /// `new` or `modified` while unpublished; absent otherwise.
    #[schema(example = "modified")]
    status: Option<String>,
    modified_at: Option<String>,
    modified_by: Option<i64>,
    created_at: String,
}

/// OpenAPI schema for a page of [`crate::domain::StringItem`]s.
#[derive(ToSchema)]
#[schema(as = StringPage, rename_all = "camelCase")]
pub struct StringPageSchema {
    items: Vec<StringItemSchema>,
    total: u64,
    page: u32,
    limit: u32,
    total_pages: u64,
}

/// OpenAPI schema for [`crate::domain::PendingChange`].
#[derive(ToSchema)]
#[schema(as = PendingChange, rename_all = "camelCase")]
pub struct PendingChangeSchema {
    id: i64,
    #[schema(example = "New")]
    label: String,
    /// 1-based position in the full string table.
    positional_index: u64,
    key: String,
    modified_at: Option<String>,
}

/// OpenAPI schema for [`crate::domain::Notification`].
#[derive(ToSchema)]
#[schema(as = Notification, rename_all = "camelCase")]
pub struct NotificationSchema {
    #[schema(example = "12-1773480600000-0")]
    id: String,
    #[schema(example = "Modified")]
    status: String,
    string_number: i64,
    string_id: i64,
    modified_at: String,
}

/// OpenAPI schema for [`crate::domain::VersionSnapshot`].
#[derive(ToSchema)]
#[schema(as = VersionSnapshot, rename_all = "camelCase")]
pub struct VersionSnapshotSchema {
    /// `full`, `without_columns`, `pending_only` or `omitted`.
    #[schema(example = "full")]
    fidelity: String,
    strings: Vec<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::Version`].
#[derive(ToSchema)]
#[schema(as = Version, rename_all = "camelCase")]
pub struct VersionSchema {
    id: i64,
    app_id: i64,
    #[schema(example = 3)]
    version_number: i64,
    publisher_id: Option<i64>,
    publisher_name: Option<String>,
    notes: Option<String>,
    snapshot: VersionSnapshotSchema,
    notifications: Vec<NotificationSchema>,
    published_at: String,
}

//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (projects, apps,
//!   strings, versions, health)
//! - **Schemas**: wrappers from [`crate::inbound::http::schemas`] that
//!   describe domain types without coupling them to utoipa, plus the request
//!   bodies declared next to their handlers
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::apps::AppBody;
use crate::inbound::http::envelope::{Deleted, ResetSummary};
use crate::inbound::http::projects::{CreateProjectBody, SetMemberRoleBody, UpdateProjectBody};
use crate::inbound::http::schemas::{
    AppSchema, ErrorCodeSchema, ErrorSchema, MembershipSchema, NotificationSchema,
    PendingChangeSchema, ProjectDetailsSchema, ProjectSchema, ProjectSummarySchema,
    StringItemSchema, StringPageSchema, VersionSchema, VersionSnapshotSchema,
};
use crate::inbound::http::strings::{CreateStringBody, UpdateStringBody};
use crate::inbound::http::versions::PublishBody;
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "String manager API",
        description = "Manage localisation string tables and publish immutable versions.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::projects::list_projects,
        crate::inbound::http::projects::create_project,
        crate::inbound::http::projects::get_project,
        crate::inbound::http::projects::update_project,
        crate::inbound::http::projects::delete_project,
        crate::inbound::http::projects::set_member_role,
        crate::inbound::http::projects::remove_member,
        crate::inbound::http::apps::create_app,
        crate::inbound::http::apps::get_app,
        crate::inbound::http::apps::update_app,
        crate::inbound::http::apps::delete_app,
        crate::inbound::http::strings::list_strings,
        crate::inbound::http::strings::create_string,
        crate::inbound::http::strings::reset_pending,
        crate::inbound::http::strings::update_string,
        crate::inbound::http::strings::delete_string,
        crate::inbound::http::versions::pending_changes,
        crate::inbound::http::versions::list_versions,
        crate::inbound::http::versions::publish,
        crate::inbound::http::versions::get_version,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        ProjectSchema,
        AppSchema,
        MembershipSchema,
        ProjectSummarySchema,
        ProjectDetailsSchema,
        StringItemSchema,
        StringPageSchema,
        PendingChangeSchema,
        NotificationSchema,
        VersionSnapshotSchema,
        VersionSchema,
        Deleted,
        ResetSummary,
        CreateProjectBody,
        UpdateProjectBody,
        SetMemberRoleBody,
        AppBody,
        CreateStringBody,
        UpdateStringBody,
        PublishBody,
    )),
    tags(
        (name = "projects", description = "Projects and their membership"),
        (name = "apps", description = "Apps and their column layout"),
        (name = "strings", description = "String tables and pending markers"),
        (name = "versions", description = "Pending changes and published versions"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

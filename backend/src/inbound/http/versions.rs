//! Version publishing and history handlers.
//!
//! ```text
//! GET  /api/v1/projects/{projectId}/apps/{appId}/pending-changes
//! GET  /api/v1/projects/{projectId}/apps/{appId}/versions
//! POST /api/v1/projects/{projectId}/apps/{appId}/versions
//! GET  /api/v1/projects/{projectId}/apps/{appId}/versions/{versionId}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::PublishRequest;
use crate::domain::{AppScope, Caller, Error, VersionId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::Envelope;
use crate::inbound::http::schemas::{ErrorSchema, PendingChangeSchema, VersionSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{APP_ID, AppPath, FieldName, PROJECT_ID, parse_id};

const VERSION_ID: FieldName = FieldName::new("versionId");

/// Request body for `POST .../versions`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishBody {
    /// Explicit version number; must be at least the app's current counter.
    #[schema(example = 2)]
    pub version_number: Option<i64>,
    /// Name recorded on the version; defaults to the caller's display name.
    pub publisher_name: Option<String>,
    pub notes: Option<String>,
}

/// `.../versions/{versionId}` path parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VersionPath {
    project_id: String,
    app_id: String,
    version_id: String,
}

impl VersionPath {
    fn parse(&self) -> Result<(AppScope, VersionId), Error> {
        let scope = AppScope::new(
            parse_id(&self.project_id, PROJECT_ID)?,
            parse_id(&self.app_id, APP_ID)?,
        );
        Ok((scope, parse_id(&self.version_id, VERSION_ID)?))
    }
}

/// An empty body publishes with every default.
fn parse_publish_body(payload: &[u8]) -> Result<PublishBody, Error> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(PublishBody::default());
    }
    serde_json::from_slice(payload).map_err(|err| {
        Error::invalid_request("invalid body")
            .with_details(json!({ "source": "body", "reason": err.to_string() }))
    })
}

/// Unpublished changes of an app in table order. Requires viewer.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{projectId}/apps/{appId}/pending-changes",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id")
    ),
    responses(
        (status = 200, description = "Pending changes", body = Envelope<Vec<PendingChangeSchema>>),
        (status = 403, description = "Not a member", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema)
    ),
    tags = ["versions"],
    operation_id = "listPendingChanges"
)]
#[get("/projects/{projectId}/apps/{appId}/pending-changes")]
pub async fn pending_changes(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
) -> ApiResult<HttpResponse> {
    let changes = state
        .versions_query
        .pending_changes(caller, path.scope()?)
        .await?;
    Ok(Envelope::new(changes).ok())
}

/// Published versions of an app, oldest first. Requires viewer.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{projectId}/apps/{appId}/versions",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id")
    ),
    responses(
        (status = 200, description = "Versions", body = Envelope<Vec<VersionSchema>>),
        (status = 403, description = "Not a member", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema)
    ),
    tags = ["versions"],
    operation_id = "listVersions"
)]
#[get("/projects/{projectId}/apps/{appId}/versions")]
pub async fn list_versions(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
) -> ApiResult<HttpResponse> {
    let versions = state
        .versions_query
        .list_versions(caller, path.scope()?)
        .await?;
    Ok(Envelope::new(versions).ok())
}

/// Publish the app's current string table as a new version. Requires member.
///
/// Pending strings are recorded as notifications and their markers cleared
/// in the same write that advances the app's version counter.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{projectId}/apps/{appId}/versions",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id")
    ),
    request_body = PublishBody,
    responses(
        (status = 201, description = "Version published", body = Envelope<VersionSchema>),
        (status = 400, description = "Version number behind the app counter", body = ErrorSchema),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema),
        (status = 409, description = "Concurrent publish won", body = ErrorSchema)
    ),
    tags = ["versions"],
    operation_id = "publishVersion"
)]
#[post("/projects/{projectId}/apps/{appId}/versions")]
pub async fn publish(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
    payload: web::Bytes,
) -> ApiResult<HttpResponse> {
    let scope = path.scope()?;
    let PublishBody {
        version_number,
        publisher_name,
        notes,
    } = parse_publish_body(&payload)?;
    let version = state
        .versions
        .publish(PublishRequest {
            caller,
            scope,
            version_number,
            publisher_name,
            notes,
        })
        .await?;
    let message = format!(
        "published version {} with {} changes",
        version.version_number,
        version.notifications.len()
    );
    Ok(Envelope::new(version).with_message(message).created())
}

/// Fetch one version of an app. Requires viewer.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{projectId}/apps/{appId}/versions/{versionId}",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id"),
        ("versionId" = i64, Path, description = "Version id")
    ),
    responses(
        (status = 200, description = "Version", body = Envelope<VersionSchema>),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 403, description = "Not a member", body = ErrorSchema),
        (status = 404, description = "Unknown version or wrong app", body = ErrorSchema)
    ),
    tags = ["versions"],
    operation_id = "getVersion"
)]
#[get("/projects/{projectId}/apps/{appId}/versions/{versionId}")]
pub async fn get_version(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<VersionPath>,
) -> ApiResult<HttpResponse> {
    let (scope, version_id) = path.parse()?;
    let version = state
        .versions_query
        .get_version(caller, scope, version_id)
        .await?;
    Ok(Envelope::new(version).ok())
}

#[cfg(test)]
#[path = "versions_tests.rs"]
mod tests;

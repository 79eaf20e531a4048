//! App API handlers.
//!
//! ```text
//! POST   /api/v1/projects/{projectId}/apps
//! GET    /api/v1/projects/{projectId}/apps/{appId}
//! PUT    /api/v1/projects/{projectId}/apps/{appId}
//! DELETE /api/v1/projects/{projectId}/apps/{appId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreateAppRequest, UpdateAppRequest};
use crate::domain::{AppName, AppPatch, Caller, ColumnLayout};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::{Deleted, Envelope};
use crate::inbound::http::schemas::{AppSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    AppPath, FieldName, ProjectPath, optional_field, required_text,
};

const NAME: FieldName = FieldName::new("name");

/// Request body for creating or updating an app.
///
/// On update, absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppBody {
    #[schema(example = "iOS")]
    pub name: Option<String>,
    /// Ordered column headers of the string table.
    pub columns: Option<Vec<String>>,
    /// Column holding the string key.
    #[schema(example = "String ID (Key)")]
    pub key_column: Option<String>,
    /// Column holding the string value.
    #[schema(example = "Korean")]
    pub value_column: Option<String>,
}

/// Create an app in a project. Requires member.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{projectId}/apps",
    params(("projectId" = i64, Path, description = "Project id")),
    request_body = AppBody,
    responses(
        (status = 201, description = "App created", body = Envelope<AppSchema>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["apps"],
    operation_id = "createApp"
)]
#[post("/projects/{projectId}/apps")]
pub async fn create_app(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<ProjectPath>,
    payload: web::Json<AppBody>,
) -> ApiResult<HttpResponse> {
    let project_id = path.project_id()?;
    let AppBody {
        name,
        columns,
        key_column,
        value_column,
    } = payload.into_inner();
    let app = state
        .projects
        .create_app(CreateAppRequest {
            caller,
            project_id,
            name: required_text(name, NAME, AppName::new)?,
            layout: ColumnLayout {
                columns,
                key_column,
                value_column,
            },
        })
        .await?;
    Ok(Envelope::new(app).with_message("app created").created())
}

/// Fetch an app. Requires viewer.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{projectId}/apps/{appId}",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id")
    ),
    responses(
        (status = 200, description = "App", body = Envelope<AppSchema>),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 403, description = "Not a member", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema)
    ),
    tags = ["apps"],
    operation_id = "getApp"
)]
#[get("/projects/{projectId}/apps/{appId}")]
pub async fn get_app(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
) -> ApiResult<HttpResponse> {
    let app = state.projects_query.get_app(caller, path.scope()?).await?;
    Ok(Envelope::new(app).ok())
}

/// Rename an app or change its column layout. Requires member.
///
/// The version counter is not writable here; only publishing moves it.
#[utoipa::path(
    put,
    path = "/api/v1/projects/{projectId}/apps/{appId}",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id")
    ),
    request_body = AppBody,
    responses(
        (status = 200, description = "App updated", body = Envelope<AppSchema>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema)
    ),
    tags = ["apps"],
    operation_id = "updateApp"
)]
#[put("/projects/{projectId}/apps/{appId}")]
pub async fn update_app(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
    payload: web::Json<AppBody>,
) -> ApiResult<HttpResponse> {
    let scope = path.scope()?;
    let AppBody {
        name,
        columns,
        key_column,
        value_column,
    } = payload.into_inner();
    let patch = AppPatch {
        name: optional_field(name, AppName::new)?,
        columns,
        key_column,
        value_column,
    };
    let app = state
        .projects
        .update_app(UpdateAppRequest {
            caller,
            scope,
            patch,
        })
        .await?;
    Ok(Envelope::new(app).ok())
}

/// Delete an app. Requires admin; its strings and versions are left in place.
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{projectId}/apps/{appId}",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("appId" = i64, Path, description = "App id")
    ),
    responses(
        (status = 200, description = "App deleted", body = Envelope<Deleted>),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown app or wrong project", body = ErrorSchema)
    ),
    tags = ["apps"],
    operation_id = "deleteApp"
)]
#[delete("/projects/{projectId}/apps/{appId}")]
pub async fn delete_app(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<AppPath>,
) -> ApiResult<HttpResponse> {
    state.projects.delete_app(caller, path.scope()?).await?;
    Ok(Envelope::new(Deleted { deleted: true }).ok())
}

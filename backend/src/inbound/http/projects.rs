//! Project and membership API handlers.
//!
//! ```text
//! GET    /api/v1/projects
//! POST   /api/v1/projects
//! GET    /api/v1/projects/{projectId}
//! PUT    /api/v1/projects/{projectId}
//! DELETE /api/v1/projects/{projectId}
//! PUT    /api/v1/projects/{projectId}/members/{userId}
//! DELETE /api/v1/projects/{projectId}/members/{userId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreateProjectRequest, SetMemberRoleRequest, UpdateProjectRequest};
use crate::domain::{Caller, Error, ProjectId, ProjectName, ProjectPatch, Role, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::{Deleted, Envelope};
use crate::inbound::http::schemas::{
    ErrorSchema, MembershipSchema, ProjectDetailsSchema, ProjectSchema, ProjectSummarySchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, PROJECT_ID, ProjectPath, invalid_role_error, missing_field_error, optional_field,
    parse_id, required_text,
};

/// Request body for `POST /api/v1/projects`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectBody {
    #[schema(example = "Mobile client")]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for `PUT /api/v1/projects/{projectId}`.
///
/// Absent fields are left unchanged, as is a blank description.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for `PUT /api/v1/projects/{projectId}/members/{userId}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetMemberRoleBody {
    #[schema(example = "member")]
    pub role: Option<String>,
}

/// `/projects/{projectId}/members/{userId}` path parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MemberPath {
    project_id: String,
    user_id: String,
}

const NAME: FieldName = FieldName::new("name");
const ROLE: FieldName = FieldName::new("role");
const USER_ID: FieldName = FieldName::new("userId");

impl MemberPath {
    fn parse(&self) -> Result<(ProjectId, UserId), Error> {
        Ok((
            parse_id(&self.project_id, PROJECT_ID)?,
            parse_id(&self.user_id, USER_ID)?,
        ))
    }
}

fn parse_role(raw: Option<String>) -> Result<Role, Error> {
    let raw = raw.ok_or_else(|| missing_field_error(ROLE))?;
    raw.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| invalid_role_error(ROLE, &raw))
}

/// List the projects the caller belongs to, each with its apps.
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    responses(
        (status = 200, description = "Projects", body = Envelope<Vec<ProjectSummarySchema>>),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "listProjects"
)]
#[get("/projects")]
pub async fn list_projects(state: web::Data<HttpState>, caller: Caller) -> ApiResult<HttpResponse> {
    let projects = state.projects_query.list_projects(caller).await?;
    Ok(Envelope::new(projects).ok())
}

/// Create a project owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectBody,
    responses(
        (status = 201, description = "Project created", body = Envelope<ProjectSchema>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "createProject"
)]
#[post("/projects")]
pub async fn create_project(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<CreateProjectBody>,
) -> ApiResult<HttpResponse> {
    let CreateProjectBody { name, description } = payload.into_inner();
    let project = state
        .projects
        .create_project(CreateProjectRequest {
            caller,
            name: required_text(name, NAME, ProjectName::new)?,
            description,
        })
        .await?;
    Ok(Envelope::new(project).with_message("project created").created())
}

/// Fetch a project with its apps and members. Requires viewer.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{projectId}",
    params(("projectId" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = Envelope<ProjectDetailsSchema>),
        (status = 400, description = "Invalid project id", body = ErrorSchema),
        (status = 403, description = "Not a member", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "getProject"
)]
#[get("/projects/{projectId}")]
pub async fn get_project(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<ProjectPath>,
) -> ApiResult<HttpResponse> {
    let project_id = path.project_id()?;
    let details = state.projects_query.get_project(caller, project_id).await?;
    Ok(Envelope::new(details).ok())
}

/// Rename a project or change its description. Requires admin.
#[utoipa::path(
    put,
    path = "/api/v1/projects/{projectId}",
    params(("projectId" = i64, Path, description = "Project id")),
    request_body = UpdateProjectBody,
    responses(
        (status = 200, description = "Project updated", body = Envelope<ProjectSchema>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "updateProject"
)]
#[put("/projects/{projectId}")]
pub async fn update_project(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<ProjectPath>,
    payload: web::Json<UpdateProjectBody>,
) -> ApiResult<HttpResponse> {
    let project_id = path.project_id()?;
    let UpdateProjectBody { name, description } = payload.into_inner();
    let patch = ProjectPatch {
        name: optional_field(name, ProjectName::new)?,
        description,
    };
    let project = state
        .projects
        .update_project(UpdateProjectRequest {
            caller,
            project_id,
            patch,
        })
        .await?;
    Ok(Envelope::new(project).ok())
}

/// Delete a project. Requires owner; its apps are left in place.
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{projectId}",
    params(("projectId" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = Envelope<Deleted>),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "deleteProject"
)]
#[delete("/projects/{projectId}")]
pub async fn delete_project(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<ProjectPath>,
) -> ApiResult<HttpResponse> {
    let project_id = path.project_id()?;
    state.projects.delete_project(caller, project_id).await?;
    Ok(Envelope::new(Deleted { deleted: true }).ok())
}

/// Grant or change a member's role. Requires admin.
#[utoipa::path(
    put,
    path = "/api/v1/projects/{projectId}/members/{userId}",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("userId" = i64, Path, description = "User id")
    ),
    request_body = SetMemberRoleBody,
    responses(
        (status = 200, description = "Membership", body = Envelope<MembershipSchema>),
        (status = 400, description = "Invalid role", body = ErrorSchema),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown project or user", body = ErrorSchema),
        (status = 409, description = "Last owner demoted", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "setMemberRole"
)]
#[put("/projects/{projectId}/members/{userId}")]
pub async fn set_member_role(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<MemberPath>,
    payload: web::Json<SetMemberRoleBody>,
) -> ApiResult<HttpResponse> {
    let (project_id, user_id) = path.parse()?;
    let role = parse_role(payload.into_inner().role)?;
    let membership = state
        .projects
        .set_member_role(SetMemberRoleRequest {
            caller,
            project_id,
            user_id,
            role,
        })
        .await?;
    Ok(Envelope::new(membership).ok())
}

/// Remove a member. Requires admin; the last owner cannot be removed.
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{projectId}/members/{userId}",
    params(
        ("projectId" = i64, Path, description = "Project id"),
        ("userId" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Member removed", body = Envelope<Deleted>),
        (status = 403, description = "Insufficient role", body = ErrorSchema),
        (status = 404, description = "Unknown membership", body = ErrorSchema),
        (status = 409, description = "Last owner", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "removeMember"
)]
#[delete("/projects/{projectId}/members/{userId}")]
pub async fn remove_member(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<MemberPath>,
) -> ApiResult<HttpResponse> {
    let (project_id, user_id) = path.parse()?;
    state
        .projects
        .remove_member(caller, project_id, user_id)
        .await?;
    Ok(Envelope::new(Deleted { deleted: true }).ok())
}

#[cfg(test)]
#[path = "projects_tests.rs"]
mod tests;

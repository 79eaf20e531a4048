//! Driving port for project and app mutations.

use async_trait::async_trait;

use crate::domain::{
    App, AppId, AppName, AppPatch, AppScope, Caller, ColumnLayout, Error, Membership, Project,
    ProjectId, ProjectName, ProjectPatch, Role, UserId,
};

/// Request to create a project owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    pub caller: Caller,
    pub name: ProjectName,
    pub description: Option<String>,
}

/// Request to change a project's name or description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProjectRequest {
    pub caller: Caller,
    pub project_id: ProjectId,
    pub patch: ProjectPatch,
}

/// Request to grant or change a member's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMemberRoleRequest {
    pub caller: Caller,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: Role,
}

/// Request to create an app inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAppRequest {
    pub caller: Caller,
    pub project_id: ProjectId,
    pub name: AppName,
    pub layout: ColumnLayout,
}

/// Request to change an app's name or column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAppRequest {
    pub caller: Caller,
    pub scope: AppScope,
    pub patch: AppPatch,
}

/// Project and app use-cases that change state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectCommand: Send + Sync {
    /// Create a project; the caller becomes its owner.
    async fn create_project(&self, request: CreateProjectRequest) -> Result<Project, Error>;

    /// Update a project. Requires admin.
    async fn update_project(&self, request: UpdateProjectRequest) -> Result<Project, Error>;

    /// Delete a project. Requires owner.
    async fn delete_project(&self, caller: Caller, project_id: ProjectId) -> Result<(), Error>;

    /// Grant or change a member's role. Requires admin.
    async fn set_member_role(&self, request: SetMemberRoleRequest) -> Result<Membership, Error>;

    /// Remove a member. Requires admin.
    async fn remove_member(
        &self,
        caller: Caller,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<(), Error>;

    /// Create an app. Requires member.
    async fn create_app(&self, request: CreateAppRequest) -> Result<App, Error>;

    /// Update an app. Requires member.
    async fn update_app(&self, request: UpdateAppRequest) -> Result<App, Error>;

    /// Delete an app. Requires admin.
    async fn delete_app(&self, caller: Caller, scope: AppScope) -> Result<AppId, Error>;
}

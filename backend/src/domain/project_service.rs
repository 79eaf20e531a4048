//! Project, membership and app management.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    AppRepository, CreateAppRequest, CreateProjectRequest, MembershipRepository, ProjectCommand,
    ProjectDetails, ProjectQuery, ProjectRepository, ProjectSummary, SetMemberRoleRequest,
    UpdateAppRequest, UpdateProjectRequest, UserRepository,
};
use crate::domain::service_support::{found, map_store_error};
use crate::domain::{
    AccessGate, App, AppId, AppScope, Caller, Error, Membership, NewApp, NewProject, Project,
    ProjectId, Role, UserId, optional_text,
};

/// Service implementing the project driving ports.
pub struct ProjectService<P, A, M, U> {
    access: AccessGate<A, M>,
    projects: Arc<P>,
    apps: Arc<A>,
    memberships: Arc<M>,
    users: Arc<U>,
}

impl<P, A, M, U> ProjectService<P, A, M, U> {
    /// Create the service over its repositories.
    pub fn new(projects: Arc<P>, apps: Arc<A>, memberships: Arc<M>, users: Arc<U>) -> Self {
        Self {
            access: AccessGate::new(Arc::clone(&apps), Arc::clone(&memberships)),
            projects,
            apps,
            memberships,
            users,
        }
    }
}

fn trimmed_columns(columns: Option<Vec<String>>) -> Option<Vec<String>> {
    columns.map(|columns| {
        columns
            .iter()
            .filter_map(|column| optional_text(Some(column)))
            .collect()
    })
}

impl<P, A, M, U> ProjectService<P, A, M, U>
where
    P: ProjectRepository,
    A: AppRepository,
    M: MembershipRepository,
    U: UserRepository,
{
    async fn load_project(&self, project_id: ProjectId) -> Result<Project, Error> {
        found(
            self.projects
                .find_project(project_id)
                .await
                .map_err(map_store_error)?,
            "project",
            project_id,
        )
    }

    async fn list_apps(&self, project_id: ProjectId) -> Result<Vec<App>, Error> {
        self.apps
            .list_apps(project_id)
            .await
            .map_err(map_store_error)
    }

    /// Reject changes that would leave the project without an owner.
    async fn ensure_other_owner(&self, project_id: ProjectId, user: UserId) -> Result<(), Error> {
        let memberships = self
            .memberships
            .list_memberships(project_id)
            .await
            .map_err(map_store_error)?;
        let remaining = memberships
            .iter()
            .filter(|m| m.role == Role::Owner && m.user_id != user)
            .count();
        if remaining == 0 {
            return Err(
                Error::conflict("a project must keep at least one owner").with_details(json!({
                    "projectId": project_id.get(),
                    "userId": user.get(),
                })),
            );
        }
        Ok(())
    }

    /// Owners may only be created, demoted or removed by owners.
    async fn require_role_change(
        &self,
        caller: &Caller,
        project_id: ProjectId,
        current: Option<&Membership>,
        requested: Option<Role>,
    ) -> Result<(), Error> {
        let touches_owner =
            current.is_some_and(|m| m.role == Role::Owner) || requested == Some(Role::Owner);
        let minimum = if touches_owner { Role::Owner } else { Role::Admin };
        self.access
            .require_project(project_id, caller.user_id, minimum)
            .await
    }
}

#[async_trait]
impl<P, A, M, U> ProjectCommand for ProjectService<P, A, M, U>
where
    P: ProjectRepository,
    A: AppRepository,
    M: MembershipRepository,
    U: UserRepository,
{
    async fn create_project(&self, request: CreateProjectRequest) -> Result<Project, Error> {
        let CreateProjectRequest {
            caller,
            name,
            description,
        } = request;
        let project = self
            .projects
            .create_project(NewProject {
                name,
                description: optional_text(description.as_deref()),
                created_by: caller.user_id,
            })
            .await
            .map_err(map_store_error)?;
        info!(project_id = %project.id, owner = %caller.user_id, "created project");
        Ok(project)
    }

    async fn update_project(&self, request: UpdateProjectRequest) -> Result<Project, Error> {
        let UpdateProjectRequest {
            caller,
            project_id,
            mut patch,
        } = request;
        self.access
            .require_project(project_id, caller.user_id, Role::Admin)
            .await?;
        patch.description = patch
            .description
            .and_then(|description| optional_text(Some(&description)));
        found(
            self.projects
                .update_project(project_id, patch)
                .await
                .map_err(map_store_error)?,
            "project",
            project_id,
        )
    }

    async fn delete_project(&self, caller: Caller, project_id: ProjectId) -> Result<(), Error> {
        self.access
            .require_project(project_id, caller.user_id, Role::Owner)
            .await?;
        let deleted = self
            .projects
            .delete_project(project_id)
            .await
            .map_err(map_store_error)?;
        if !deleted {
            return Err(Error::not_found(format!("project {project_id} not found")));
        }
        info!(project_id = %project_id, "deleted project");
        Ok(())
    }

    async fn set_member_role(&self, request: SetMemberRoleRequest) -> Result<Membership, Error> {
        let SetMemberRoleRequest {
            caller,
            project_id,
            user_id,
            role,
        } = request;
        let current = self
            .memberships
            .find_membership(project_id, user_id)
            .await
            .map_err(map_store_error)?;
        self.require_role_change(&caller, project_id, current.as_ref(), Some(role))
            .await?;
        self.load_project(project_id).await?;
        found(
            self.users
                .find_user(user_id)
                .await
                .map_err(map_store_error)?,
            "user",
            user_id,
        )?;
        if current.as_ref().is_some_and(|m| m.role == Role::Owner) && role != Role::Owner {
            self.ensure_other_owner(project_id, user_id).await?;
        }
        let membership = self
            .memberships
            .upsert_membership(project_id, user_id, role)
            .await
            .map_err(map_store_error)?;
        info!(
            project_id = %project_id,
            user_id = %user_id,
            role = role.as_str(),
            "set member role"
        );
        Ok(membership)
    }

    async fn remove_member(
        &self,
        caller: Caller,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<(), Error> {
        let current = self
            .memberships
            .find_membership(project_id, user_id)
            .await
            .map_err(map_store_error)?;
        self.require_role_change(&caller, project_id, current.as_ref(), None)
            .await?;
        let Some(current) = current else {
            return Err(Error::not_found(format!(
                "user {user_id} is not a member of project {project_id}"
            )));
        };
        if current.role == Role::Owner {
            self.ensure_other_owner(project_id, user_id).await?;
        }
        self.memberships
            .remove_membership(project_id, user_id)
            .await
            .map_err(map_store_error)?;
        info!(project_id = %project_id, user_id = %user_id, "removed member");
        Ok(())
    }

    async fn create_app(&self, request: CreateAppRequest) -> Result<App, Error> {
        let CreateAppRequest {
            caller,
            project_id,
            name,
            mut layout,
        } = request;
        self.access
            .require_project(project_id, caller.user_id, Role::Member)
            .await?;
        self.load_project(project_id).await?;
        layout.columns = trimmed_columns(layout.columns);
        layout.key_column = optional_text(layout.key_column.as_deref());
        layout.value_column = optional_text(layout.value_column.as_deref());
        let app = self
            .apps
            .create_app(NewApp {
                project_id,
                name,
                layout,
            })
            .await
            .map_err(map_store_error)?;
        info!(project_id = %project_id, app_id = %app.id, "created app");
        Ok(app)
    }

    async fn update_app(&self, request: UpdateAppRequest) -> Result<App, Error> {
        let UpdateAppRequest {
            caller,
            scope,
            mut patch,
        } = request;
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Member)
            .await?;
        patch.columns = trimmed_columns(patch.columns);
        patch.key_column = patch
            .key_column
            .and_then(|column| optional_text(Some(&column)));
        patch.value_column = patch
            .value_column
            .and_then(|column| optional_text(Some(&column)));
        found(
            self.apps
                .update_app(app.id, patch)
                .await
                .map_err(map_store_error)?,
            "app",
            app.id,
        )
    }

    async fn delete_app(&self, caller: Caller, scope: AppScope) -> Result<AppId, Error> {
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Admin)
            .await?;
        let deleted = self
            .apps
            .delete_app(app.id)
            .await
            .map_err(map_store_error)?;
        if !deleted {
            return Err(Error::not_found(format!("app {} not found", app.id)));
        }
        info!(project_id = %scope.project_id, app_id = %app.id, "deleted app");
        Ok(app.id)
    }
}

#[async_trait]
impl<P, A, M, U> ProjectQuery for ProjectService<P, A, M, U>
where
    P: ProjectRepository,
    A: AppRepository,
    M: MembershipRepository,
    U: UserRepository,
{
    async fn list_projects(&self, caller: Caller) -> Result<Vec<ProjectSummary>, Error> {
        let projects = self
            .projects
            .list_projects_for_user(caller.user_id)
            .await
            .map_err(map_store_error)?;
        let mut summaries = Vec::with_capacity(projects.len());
        for project in projects {
            let apps = self.list_apps(project.id).await?;
            summaries.push(ProjectSummary { project, apps });
        }
        Ok(summaries)
    }

    async fn get_project(
        &self,
        caller: Caller,
        project_id: ProjectId,
    ) -> Result<ProjectDetails, Error> {
        self.access
            .require_project(project_id, caller.user_id, Role::Viewer)
            .await?;
        let project = self.load_project(project_id).await?;
        let apps = self.list_apps(project_id).await?;
        let members = self
            .memberships
            .list_memberships(project_id)
            .await
            .map_err(map_store_error)?;
        Ok(ProjectDetails {
            project,
            apps,
            members,
        })
    }

    async fn get_app(&self, caller: Caller, scope: AppScope) -> Result<App, Error> {
        self.access
            .require_app(scope, caller.user_id, Role::Viewer)
            .await
    }
}

#[cfg(test)]
#[path = "project_service_tests.rs"]
mod tests;

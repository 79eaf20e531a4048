//! Access control gate.
//!
//! Every resource resolves to its owning project; apps resolve through their
//! parent project. A caller is granted an operation when their membership
//! role in that project is at least the operation's minimum role. No
//! membership means no access.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::domain::ports::{AppRepository, MembershipRepository};
use crate::domain::service_support::{found, map_store_error};
use crate::domain::{App, AppId, AppScope, Error, ProjectId, Role, UserId};

/// Role-hierarchy access checks over the membership table.
pub struct AccessGate<A, M> {
    apps: Arc<A>,
    memberships: Arc<M>,
}

impl<A, M> Clone for AccessGate<A, M> {
    fn clone(&self) -> Self {
        Self {
            apps: Arc::clone(&self.apps),
            memberships: Arc::clone(&self.memberships),
        }
    }
}

impl<A, M> AccessGate<A, M> {
    /// Create a gate reading apps and memberships from the given ports.
    pub const fn new(apps: Arc<A>, memberships: Arc<M>) -> Self {
        Self { apps, memberships }
    }
}

fn access_denied(project: ProjectId, minimum: Role) -> Error {
    Error::forbidden("access denied").with_details(json!({
        "projectId": project.get(),
        "requiredRole": minimum.as_str(),
    }))
}

impl<A, M> AccessGate<A, M>
where
    A: AppRepository,
    M: MembershipRepository,
{
    /// The caller's role in a project, if they are a member.
    pub async fn role_in(&self, project: ProjectId, user: UserId) -> Result<Option<Role>, Error> {
        let membership = self
            .memberships
            .find_membership(project, user)
            .await
            .map_err(map_store_error)?;
        Ok(membership.map(|m| m.role))
    }

    /// Whether `user` holds at least `minimum` in `project`.
    pub async fn has_project_access(
        &self,
        project: ProjectId,
        user: UserId,
        minimum: Role,
    ) -> Result<bool, Error> {
        let granted = self
            .role_in(project, user)
            .await?
            .is_some_and(|role| role.satisfies(minimum));
        debug!(
            project_id = %project,
            user_id = %user,
            minimum = minimum.as_str(),
            granted,
            "project access check"
        );
        Ok(granted)
    }

    /// Whether `user` holds at least `minimum` on the project owning `app`.
    ///
    /// A missing app grants nothing.
    pub async fn has_app_access(
        &self,
        app: AppId,
        user: UserId,
        minimum: Role,
    ) -> Result<bool, Error> {
        let Some(record) = self.apps.find_app(app).await.map_err(map_store_error)? else {
            return Ok(false);
        };
        self.has_project_access(record.project_id, user, minimum).await
    }

    /// Fail with `forbidden` unless `user` holds at least `minimum` in `project`.
    pub async fn require_project(
        &self,
        project: ProjectId,
        user: UserId,
        minimum: Role,
    ) -> Result<(), Error> {
        if self.has_project_access(project, user, minimum).await? {
            Ok(())
        } else {
            Err(access_denied(project, minimum))
        }
    }

    /// Check access on the scope's project, then load the app and confirm it
    /// belongs there.
    pub async fn require_app(
        &self,
        scope: AppScope,
        user: UserId,
        minimum: Role,
    ) -> Result<App, Error> {
        self.require_project(scope.project_id, user, minimum).await?;
        let app = found(
            self.apps
                .find_app(scope.app_id)
                .await
                .map_err(map_store_error)?,
            "app",
            scope.app_id,
        )?;
        if app.project_id != scope.project_id {
            return Err(Error::not_found(format!("app {} not found", scope.app_id)));
        }
        Ok(app)
    }
}

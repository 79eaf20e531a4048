//! Port for project persistence.

use async_trait::async_trait;

use crate::domain::{NewProject, Project, ProjectId, ProjectPatch, UserId};

use super::RecordStoreError;

/// Storage for projects.
///
/// Listings are ordered by ascending id, which is creation order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Create a project and its creator's owner membership in one write.
    async fn create_project(&self, project: NewProject) -> Result<Project, RecordStoreError>;

    /// Fetch a project by id.
    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, RecordStoreError>;

    /// Projects in which `user` holds any membership.
    async fn list_projects_for_user(&self, user: UserId)
    -> Result<Vec<Project>, RecordStoreError>;

    /// Merge the provided fields into a stored project.
    async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, RecordStoreError>;

    /// Delete a project row. Apps and memberships are left in place.
    async fn delete_project(&self, id: ProjectId) -> Result<bool, RecordStoreError>;
}

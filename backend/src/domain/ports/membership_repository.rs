//! Port for project membership persistence.

use async_trait::async_trait;

use crate::domain::{Membership, ProjectId, Role, UserId};

use super::RecordStoreError;

/// Storage for the (project, user) → role table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Insert or replace the role of `user` in `project`.
    async fn upsert_membership(
        &self,
        project: ProjectId,
        user: UserId,
        role: Role,
    ) -> Result<Membership, RecordStoreError>;

    /// Fetch the membership row for a pair.
    async fn find_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<Option<Membership>, RecordStoreError>;

    /// All members of a project, ordered by user id.
    async fn list_memberships(
        &self,
        project: ProjectId,
    ) -> Result<Vec<Membership>, RecordStoreError>;

    /// Remove the membership row for a pair.
    async fn remove_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<bool, RecordStoreError>;
}

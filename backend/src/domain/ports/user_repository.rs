//! Port for user persistence.

use async_trait::async_trait;

use crate::domain::{EmailAddress, NewUser, User, UserId, UserPatch};

use super::RecordStoreError;

/// Storage for user identity records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a user. A duplicate email yields [`RecordStoreError::Conflict`].
    async fn create_user(&self, user: NewUser) -> Result<User, RecordStoreError>;

    /// Fetch a user by id.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RecordStoreError>;

    /// Fetch a user by normalised email address.
    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, RecordStoreError>;

    /// Merge the provided fields into a stored user.
    async fn update_user(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> Result<Option<User>, RecordStoreError>;

    /// Number of registered users.
    async fn count_users(&self) -> Result<u64, RecordStoreError>;
}

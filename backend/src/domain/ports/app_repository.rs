//! Port for app persistence.

use async_trait::async_trait;

use crate::domain::{App, AppId, AppPatch, NewApp, ProjectId};

use super::RecordStoreError;

/// Storage for apps.
///
/// The version counter is only written by
/// [`super::VersionRepository::commit_publication`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Create an app with its counter at [`crate::domain::INITIAL_VERSION`].
    async fn create_app(&self, app: NewApp) -> Result<App, RecordStoreError>;

    /// Fetch an app by id.
    async fn find_app(&self, id: AppId) -> Result<Option<App>, RecordStoreError>;

    /// Apps of a project in ascending id order.
    async fn list_apps(&self, project: ProjectId) -> Result<Vec<App>, RecordStoreError>;

    /// Merge the provided fields into a stored app.
    async fn update_app(&self, id: AppId, patch: AppPatch)
    -> Result<Option<App>, RecordStoreError>;

    /// Delete an app row. Strings and versions are left in place.
    async fn delete_app(&self, id: AppId) -> Result<bool, RecordStoreError>;
}

//! Port for string table persistence.

use async_trait::async_trait;

use crate::domain::{AppId, NewStringItem, Page, PageRequest, StringId, StringItem, StringPatch};

use super::RecordStoreError;

/// Storage for the strings of each app.
///
/// Strings are ordered by ascending id. The pending-change view depends on
/// that order being stable, so every backend must honour it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StringItemRepository: Send + Sync {
    /// Insert a string.
    async fn create_string(&self, item: NewStringItem) -> Result<StringItem, RecordStoreError>;

    /// Fetch a string by id.
    async fn find_string(&self, id: StringId) -> Result<Option<StringItem>, RecordStoreError>;

    /// One page of an app's strings plus the total count.
    async fn list_strings(
        &self,
        app: AppId,
        page: PageRequest,
    ) -> Result<Page<StringItem>, RecordStoreError>;

    /// Every string of an app, unpaginated.
    async fn list_all_strings(&self, app: AppId) -> Result<Vec<StringItem>, RecordStoreError>;

    /// Apply a resolved edit to a stored string.
    async fn update_string(
        &self,
        id: StringId,
        patch: StringPatch,
    ) -> Result<Option<StringItem>, RecordStoreError>;

    /// Clear the pending marker of every string in an app, returning how many
    /// were pending.
    async fn reset_pending(&self, app: AppId) -> Result<u64, RecordStoreError>;

    /// Delete a string.
    async fn delete_string(&self, id: StringId) -> Result<bool, RecordStoreError>;
}

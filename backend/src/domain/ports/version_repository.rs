//! Port for published versions.

use async_trait::async_trait;

use crate::domain::{AppId, Publication, PublicationOutcome, Version, VersionId};

use super::RecordStoreError;

/// Storage for versions and the publish transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Fetch a version by id.
    async fn find_version(&self, id: VersionId) -> Result<Option<Version>, RecordStoreError>;

    /// Versions of an app in ascending version-number order.
    async fn list_versions(&self, app: AppId) -> Result<Vec<Version>, RecordStoreError>;

    /// Commit a publish atomically.
    ///
    /// Implementations must insert the version, move the app counter from
    /// `expected_current_version` to `version_number + 1`, and clear the
    /// pending marker of each listed string, all or nothing. When the app is
    /// missing or its counter no longer matches, nothing is written and the
    /// outcome says why.
    async fn commit_publication(
        &self,
        publication: Publication,
    ) -> Result<PublicationOutcome, RecordStoreError>;
}

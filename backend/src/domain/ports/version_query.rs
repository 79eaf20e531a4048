//! Driving port for version history and pending changes.

use async_trait::async_trait;

use crate::domain::{AppScope, Caller, Error, PendingChange, Version, VersionId};

/// Version read use-cases. All require viewer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionQuery: Send + Sync {
    /// Versions of an app in ascending version-number order.
    async fn list_versions(&self, caller: Caller, scope: AppScope) -> Result<Vec<Version>, Error>;

    /// One version of an app.
    async fn get_version(
        &self,
        caller: Caller,
        scope: AppScope,
        version_id: VersionId,
    ) -> Result<Version, Error>;

    /// Unpublished changes of an app, derived from the current string table.
    async fn pending_changes(
        &self,
        caller: Caller,
        scope: AppScope,
    ) -> Result<Vec<PendingChange>, Error>;
}

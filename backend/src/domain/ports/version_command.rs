//! Driving port for publishing versions.

use async_trait::async_trait;

use crate::domain::{AppScope, Caller, Error, Version};

/// Request to publish the current string table of an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub caller: Caller,
    pub scope: AppScope,
    /// Explicit version number. Defaults to the app's current counter.
    pub version_number: Option<i64>,
    /// Display name recorded on the version. Defaults to the caller's name.
    pub publisher_name: Option<String>,
    pub notes: Option<String>,
}

/// Publishing use-case. Requires member.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionCommand: Send + Sync {
    /// Snapshot the app, record its pending changes, advance its counter and
    /// clear the pending markers.
    async fn publish(&self, request: PublishRequest) -> Result<Version, Error>;
}

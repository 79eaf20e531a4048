//! Version publishing and history.
//!
//! Publishing turns the working string table into an immutable [`Version`]:
//!
//! 1. Take the app's publish lock and check the caller is at least a member.
//! 2. Load the app and its full string table.
//! 3. Choose the version number: explicit (never behind the counter) or the
//!    app's current counter.
//! 4. Derive notifications from the pending subset.
//! 5. Build the snapshot according to the [`SnapshotPolicy`].
//! 6. Commit version, counter bump and pending reset in one store write.
//!    Strings edited after step 2 keep their marker.
//! 7. Under the constrained policy, archive the snapshot entries.
//!
//! Nothing is written when any step up to 6 fails. Archiving is best effort:
//! a full archive degrades the snapshot, never the publish.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    AppRepository, MembershipRepository, PublishRequest, SnapshotKey, StringItemRepository,
    VersionCommand, VersionQuery, VersionRepository,
};
use crate::domain::service_support::{found, map_store_error};
use crate::domain::{
    AccessGate, App, AppLocks, AppScope, Caller, Error, NewVersion, PendingChange, PendingMarker,
    Publication, PublicationOutcome, Role, SnapshotPolicy, StringItem, Version, VersionId,
    VersionSnapshot, notifications, optional_text, pending_changes,
};

/// Service implementing the version driving ports.
pub struct VersionService<A, S, V, M> {
    access: AccessGate<A, M>,
    strings: Arc<S>,
    versions: Arc<V>,
    policy: SnapshotPolicy,
    locks: AppLocks,
    clock: Arc<dyn Clock>,
}

impl<A, S, V, M> VersionService<A, S, V, M> {
    /// Create the service over its repositories.
    pub fn new(
        apps: Arc<A>,
        strings: Arc<S>,
        versions: Arc<V>,
        memberships: Arc<M>,
        policy: SnapshotPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            access: AccessGate::new(apps, memberships),
            strings,
            versions,
            policy,
            locks: AppLocks::new(),
            clock,
        }
    }
}

fn next_version_number(app: &App, requested: Option<i64>) -> Result<i64, Error> {
    let Some(number) = requested else {
        return Ok(app.current_version);
    };
    if number < 1 || number < app.current_version {
        return Err(Error::invalid_request(
            "version number must be at least 1 and not behind the app's current version",
        )
        .with_details(json!({
            "field": "versionNumber",
            "requested": number,
            "currentVersion": app.current_version,
        })));
    }
    Ok(number)
}

impl<A, S, V, M> VersionService<A, S, V, M>
where
    A: AppRepository,
    S: StringItemRepository,
    V: VersionRepository,
    M: MembershipRepository,
{
    fn record_snapshot(&self, strings: &[StringItem]) -> VersionSnapshot {
        match &self.policy {
            SnapshotPolicy::Full => VersionSnapshot::full(strings),
            SnapshotPolicy::Constrained(constrained) => constrained.plan(strings),
        }
    }

    async fn hydrate(&self, mut version: Version) -> Version {
        if let SnapshotPolicy::Constrained(constrained) = &self.policy {
            let key = SnapshotKey {
                app_id: version.app_id,
                version_number: version.version_number,
            };
            version.snapshot = constrained.hydrate(key, version.snapshot).await;
        }
        version
    }

    async fn publish_locked(&self, request: PublishRequest) -> Result<Version, Error> {
        let PublishRequest {
            caller,
            scope,
            version_number,
            publisher_name,
            notes,
        } = request;

        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Member)
            .await?;
        let strings = self
            .strings
            .list_all_strings(app.id)
            .await
            .map_err(map_store_error)?;
        let number = next_version_number(&app, version_number)?;
        let published_at = self.clock.utc();

        let planned = self.record_snapshot(&strings);
        let stored = match &self.policy {
            SnapshotPolicy::Full => planned.clone(),
            SnapshotPolicy::Constrained(_) => planned.header(),
        };
        let publication = Publication {
            version: NewVersion {
                app_id: app.id,
                version_number: number,
                publisher_id: Some(caller.user_id),
                publisher_name: optional_text(publisher_name.as_deref())
                    .or_else(|| Some(caller.display_name.as_str().to_owned())),
                notes: optional_text(notes.as_deref()),
                snapshot: stored,
                notifications: notifications(&strings, published_at),
                published_at,
            },
            expected_current_version: app.current_version,
            pending: strings
                .iter()
                .filter(|item| item.is_pending())
                .map(PendingMarker::of)
                .collect(),
        };

        let mut version = match self
            .versions
            .commit_publication(publication)
            .await
            .map_err(map_store_error)?
        {
            PublicationOutcome::Committed(version) => version,
            PublicationOutcome::AppMissing => {
                return Err(Error::not_found(format!("app {} not found", app.id)));
            }
            PublicationOutcome::VersionMoved { actual } => {
                return Err(
                    Error::conflict("app version moved during publish").with_details(json!({
                        "expectedCurrentVersion": app.current_version,
                        "actualCurrentVersion": actual,
                    })),
                );
            }
        };

        version.snapshot = match &self.policy {
            SnapshotPolicy::Full => version.snapshot,
            SnapshotPolicy::Constrained(constrained) => {
                let key = SnapshotKey {
                    app_id: app.id,
                    version_number: number,
                };
                constrained.archive_snapshot(key, planned).await
            }
        };

        info!(
            app_id = %app.id,
            version_number = version.version_number,
            notifications = version.notifications.len(),
            snapshot = version.snapshot.fidelity.as_str(),
            "published version"
        );
        Ok(version)
    }
}

#[async_trait]
impl<A, S, V, M> VersionCommand for VersionService<A, S, V, M>
where
    A: AppRepository,
    S: StringItemRepository,
    V: VersionRepository,
    M: MembershipRepository,
{
    async fn publish(&self, request: PublishRequest) -> Result<Version, Error> {
        let _guard = self.locks.acquire(request.scope.app_id).await;
        self.publish_locked(request).await
    }
}

#[async_trait]
impl<A, S, V, M> VersionQuery for VersionService<A, S, V, M>
where
    A: AppRepository,
    S: StringItemRepository,
    V: VersionRepository,
    M: MembershipRepository,
{
    async fn list_versions(&self, caller: Caller, scope: AppScope) -> Result<Vec<Version>, Error> {
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Viewer)
            .await?;
        let versions = self
            .versions
            .list_versions(app.id)
            .await
            .map_err(map_store_error)?;
        let mut hydrated = Vec::with_capacity(versions.len());
        for version in versions {
            hydrated.push(self.hydrate(version).await);
        }
        Ok(hydrated)
    }

    async fn get_version(
        &self,
        caller: Caller,
        scope: AppScope,
        version_id: VersionId,
    ) -> Result<Version, Error> {
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Viewer)
            .await?;
        let version = found(
            self.versions
                .find_version(version_id)
                .await
                .map_err(map_store_error)?,
            "version",
            version_id,
        )?;
        if version.app_id != app.id {
            return Err(Error::not_found(format!("version {version_id} not found")));
        }
        Ok(self.hydrate(version).await)
    }

    async fn pending_changes(
        &self,
        caller: Caller,
        scope: AppScope,
    ) -> Result<Vec<PendingChange>, Error> {
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Viewer)
            .await?;
        let strings = self
            .strings
            .list_all_strings(app.id)
            .await
            .map_err(map_store_error)?;
        Ok(pending_changes(&strings))
    }
}

#[cfg(test)]
#[path = "version_service_tests.rs"]
mod tests;

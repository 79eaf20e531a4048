//! Published versions and the optimistic publish transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use bb8_redis::redis;
use bb8_redis::redis::aio::MultiplexedConnection;
use tracing::debug;

use crate::domain::ports::{RecordStoreError, VersionRepository};
use crate::domain::{
    App, AppId, PendingMarker, Publication, PublicationOutcome, StringId, StringItem, Version,
    VersionId,
};

use super::keys::{self, Kind};
use super::{RedisRecordStore, encode, index_range, load, load_many, map_redis_error, next_id};

async fn unwatch(conn: &mut MultiplexedConnection) -> Result<(), RecordStoreError> {
    redis::cmd("UNWATCH")
        .query_async::<()>(conn)
        .await
        .map_err(map_redis_error)
}

/// Transactions aborted by string edits before the publish gives up.
const COMMIT_ATTEMPTS: usize = 5;

/// Outcome for an app whose counter no longer matches the expected value.
fn lost_race(app: Option<&App>) -> PublicationOutcome {
    app.map_or(PublicationOutcome::AppMissing, |app| {
        PublicationOutcome::VersionMoved {
            actual: app.current_version,
        }
    })
}

#[async_trait]
impl VersionRepository for RedisRecordStore {
    async fn find_version(&self, id: VersionId) -> Result<Option<Version>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        load(&mut pooled, &keys::version(id)).await
    }

    async fn list_versions(&self, app: AppId) -> Result<Vec<Version>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let ids = index_range(conn, &keys::app_versions(app), 0, -1).await?;
        let version_keys: Vec<String> = ids
            .into_iter()
            .map(|id| keys::version(VersionId::new(id)))
            .collect();
        load_many(conn, &version_keys).await
    }

    async fn commit_publication(
        &self,
        publication: Publication,
    ) -> Result<PublicationOutcome, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        for _ in 0..COMMIT_ATTEMPTS {
            if let Some(outcome) = try_commit(conn, &publication).await? {
                return Ok(outcome);
            }
        }
        Err(RecordStoreError::conflict(format!(
            "strings of app {} kept changing during publish",
            publication.version.app_id
        )))
    }
}

/// Watch the app and every pending string, then commit in one `MULTI`.
///
/// Returns `None` when EXEC aborted because a pending string changed while
/// the app counter stayed put, so the caller can run the attempt again.
async fn try_commit(
    conn: &mut MultiplexedConnection,
    publication: &Publication,
) -> Result<Option<PublicationOutcome>, RecordStoreError> {
    let app_id = publication.version.app_id;
    let app_key = keys::app(app_id);
    let pending_keys: Vec<String> = publication
        .pending
        .iter()
        .map(|marker| keys::string(marker.string_id))
        .collect();

    redis::cmd("WATCH")
        .arg(&app_key)
        .arg(&pending_keys)
        .query_async::<()>(&mut *conn)
        .await
        .map_err(map_redis_error)?;
    let app = match load::<App>(conn, &app_key).await? {
        Some(app) if app.current_version == publication.expected_current_version => app,
        other => {
            unwatch(conn).await?;
            return Ok(Some(lost_race(other.as_ref())));
        }
    };

    let markers: HashMap<StringId, &PendingMarker> = publication
        .pending
        .iter()
        .map(|marker| (marker.string_id, marker))
        .collect();
    let pending: Vec<StringItem> = load_many(conn, &pending_keys).await?;
    let id = VersionId::new(next_id(conn, Kind::Version).await?);

    let version = publication.version.clone().with_id(id);
    let mut updated_app = app;
    updated_app.current_version = publication.next_current_version();
    updated_app.updated_at = version.published_at;

    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(&app_key)
        .arg(encode(&updated_app)?)
        .ignore()
        .cmd("SET")
        .arg(keys::version(id))
        .arg(encode(&version)?)
        .ignore()
        .cmd("ZADD")
        .arg(keys::app_versions(app_id))
        .arg(version.version_number)
        .arg(id.get())
        .ignore();
    for mut item in pending.into_iter().filter(|item| {
        item.app_id == app_id
            && markers
                .get(&item.id)
                .is_some_and(|marker| marker.still_matches(item))
    }) {
        item.clear_pending();
        pipe.cmd("SET")
            .arg(keys::string(item.id))
            .arg(encode(&item)?)
            .ignore();
    }

    // EXEC replies nil when a watched key changed since WATCH.
    let committed: Option<()> = pipe.query_async(conn).await.map_err(map_redis_error)?;
    if committed.is_some() {
        return Ok(Some(PublicationOutcome::Committed(version)));
    }
    let current = load::<App>(conn, &app_key).await?;
    match current {
        Some(app) if app.current_version == publication.expected_current_version => {
            debug!(app_id = %app_id, "pending string changed during publish; retrying");
            Ok(None)
        }
        other => {
            debug!(app_id = %app_id, "publish transaction aborted by a concurrent write");
            Ok(Some(lost_race(other.as_ref())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppName, ColumnLayout, ProjectId};
    use crate::test_support::fixture_timestamp;

    #[test]
    fn lost_races_report_the_current_counter() {
        let app = App {
            id: AppId::new(1),
            project_id: ProjectId::new(1),
            name: AppName::new("Main").expect("name"),
            current_version: 6,
            layout: ColumnLayout::default(),
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        };
        assert_eq!(
            lost_race(Some(&app)),
            PublicationOutcome::VersionMoved { actual: 6 }
        );
        assert_eq!(lost_race(None), PublicationOutcome::AppMissing);
    }
}

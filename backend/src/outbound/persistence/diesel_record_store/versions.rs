//! Published versions and the atomic publish commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{RecordStoreError, VersionRepository};
use crate::domain::{AppId, Publication, PublicationOutcome, Version, VersionId};
use crate::outbound::persistence::error_mapping::{map_diesel_error, map_pool_error};
use crate::outbound::persistence::models::{NewVersionRow, VersionRow, to_json};
use crate::outbound::persistence::schema::{apps, string_items, versions};

use super::{DieselRecordStore, decode_row, decode_rows};

enum CommitStep {
    Committed(VersionRow),
    AppMissing,
    VersionMoved(i64),
}

#[async_trait]
impl VersionRepository for DieselRecordStore {
    async fn find_version(&self, id: VersionId) -> Result<Option<Version>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = versions::table
            .find(id.get())
            .select(VersionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn list_versions(&self, app: AppId) -> Result<Vec<Version>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = versions::table
            .filter(versions::app_id.eq(app.get()))
            .order(versions::version_number.asc())
            .select(VersionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_rows(rows)
    }

    async fn commit_publication(
        &self,
        publication: Publication,
    ) -> Result<PublicationOutcome, RecordStoreError> {
        let version = &publication.version;
        let app_id = version.app_id.get();
        let expected = publication.expected_current_version;
        let next = publication.next_current_version();
        let published_at = version.published_at;
        let pending = publication.pending.clone();
        let new_row = NewVersionRow {
            app_id,
            version_number: version.version_number,
            publisher_id: version.publisher_id.map(|user| user.get()),
            publisher_name: version.publisher_name.as_deref(),
            notes: version.notes.as_deref(),
            snapshot: to_json(&version.snapshot)?,
            notifications: to_json(&version.notifications)?,
            published_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let step = conn
            .transaction(|conn| {
                async move {
                    let moved = diesel::update(
                        apps::table
                            .filter(apps::id.eq(app_id))
                            .filter(apps::current_version.eq(expected)),
                    )
                    .set((
                        apps::current_version.eq(next),
                        apps::updated_at.eq(published_at),
                    ))
                    .execute(conn)
                    .await?;

                    if moved == 0 {
                        let actual: Option<i64> = apps::table
                            .find(app_id)
                            .select(apps::current_version)
                            .first(conn)
                            .await
                            .optional()?;
                        return Ok(actual.map_or(CommitStep::AppMissing, CommitStep::VersionMoved));
                    }

                    let row = diesel::insert_into(versions::table)
                        .values(&new_row)
                        .returning(VersionRow::as_returning())
                        .get_result(conn)
                        .await?;

                    // A string edited after the read carries a newer
                    // `modified_at` and keeps its marker.
                    for marker in &pending {
                        let target = string_items::table
                            .filter(string_items::app_id.eq(app_id))
                            .filter(string_items::id.eq(marker.string_id.get()));
                        let cleared = (
                            string_items::status.eq(None::<String>),
                            string_items::modified_at.eq(None::<DateTime<Utc>>),
                        );
                        match marker.modified_at {
                            Some(read_at) => {
                                diesel::update(
                                    target.filter(string_items::modified_at.eq(read_at)),
                                )
                                .set(cleared)
                                .execute(conn)
                                .await?;
                            }
                            None => {
                                diesel::update(target.filter(string_items::modified_at.is_null()))
                                    .set(cleared)
                                    .execute(conn)
                                    .await?;
                            }
                        }
                    }

                    Ok::<_, diesel::result::Error>(CommitStep::Committed(row))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match step {
            CommitStep::Committed(row) => Ok(PublicationOutcome::Committed(Version::try_from(row)?)),
            CommitStep::AppMissing => Ok(PublicationOutcome::AppMissing),
            CommitStep::VersionMoved(actual) => {
                debug!(app_id, expected, actual, "publish lost compare-and-set");
                Ok(PublicationOutcome::VersionMoved { actual })
            }
        }
    }
}

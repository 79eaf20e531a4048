//! Apps and their string tables.

use async_trait::async_trait;
use bb8_redis::redis;

use crate::domain::ports::{AppRepository, RecordStoreError, StringItemRepository};
use crate::domain::{
    App, AppId, AppPatch, INITIAL_VERSION, NewApp, NewStringItem, Page, PageRequest, ProjectId,
    StringId, StringItem, StringPatch,
};

use super::keys::{self, Kind};
use super::{
    RedisRecordStore, encode, index_range, load, load_many, map_redis_error, next_id, store,
};

fn string_keys(ids: Vec<i64>) -> Vec<String> {
    ids.into_iter()
        .map(|id| keys::string(StringId::new(id)))
        .collect()
}

#[async_trait]
impl AppRepository for RedisRecordStore {
    async fn create_app(&self, app: NewApp) -> Result<App, RecordStoreError> {
        let now = self.clock.utc();
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;

        let id = AppId::new(next_id(conn, Kind::App).await?);
        let record = App {
            id,
            project_id: app.project_id,
            name: app.name,
            current_version: INITIAL_VERSION,
            layout: app.layout,
            created_at: now,
            updated_at: now,
        };
        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(keys::app(id))
            .arg(encode(&record)?)
            .ignore()
            .cmd("ZADD")
            .arg(keys::project_apps(record.project_id))
            .arg(id.get())
            .arg(id.get())
            .ignore()
            .query_async::<()>(conn)
            .await
            .map_err(map_redis_error)?;
        Ok(record)
    }

    async fn find_app(&self, id: AppId) -> Result<Option<App>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        load(&mut pooled, &keys::app(id)).await
    }

    async fn list_apps(&self, project: ProjectId) -> Result<Vec<App>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let ids = index_range(conn, &keys::project_apps(project), 0, -1).await?;
        let app_keys: Vec<String> = ids
            .into_iter()
            .map(|id| keys::app(AppId::new(id)))
            .collect();
        load_many(conn, &app_keys).await
    }

    async fn update_app(
        &self,
        id: AppId,
        patch: AppPatch,
    ) -> Result<Option<App>, RecordStoreError> {
        let now = self.clock.utc();
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let key = keys::app(id);
        let Some(mut app) = load::<App>(conn, &key).await? else {
            return Ok(None);
        };
        patch.apply(&mut app, now);
        store(conn, &key, &app).await?;
        Ok(Some(app))
    }

    async fn delete_app(&self, id: AppId) -> Result<bool, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let Some(app) = load::<App>(conn, &keys::app(id)).await? else {
            return Ok(false);
        };
        redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(keys::app(id))
            .ignore()
            .cmd("ZREM")
            .arg(keys::project_apps(app.project_id))
            .arg(id.get())
            .ignore()
            .query_async::<()>(conn)
            .await
            .map_err(map_redis_error)?;
        Ok(true)
    }
}

#[async_trait]
impl StringItemRepository for RedisRecordStore {
    async fn create_string(&self, item: NewStringItem) -> Result<StringItem, RecordStoreError> {
        let now = self.clock.utc();
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;

        let id = StringId::new(next_id(conn, Kind::String).await?);
        let record = StringItem {
            id,
            app_id: item.app_id,
            key: item.key,
            value: item.value,
            additional_columns: item.additional_columns,
            status: item.status,
            modified_at: item.modified_at,
            modified_by: item.modified_by,
            created_at: now,
        };
        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(keys::string(id))
            .arg(encode(&record)?)
            .ignore()
            .cmd("ZADD")
            .arg(keys::app_strings(record.app_id))
            .arg(id.get())
            .arg(id.get())
            .ignore()
            .query_async::<()>(conn)
            .await
            .map_err(map_redis_error)?;
        Ok(record)
    }

    async fn find_string(&self, id: StringId) -> Result<Option<StringItem>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        load(&mut pooled, &keys::string(id)).await
    }

    async fn list_strings(
        &self,
        app: AppId,
        page: PageRequest,
    ) -> Result<Page<StringItem>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let index = keys::app_strings(app);
        let total: u64 = redis::cmd("ZCARD")
            .arg(&index)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis_error)?;
        let start = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let stop = start.saturating_add(i64::from(page.limit())).saturating_sub(1);
        let ids = index_range(conn, &index, start, stop).await?;
        let items = load_many(conn, &string_keys(ids)).await?;
        Ok(Page::new(items, total, page))
    }

    async fn list_all_strings(&self, app: AppId) -> Result<Vec<StringItem>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let ids = index_range(conn, &keys::app_strings(app), 0, -1).await?;
        load_many(conn, &string_keys(ids)).await
    }

    async fn update_string(
        &self,
        id: StringId,
        patch: StringPatch,
    ) -> Result<Option<StringItem>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let key = keys::string(id);
        let Some(mut item) = load::<StringItem>(conn, &key).await? else {
            return Ok(None);
        };
        patch.apply(&mut item);
        store(conn, &key, &item).await?;
        Ok(Some(item))
    }

    async fn reset_pending(&self, app: AppId) -> Result<u64, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let ids = index_range(conn, &keys::app_strings(app), 0, -1).await?;
        let items: Vec<StringItem> = load_many(conn, &string_keys(ids)).await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        let mut cleared = 0_u64;
        for mut item in items.into_iter().filter(StringItem::is_pending) {
            item.clear_pending();
            pipe.cmd("SET")
                .arg(keys::string(item.id))
                .arg(encode(&item)?)
                .ignore();
            cleared += 1;
        }
        if cleared > 0 {
            pipe.query_async::<()>(conn)
                .await
                .map_err(map_redis_error)?;
        }
        Ok(cleared)
    }

    async fn delete_string(&self, id: StringId) -> Result<bool, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let Some(item) = load::<StringItem>(conn, &keys::string(id)).await? else {
            return Ok(false);
        };
        redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(keys::string(id))
            .ignore()
            .cmd("ZREM")
            .arg(keys::app_strings(item.app_id))
            .arg(id.get())
            .ignore()
            .query_async::<()>(conn)
            .await
            .map_err(map_redis_error)?;
        Ok(true)
    }
}

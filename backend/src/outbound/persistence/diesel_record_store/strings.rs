//! Apps and their string tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AppRepository, RecordStoreError, StringItemRepository};
use crate::domain::{
    App, AppId, AppPatch, INITIAL_VERSION, NewApp, NewStringItem, Page, PageRequest, ProjectId,
    StringId, StringItem, StringPatch,
};
use crate::outbound::persistence::error_mapping::{map_diesel_error, map_pool_error};
use crate::outbound::persistence::models::{
    AppChangeset, AppRow, NewAppRow, NewStringRow, StringChangeset, StringRow, to_json,
};
use crate::outbound::persistence::schema::{apps, string_items};

use super::{DieselRecordStore, affected, decode_row, decode_rows};

#[async_trait]
impl AppRepository for DieselRecordStore {
    async fn create_app(&self, app: NewApp) -> Result<App, RecordStoreError> {
        let now = self.clock.utc();
        let column_names = app.layout.columns.as_ref().map(to_json).transpose()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(apps::table)
            .values(&NewAppRow {
                project_id: app.project_id.get(),
                name: app.name.as_str(),
                current_version: INITIAL_VERSION,
                column_names,
                key_column: app.layout.key_column.as_deref(),
                value_column: app.layout.value_column.as_deref(),
                created_at: now,
                updated_at: now,
            })
            .returning(AppRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        App::try_from(row)
    }

    async fn find_app(&self, id: AppId) -> Result<Option<App>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = apps::table
            .find(id.get())
            .select(AppRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn list_apps(&self, project: ProjectId) -> Result<Vec<App>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = apps::table
            .filter(apps::project_id.eq(project.get()))
            .order(apps::id.asc())
            .select(AppRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_rows(rows)
    }

    async fn update_app(
        &self,
        id: AppId,
        patch: AppPatch,
    ) -> Result<Option<App>, RecordStoreError> {
        let now = self.clock.utc();
        let column_names = patch.columns.as_ref().map(to_json).transpose()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(apps::table.find(id.get()))
            .set(&AppChangeset {
                name: patch.name.as_ref().map(|name| name.as_str()),
                column_names,
                key_column: patch.key_column.as_deref(),
                value_column: patch.value_column.as_deref(),
                updated_at: now,
            })
            .returning(AppRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn delete_app(&self, id: AppId) -> Result<bool, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(apps::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(affected(deleted) > 0)
    }
}

#[async_trait]
impl StringItemRepository for DieselRecordStore {
    async fn create_string(&self, item: NewStringItem) -> Result<StringItem, RecordStoreError> {
        let now = self.clock.utc();
        let additional_columns = to_json(&item.additional_columns)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(string_items::table)
            .values(&NewStringRow {
                app_id: item.app_id.get(),
                key: item.key.as_str(),
                value: item.value.as_str(),
                additional_columns,
                status: item.status.map(|status| status.as_str()),
                modified_at: item.modified_at,
                modified_by: item.modified_by.map(|user| user.get()),
                created_at: now,
            })
            .returning(StringRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        StringItem::try_from(row)
    }

    async fn find_string(&self, id: StringId) -> Result<Option<StringItem>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = string_items::table
            .find(id.get())
            .select(StringRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn list_strings(
        &self,
        app: AppId,
        page: PageRequest,
    ) -> Result<Page<StringItem>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = string_items::table
            .filter(string_items::app_id.eq(app.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows = string_items::table
            .filter(string_items::app_id.eq(app.get()))
            .order(string_items::id.asc())
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(page.limit()))
            .select(StringRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = decode_rows(rows)?;
        Ok(Page::new(
            items,
            u64::try_from(total).unwrap_or_default(),
            page,
        ))
    }

    async fn list_all_strings(&self, app: AppId) -> Result<Vec<StringItem>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = string_items::table
            .filter(string_items::app_id.eq(app.get()))
            .order(string_items::id.asc())
            .select(StringRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_rows(rows)
    }

    async fn update_string(
        &self,
        id: StringId,
        patch: StringPatch,
    ) -> Result<Option<StringItem>, RecordStoreError> {
        let additional_columns = patch.additional_columns.as_ref().map(to_json).transpose()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(string_items::table.find(id.get()))
            .set(&StringChangeset {
                key: patch.key.as_ref().map(|key| key.as_str()),
                value: patch.value.as_ref().map(|value| value.as_str()),
                additional_columns,
                status: Some(patch.status.as_str()),
                modified_at: Some(patch.modified_at),
                modified_by: Some(patch.modified_by.get()),
            })
            .returning(StringRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn reset_pending(&self, app: AppId) -> Result<u64, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let cleared = diesel::update(
            string_items::table
                .filter(string_items::app_id.eq(app.get()))
                .filter(string_items::status.is_not_null()),
        )
        .set((
            string_items::status.eq(None::<String>),
            string_items::modified_at.eq(None::<DateTime<Utc>>),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(affected(cleared))
    }

    async fn delete_string(&self, id: StringId) -> Result<bool, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(string_items::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(affected(deleted) > 0)
    }
}

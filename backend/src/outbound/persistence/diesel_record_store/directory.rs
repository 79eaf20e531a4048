//! Users, projects and memberships.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{
    MembershipRepository, ProjectRepository, RecordStoreError, UserRepository,
};
use crate::domain::{
    EmailAddress, Membership, NewProject, NewUser, Project, ProjectId, ProjectPatch, Role, User,
    UserId, UserPatch,
};
use crate::outbound::persistence::error_mapping::{map_diesel_error, map_pool_error};
use crate::outbound::persistence::models::{
    MembershipRow, NewProjectRow, NewUserRow, ProjectChangeset, ProjectRow, UserChangeset,
    UserRow,
};
use crate::outbound::persistence::schema::{project_members, projects, users};

use super::{DieselRecordStore, affected, decode_row, decode_rows};

#[async_trait]
impl UserRepository for DieselRecordStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RecordStoreError> {
        let now = self.clock.utc();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                email: user.email.as_str(),
                name: user.name.as_str(),
                avatar_url: user.avatar_url.as_deref(),
                created_at: now,
                updated_at: now,
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        User::try_from(row)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn update_user(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> Result<Option<User>, RecordStoreError> {
        let now = self.clock.utc();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(users::table.find(id.get()))
            .set(&UserChangeset {
                name: patch.name.as_ref().map(|name| name.as_str()),
                avatar_url: patch.avatar_url.as_deref(),
                updated_at: now,
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn count_users(&self) -> Result<u64, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl ProjectRepository for DieselRecordStore {
    async fn create_project(&self, project: NewProject) -> Result<Project, RecordStoreError> {
        let now = self.clock.utc();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewProjectRow {
            name: project.name.as_str(),
            description: project.description.as_deref(),
            created_by: project.created_by.get(),
            created_at: now,
            updated_at: now,
        };

        // The owner membership lands in the same transaction as the project.
        let row = conn
            .transaction(|conn| {
                async move {
                    let row = diesel::insert_into(projects::table)
                        .values(&new_row)
                        .returning(ProjectRow::as_returning())
                        .get_result(conn)
                        .await?;
                    diesel::insert_into(project_members::table)
                        .values(&MembershipRow {
                            project_id: row.id,
                            user_id: row.created_by,
                            role: Role::Owner.as_str().to_owned(),
                            created_at: now,
                        })
                        .execute(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Project::try_from(row)
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = projects::table
            .find(id.get())
            .select(ProjectRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn list_projects_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<Project>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let member_of = project_members::table
            .filter(project_members::user_id.eq(user.get()))
            .select(project_members::project_id);
        let rows = projects::table
            .filter(projects::id.eq_any(member_of))
            .order(projects::id.asc())
            .select(ProjectRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_rows(rows)
    }

    async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, RecordStoreError> {
        let now = self.clock.utc();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(projects::table.find(id.get()))
            .set(&ProjectChangeset {
                name: patch.name.as_ref().map(|name| name.as_str()),
                description: patch.description.as_deref(),
                updated_at: now,
            })
            .returning(ProjectRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(projects::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(affected(deleted) > 0)
    }
}

#[async_trait]
impl MembershipRepository for DieselRecordStore {
    async fn upsert_membership(
        &self,
        project: ProjectId,
        user: UserId,
        role: Role,
    ) -> Result<Membership, RecordStoreError> {
        let now = self.clock.utc();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(project_members::table)
            .values(&MembershipRow {
                project_id: project.get(),
                user_id: user.get(),
                role: role.as_str().to_owned(),
                created_at: now,
            })
            .on_conflict((project_members::project_id, project_members::user_id))
            .do_update()
            .set(project_members::role.eq(excluded(project_members::role)))
            .returning(MembershipRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Membership::try_from(row)
    }

    async fn find_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<Option<Membership>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = project_members::table
            .find((project.get(), user.get()))
            .select(MembershipRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        decode_row(row)
    }

    async fn list_memberships(
        &self,
        project: ProjectId,
    ) -> Result<Vec<Membership>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = project_members::table
            .filter(project_members::project_id.eq(project.get()))
            .order(project_members::user_id.asc())
            .select(MembershipRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_rows(rows)
    }

    async fn remove_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<bool, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(project_members::table.find((project.get(), user.get())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(affected(deleted) > 0)
    }
}

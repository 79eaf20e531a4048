//! Users, projects and memberships.

use async_trait::async_trait;
use bb8_redis::redis;

use crate::domain::ports::{
    MembershipRepository, ProjectRepository, RecordStoreError, UserRepository,
};
use crate::domain::{
    EmailAddress, Membership, NewProject, NewUser, Project, ProjectId, ProjectPatch, Role, User,
    UserId, UserPatch,
};

use super::keys::{self, Kind};
use super::{
    RedisRecordStore, delete_key, encode, index_range, load, load_many, map_redis_error, next_id,
    store,
};

#[async_trait]
impl UserRepository for RedisRecordStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RecordStoreError> {
        let now = self.clock.utc();
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;

        let id = UserId::new(next_id(conn, Kind::User).await?);
        let claimed: Option<String> = redis::cmd("SET")
            .arg(keys::user_email(&user.email))
            .arg(id.get())
            .arg("NX")
            .query_async(conn)
            .await
            .map_err(map_redis_error)?;
        if claimed.is_none() {
            return Err(RecordStoreError::conflict(format!(
                "email {} already registered",
                user.email
            )));
        }

        let record = User {
            id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            created_at: now,
            updated_at: now,
        };
        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(keys::user(id))
            .arg(encode(&record)?)
            .ignore()
            .cmd("ZADD")
            .arg(keys::users_index())
            .arg(id.get())
            .arg(id.get())
            .ignore()
            .query_async::<()>(conn)
            .await
            .map_err(map_redis_error)?;
        Ok(record)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        load(&mut pooled, &keys::user(id)).await
    }

    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let id: Option<i64> = redis::cmd("GET")
            .arg(keys::user_email(email))
            .query_async(conn)
            .await
            .map_err(map_redis_error)?;
        match id {
            Some(id) => load(conn, &keys::user(UserId::new(id))).await,
            None => Ok(None),
        }
    }

    async fn update_user(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> Result<Option<User>, RecordStoreError> {
        let now = self.clock.utc();
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let key = keys::user(id);
        let Some(mut user) = load::<User>(conn, &key).await? else {
            return Ok(None);
        };
        patch.apply(&mut user, now);
        store(conn, &key, &user).await?;
        Ok(Some(user))
    }

    async fn count_users(&self) -> Result<u64, RecordStoreError> {
        let mut pooled = self.conn().await?;
        redis::cmd("ZCARD")
            .arg(keys::users_index())
            .query_async(&mut *pooled)
            .await
            .map_err(map_redis_error)
    }
}

#[async_trait]
impl ProjectRepository for RedisRecordStore {
    async fn create_project(&self, project: NewProject) -> Result<Project, RecordStoreError> {
        let now = self.clock.utc();
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;

        let id = ProjectId::new(next_id(conn, Kind::Project).await?);
        let record = Project {
            id,
            name: project.name,
            description: project.description,
            created_by: project.created_by,
            created_at: now,
            updated_at: now,
        };
        let owner = Membership {
            project_id: id,
            user_id: record.created_by,
            role: Role::Owner,
            created_at: now,
        };
        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(keys::project(id))
            .arg(encode(&record)?)
            .ignore()
            .cmd("SET")
            .arg(keys::membership(id, owner.user_id))
            .arg(encode(&owner)?)
            .ignore()
            .cmd("ZADD")
            .arg(keys::project_members(id))
            .arg(owner.user_id.get())
            .arg(owner.user_id.get())
            .ignore()
            .cmd("ZADD")
            .arg(keys::user_projects(owner.user_id))
            .arg(id.get())
            .arg(id.get())
            .ignore()
            .query_async::<()>(conn)
            .await
            .map_err(map_redis_error)?;
        Ok(record)
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        load(&mut pooled, &keys::project(id)).await
    }

    async fn list_projects_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<Project>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let ids = index_range(conn, &keys::user_projects(user), 0, -1).await?;
        let project_keys: Vec<String> = ids
            .into_iter()
            .map(|id| keys::project(ProjectId::new(id)))
            .collect();
        load_many(conn, &project_keys).await
    }

    async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, RecordStoreError> {
        let now = self.clock.utc();
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let key = keys::project(id);
        let Some(mut project) = load::<Project>(conn, &key).await? else {
            return Ok(None);
        };
        patch.apply(&mut project, now);
        store(conn, &key, &project).await?;
        Ok(Some(project))
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, RecordStoreError> {
        let mut pooled = self.conn().await?;
        delete_key(&mut pooled, &keys::project(id)).await
    }
}

#[async_trait]
impl MembershipRepository for RedisRecordStore {
    async fn upsert_membership(
        &self,
        project: ProjectId,
        user: UserId,
        role: Role,
    ) -> Result<Membership, RecordStoreError> {
        let now = self.clock.utc();
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let key = keys::membership(project, user);
        let created_at = load::<Membership>(conn, &key)
            .await?
            .map_or(now, |existing| existing.created_at);
        let record = Membership {
            project_id: project,
            user_id: user,
            role,
            created_at,
        };
        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(encode(&record)?)
            .ignore()
            .cmd("ZADD")
            .arg(keys::project_members(project))
            .arg(user.get())
            .arg(user.get())
            .ignore()
            .cmd("ZADD")
            .arg(keys::user_projects(user))
            .arg(project.get())
            .arg(project.get())
            .ignore()
            .query_async::<()>(conn)
            .await
            .map_err(map_redis_error)?;
        Ok(record)
    }

    async fn find_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<Option<Membership>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        load(&mut pooled, &keys::membership(project, user)).await
    }

    async fn list_memberships(
        &self,
        project: ProjectId,
    ) -> Result<Vec<Membership>, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;
        let users = index_range(conn, &keys::project_members(project), 0, -1).await?;
        let membership_keys: Vec<String> = users
            .into_iter()
            .map(|user| keys::membership(project, UserId::new(user)))
            .collect();
        load_many(conn, &membership_keys).await
    }

    async fn remove_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<bool, RecordStoreError> {
        let mut pooled = self.conn().await?;
        let (removed,): (i64,) = redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(keys::membership(project, user))
            .cmd("ZREM")
            .arg(keys::project_members(project))
            .arg(user.get())
            .ignore()
            .cmd("ZREM")
            .arg(keys::user_projects(user))
            .arg(project.get())
            .ignore()
            .query_async(&mut *pooled)
            .await
            .map_err(map_redis_error)?;
        Ok(removed > 0)
    }
}

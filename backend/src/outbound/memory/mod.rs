//! In-process record store with a JSON recovery snapshot.
//!
//! Records live in maps behind a mutex. After every mutation the whole state
//! is serialised and written to the configured snapshot file; a failed write
//! is logged and otherwise ignored. The snapshot is a recovery aid, reloaded
//! at start-up, not a durability guarantee.

mod snapshot_file;
mod state;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mockable::Clock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    AppRepository, MembershipRepository, ProjectRepository, RecordStoreError,
    StringItemRepository, UserRepository, VersionRepository,
};
use crate::domain::{
    App, AppId, AppPatch, EmailAddress, Membership, NewApp, NewProject, NewStringItem, NewUser,
    Page, PageRequest, Project, ProjectId, ProjectPatch, Publication, PublicationOutcome, Role,
    StringId, StringItem, StringPatch, User, UserId, UserPatch, Version, VersionId,
};

pub use snapshot_file::SnapshotFile;
use state::MemoryState;

/// Errors raised while opening a memory store from its snapshot.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// The snapshot file could not be read.
    #[error("failed to read memory snapshot at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The snapshot file is not a valid state document.
    #[error("memory snapshot at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Record store keeping everything in process memory.
pub struct MemoryRecordStore {
    state: Mutex<MemoryState>,
    snapshot: Option<SnapshotFile>,
    clock: Arc<dyn Clock>,
}

impl MemoryRecordStore {
    /// An empty store that never touches the filesystem.
    pub fn ephemeral(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            snapshot: None,
            clock,
        }
    }

    /// Open a store persisted to `snapshot`, loading existing state.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed. A missing
    /// file starts an empty store.
    pub fn open(snapshot: SnapshotFile, clock: Arc<dyn Clock>) -> Result<Self, MemoryStoreError> {
        let contents = snapshot.load().map_err(|source| MemoryStoreError::Read {
            path: snapshot.path().to_path_buf(),
            source,
        })?;
        let state = match contents {
            Some(contents) => {
                let state: MemoryState =
                    serde_json::from_str(&contents).map_err(|source| MemoryStoreError::Corrupt {
                        path: snapshot.path().to_path_buf(),
                        source,
                    })?;
                info!(path = %snapshot.path().display(), "loaded memory snapshot");
                state
            }
            None => {
                info!(path = %snapshot.path().display(), "no memory snapshot, starting empty");
                MemoryState::default()
            }
        };
        Ok(Self {
            state: Mutex::new(state),
            snapshot: Some(snapshot),
            clock,
        })
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Operations never leave the state half-written, so a poisoned lock
        // still guards consistent data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, op: impl FnOnce(&MemoryState) -> T) -> T {
        op(&self.lock())
    }

    fn write<T>(&self, op: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut state = self.lock();
        let result = op(&mut state);
        self.flush(&state);
        result
    }

    fn flush(&self, state: &MemoryState) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let bytes = match serde_json::to_vec_pretty(state) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(%error, "failed to serialise memory snapshot");
                return;
            }
        };
        match snapshot.save(&bytes) {
            Ok(()) => debug!(bytes = bytes.len(), "flushed memory snapshot"),
            Err(error) => warn!(
                path = %snapshot.path().display(),
                %error,
                "failed to write memory snapshot"
            ),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryRecordStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RecordStoreError> {
        let now = self.clock.utc();
        self.write(|state| state.create_user(user, now))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RecordStoreError> {
        Ok(self.read(|state| state.find_user(id)))
    }

    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, RecordStoreError> {
        Ok(self.read(|state| state.find_user_by_email(email)))
    }

    async fn update_user(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> Result<Option<User>, RecordStoreError> {
        let now = self.clock.utc();
        Ok(self.write(|state| state.update_user(id, patch, now)))
    }

    async fn count_users(&self) -> Result<u64, RecordStoreError> {
        Ok(self.read(MemoryState::count_users))
    }
}

#[async_trait]
impl ProjectRepository for MemoryRecordStore {
    async fn create_project(&self, project: NewProject) -> Result<Project, RecordStoreError> {
        let now = self.clock.utc();
        Ok(self.write(|state| state.create_project(project, now)))
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, RecordStoreError> {
        Ok(self.read(|state| state.find_project(id)))
    }

    async fn list_projects_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<Project>, RecordStoreError> {
        Ok(self.read(|state| state.list_projects_for_user(user)))
    }

    async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, RecordStoreError> {
        let now = self.clock.utc();
        Ok(self.write(|state| state.update_project(id, patch, now)))
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, RecordStoreError> {
        Ok(self.write(|state| state.delete_project(id)))
    }
}

#[async_trait]
impl MembershipRepository for MemoryRecordStore {
    async fn upsert_membership(
        &self,
        project: ProjectId,
        user: UserId,
        role: Role,
    ) -> Result<Membership, RecordStoreError> {
        let now = self.clock.utc();
        Ok(self.write(|state| state.upsert_membership(project, user, role, now)))
    }

    async fn find_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<Option<Membership>, RecordStoreError> {
        Ok(self.read(|state| state.find_membership(project, user)))
    }

    async fn list_memberships(
        &self,
        project: ProjectId,
    ) -> Result<Vec<Membership>, RecordStoreError> {
        Ok(self.read(|state| state.list_memberships(project)))
    }

    async fn remove_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<bool, RecordStoreError> {
        Ok(self.write(|state| state.remove_membership(project, user)))
    }
}

#[async_trait]
impl AppRepository for MemoryRecordStore {
    async fn create_app(&self, app: NewApp) -> Result<App, RecordStoreError> {
        let now = self.clock.utc();
        Ok(self.write(|state| state.create_app(app, now)))
    }

    async fn find_app(&self, id: AppId) -> Result<Option<App>, RecordStoreError> {
        Ok(self.read(|state| state.find_app(id)))
    }

    async fn list_apps(&self, project: ProjectId) -> Result<Vec<App>, RecordStoreError> {
        Ok(self.read(|state| state.list_apps(project)))
    }

    async fn update_app(
        &self,
        id: AppId,
        patch: AppPatch,
    ) -> Result<Option<App>, RecordStoreError> {
        let now = self.clock.utc();
        Ok(self.write(|state| state.update_app(id, patch, now)))
    }

    async fn delete_app(&self, id: AppId) -> Result<bool, RecordStoreError> {
        Ok(self.write(|state| state.delete_app(id)))
    }
}

#[async_trait]
impl StringItemRepository for MemoryRecordStore {
    async fn create_string(&self, item: NewStringItem) -> Result<StringItem, RecordStoreError> {
        let now = self.clock.utc();
        Ok(self.write(|state| state.create_string(item, now)))
    }

    async fn find_string(&self, id: StringId) -> Result<Option<StringItem>, RecordStoreError> {
        Ok(self.read(|state| state.find_string(id)))
    }

    async fn list_strings(
        &self,
        app: AppId,
        page: PageRequest,
    ) -> Result<Page<StringItem>, RecordStoreError> {
        Ok(self.read(|state| state.list_strings(app, page)))
    }

    async fn list_all_strings(&self, app: AppId) -> Result<Vec<StringItem>, RecordStoreError> {
        Ok(self.read(|state| state.list_all_strings(app)))
    }

    async fn update_string(
        &self,
        id: StringId,
        patch: StringPatch,
    ) -> Result<Option<StringItem>, RecordStoreError> {
        Ok(self.write(|state| state.update_string(id, patch)))
    }

    async fn reset_pending(&self, app: AppId) -> Result<u64, RecordStoreError> {
        Ok(self.write(|state| state.reset_pending(app)))
    }

    async fn delete_string(&self, id: StringId) -> Result<bool, RecordStoreError> {
        Ok(self.write(|state| state.delete_string(id)))
    }
}

#[async_trait]
impl VersionRepository for MemoryRecordStore {
    async fn find_version(&self, id: VersionId) -> Result<Option<Version>, RecordStoreError> {
        Ok(self.read(|state| state.find_version(id)))
    }

    async fn list_versions(&self, app: AppId) -> Result<Vec<Version>, RecordStoreError> {
        Ok(self.read(|state| state.list_versions(app)))
    }

    async fn commit_publication(
        &self,
        publication: Publication,
    ) -> Result<PublicationOutcome, RecordStoreError> {
        Ok(self.write(|state| state.commit_publication(publication)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, ProjectName};
    use crate::test_support::FixtureClock;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: EmailAddress::new(email).expect("email"),
            name: DisplayName::new("Admin").expect("name"),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn mutations_are_reloaded_from_the_snapshot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("data/memory-db.json");

        let store = MemoryRecordStore::open(SnapshotFile::new(&path), FixtureClock::shared())
            .expect("open empty");
        let user = store
            .create_user(new_user("admin@example.com"))
            .await
            .expect("user");
        store
            .create_project(NewProject {
                name: ProjectName::new("Mobile").expect("name"),
                description: None,
                created_by: user.id,
            })
            .await
            .expect("project");
        drop(store);

        let reopened = MemoryRecordStore::open(SnapshotFile::new(&path), FixtureClock::shared())
            .expect("reopen");
        assert_eq!(reopened.count_users().await.expect("count"), 1);
        let projects = reopened
            .list_projects_for_user(user.id)
            .await
            .expect("projects");
        assert_eq!(projects.len(), 1);

        let second = reopened
            .create_user(new_user("second@example.com"))
            .await
            .expect("second user");
        assert_eq!(second.id, UserId::new(2));
    }

    #[test]
    fn corrupt_snapshots_are_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = SnapshotFile::new(dir.path().join("memory-db.json"));
        file.save(b"not json").expect("write");
        let err = MemoryRecordStore::open(file, FixtureClock::shared())
            .err()
            .expect("corrupt");
        assert!(matches!(err, MemoryStoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn ephemeral_stores_work_without_a_file() {
        let store = MemoryRecordStore::ephemeral(FixtureClock::shared());
        store
            .create_user(new_user("admin@example.com"))
            .await
            .expect("user");
        assert_eq!(store.count_users().await.expect("count"), 1);
    }
}

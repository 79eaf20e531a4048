//! Serialisable state of the in-memory record store.
//!
//! All operations are synchronous and run while the store holds its lock, so
//! each one is atomic with respect to the others.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::RecordStoreError;
use crate::domain::{
    App, AppId, AppPatch, EmailAddress, INITIAL_VERSION, Membership, NewApp, NewProject,
    NewStringItem, NewUser, Page, PageRequest, Project, ProjectId, ProjectPatch, Publication,
    PublicationOutcome, Role, StringId, StringItem, StringPatch, User, UserId, UserPatch, Version,
    VersionId,
};

/// Last identifier handed out per record kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct IdCounters {
    users: i64,
    projects: i64,
    apps: i64,
    strings: i64,
    versions: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Every record held by the memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryState {
    counters: IdCounters,
    users: BTreeMap<UserId, User>,
    projects: BTreeMap<ProjectId, Project>,
    memberships: Vec<Membership>,
    apps: BTreeMap<AppId, App>,
    strings: BTreeMap<StringId, StringItem>,
    versions: BTreeMap<VersionId, Version>,
}

impl MemoryState {
    // Users

    pub fn create_user(
        &mut self,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<User, RecordStoreError> {
        if self.find_user_by_email(&user.email).is_some() {
            return Err(RecordStoreError::conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        let id = UserId::new(next_id(&mut self.counters.users));
        let record = User {
            id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, record.clone());
        Ok(record)
    }

    pub fn find_user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    pub fn find_user_by_email(&self, email: &EmailAddress) -> Option<User> {
        self.users.values().find(|user| &user.email == email).cloned()
    }

    pub fn update_user(&mut self, id: UserId, patch: UserPatch, now: DateTime<Utc>) -> Option<User> {
        let user = self.users.get_mut(&id)?;
        patch.apply(user, now);
        Some(user.clone())
    }

    pub fn count_users(&self) -> u64 {
        self.users.len() as u64
    }

    // Projects and memberships

    pub fn create_project(&mut self, project: NewProject, now: DateTime<Utc>) -> Project {
        let id = ProjectId::new(next_id(&mut self.counters.projects));
        let record = Project {
            id,
            name: project.name,
            description: project.description,
            created_by: project.created_by,
            created_at: now,
            updated_at: now,
        };
        self.projects.insert(id, record.clone());
        self.upsert_membership(id, record.created_by, Role::Owner, now);
        record
    }

    pub fn find_project(&self, id: ProjectId) -> Option<Project> {
        self.projects.get(&id).cloned()
    }

    pub fn list_projects_for_user(&self, user: UserId) -> Vec<Project> {
        self.projects
            .values()
            .filter(|project| {
                self.memberships
                    .iter()
                    .any(|m| m.project_id == project.id && m.user_id == user)
            })
            .cloned()
            .collect()
    }

    pub fn update_project(
        &mut self,
        id: ProjectId,
        patch: ProjectPatch,
        now: DateTime<Utc>,
    ) -> Option<Project> {
        let project = self.projects.get_mut(&id)?;
        patch.apply(project, now);
        Some(project.clone())
    }

    pub fn delete_project(&mut self, id: ProjectId) -> bool {
        self.projects.remove(&id).is_some()
    }

    pub fn upsert_membership(
        &mut self,
        project: ProjectId,
        user: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Membership {
        if let Some(existing) = self
            .memberships
            .iter_mut()
            .find(|m| m.project_id == project && m.user_id == user)
        {
            existing.role = role;
            return existing.clone();
        }
        let membership = Membership {
            project_id: project,
            user_id: user,
            role,
            created_at: now,
        };
        self.memberships.push(membership.clone());
        membership
    }

    pub fn find_membership(&self, project: ProjectId, user: UserId) -> Option<Membership> {
        self.memberships
            .iter()
            .find(|m| m.project_id == project && m.user_id == user)
            .cloned()
    }

    pub fn list_memberships(&self, project: ProjectId) -> Vec<Membership> {
        self.memberships
            .iter()
            .filter(|m| m.project_id == project)
            .cloned()
            .collect()
    }

    pub fn remove_membership(&mut self, project: ProjectId, user: UserId) -> bool {
        let before = self.memberships.len();
        self.memberships
            .retain(|m| !(m.project_id == project && m.user_id == user));
        self.memberships.len() != before
    }

    // Apps

    pub fn create_app(&mut self, app: NewApp, now: DateTime<Utc>) -> App {
        let id = AppId::new(next_id(&mut self.counters.apps));
        let record = App {
            id,
            project_id: app.project_id,
            name: app.name,
            current_version: INITIAL_VERSION,
            layout: app.layout,
            created_at: now,
            updated_at: now,
        };
        self.apps.insert(id, record.clone());
        record
    }

    pub fn find_app(&self, id: AppId) -> Option<App> {
        self.apps.get(&id).cloned()
    }

    pub fn list_apps(&self, project: ProjectId) -> Vec<App> {
        self.apps
            .values()
            .filter(|app| app.project_id == project)
            .cloned()
            .collect()
    }

    pub fn update_app(&mut self, id: AppId, patch: AppPatch, now: DateTime<Utc>) -> Option<App> {
        let app = self.apps.get_mut(&id)?;
        patch.apply(app, now);
        Some(app.clone())
    }

    pub fn delete_app(&mut self, id: AppId) -> bool {
        self.apps.remove(&id).is_some()
    }

    // Strings

    pub fn create_string(&mut self, item: NewStringItem, now: DateTime<Utc>) -> StringItem {
        let id = StringId::new(next_id(&mut self.counters.strings));
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
        self.strings.insert(id, record.clone());
        record
    }

    pub fn find_string(&self, id: StringId) -> Option<StringItem> {
        self.strings.get(&id).cloned()
    }

    fn strings_of(&self, app: AppId) -> impl Iterator<Item = &StringItem> {
        self.strings.values().filter(move |item| item.app_id == app)
    }

    pub fn list_strings(&self, app: AppId, page: PageRequest) -> Page<StringItem> {
        let total = self.strings_of(app).count() as u64;
        let items = page.slice(self.strings_of(app).cloned());
        Page::new(items, total, page)
    }

    pub fn list_all_strings(&self, app: AppId) -> Vec<StringItem> {
        self.strings_of(app).cloned().collect()
    }

    pub fn update_string(&mut self, id: StringId, patch: StringPatch) -> Option<StringItem> {
        let item = self.strings.get_mut(&id)?;
        patch.apply(item);
        Some(item.clone())
    }

    pub fn reset_pending(&mut self, app: AppId) -> u64 {
        let mut cleared = 0;
        for item in self
            .strings
            .values_mut()
            .filter(|item| item.app_id == app && item.is_pending())
        {
            item.clear_pending();
            cleared += 1;
        }
        cleared
    }

    pub fn delete_string(&mut self, id: StringId) -> bool {
        self.strings.remove(&id).is_some()
    }

    // Versions

    pub fn find_version(&self, id: VersionId) -> Option<Version> {
        self.versions.get(&id).cloned()
    }

    pub fn list_versions(&self, app: AppId) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .versions
            .values()
            .filter(|version| version.app_id == app)
            .cloned()
            .collect();
        versions.sort_by_key(|version| version.version_number);
        versions
    }

    pub fn commit_publication(&mut self, publication: Publication) -> PublicationOutcome {
        let next_current = publication.next_current_version();
        let Publication {
            version,
            expected_current_version,
            pending,
        } = publication;

        let Some(app) = self.apps.get_mut(&version.app_id) else {
            return PublicationOutcome::AppMissing;
        };
        if app.current_version != expected_current_version {
            return PublicationOutcome::VersionMoved {
                actual: app.current_version,
            };
        }
        app.current_version = next_current;
        app.updated_at = version.published_at;

        for marker in &pending {
            if let Some(item) = self
                .strings
                .get_mut(&marker.string_id)
                .filter(|item| item.app_id == version.app_id && marker.still_matches(item))
            {
                item.clear_pending();
            }
        }

        let id = VersionId::new(next_id(&mut self.counters.versions));
        let record = version.with_id(id);
        self.versions.insert(id, record.clone());
        PublicationOutcome::Committed(record)
    }
}

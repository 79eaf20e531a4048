//! Shared harness for integration tests.
//!
//! Services are wired over an ephemeral [`MemoryRecordStore`] the same way
//! the server wires them, and driven through their public ports.

use std::sync::Arc;

use mockable::Clock;
use string_manager::domain::ports::{
    CreateAppRequest, CreateProjectRequest, CreateStringRequest, MembershipRepository,
    PublishRequest, UpdateStringRequest, UserRepository,
};
use string_manager::domain::{
    AdditionalColumns, AppName, AppScope, Caller, ColumnLayout, ConstrainedSnapshots, DisplayName,
    EmailAddress, Error, NewUser, PageRequest, ProjectId, ProjectName, Role, SampleDataSeeder,
    SnapshotPolicy, StringEdit, StringId, StringItem, StringKey, StringValue, Version,
};
use string_manager::inbound::http::state::HttpState;
use string_manager::outbound::memory::MemoryRecordStore;
use string_manager::outbound::snapshot_archive::QuotaSnapshotArchive;
use string_manager::test_support::{FixtureClock, fixture_timestamp};

/// Store, services and the bootstrapped owner.
pub struct Harness {
    pub store: Arc<MemoryRecordStore>,
    pub ports: HttpState,
    pub owner: Caller,
    pub clock: Arc<FixtureClock>,
}

/// Constrained policy over a fresh quota archive.
pub fn constrained(threshold: usize, quota_bytes: u64, history_per_app: usize) -> SnapshotPolicy {
    SnapshotPolicy::Constrained(ConstrainedSnapshots::new(
        threshold,
        Arc::new(QuotaSnapshotArchive::new(quota_bytes, history_per_app)),
    ))
}

impl Harness {
    /// Empty store with the default user and no sample data.
    pub async fn new(policy: SnapshotPolicy) -> Self {
        let clock = Arc::new(FixtureClock::at(fixture_timestamp()));
        let shared: Arc<dyn Clock> = clock.clone();
        let store = Arc::new(MemoryRecordStore::ephemeral(Arc::clone(&shared)));
        let outcome = SampleDataSeeder::new(Arc::clone(&store))
            .bootstrap("admin@example.com", "Admin User", false)
            .await
            .expect("bootstrap default user");
        let ports = HttpState::for_store(Arc::clone(&store), policy, shared);
        Self {
            store,
            ports,
            owner: Caller::from(&outcome.user),
            clock,
        }
    }

    /// A project owned by the default user with one app.
    pub async fn app(&self) -> AppScope {
        let project = self
            .ports
            .projects
            .create_project(CreateProjectRequest {
                caller: self.owner.clone(),
                name: ProjectName::new("Localisation").expect("name"),
                description: None,
            })
            .await
            .expect("create project");
        let app = self
            .ports
            .projects
            .create_app(CreateAppRequest {
                caller: self.owner.clone(),
                project_id: project.id,
                name: AppName::new("Main").expect("name"),
                layout: ColumnLayout::default(),
            })
            .await
            .expect("create app");
        AppScope::new(project.id, app.id)
    }

    /// Another user holding `role` on `project`.
    pub async fn member(&self, project: ProjectId, role: Role, name: &str) -> Caller {
        let user = self
            .store
            .create_user(NewUser {
                email: EmailAddress::new(format!("{name}@example.com")).expect("email"),
                name: DisplayName::new(name).expect("name"),
                avatar_url: None,
            })
            .await
            .expect("create user");
        self.store
            .upsert_membership(project, user.id, role)
            .await
            .expect("membership");
        Caller::from(&user)
    }

    /// Add a string as the owner; it starts pending as `new`.
    pub async fn add_string(&self, scope: AppScope, key: &str, value: &str) -> StringItem {
        self.ports
            .strings
            .create_string(CreateStringRequest {
                caller: self.owner.clone(),
                scope,
                key: StringKey::new(key).expect("key"),
                value: StringValue::new(value).expect("value"),
                additional_columns: AdditionalColumns::new(),
            })
            .await
            .expect("create string")
    }

    /// Change a string's value as the owner.
    pub async fn edit_value(&self, scope: AppScope, id: StringId, value: &str) -> StringItem {
        self.ports
            .strings
            .update_string(UpdateStringRequest {
                caller: self.owner.clone(),
                scope,
                string_id: id,
                edit: StringEdit {
                    key: None,
                    value: Some(StringValue::new(value).expect("value")),
                    additional_columns: None,
                },
            })
            .await
            .expect("update string")
    }

    /// Discard every pending marker so the table looks published.
    pub async fn settle(&self, scope: AppScope) -> u64 {
        self.ports
            .strings
            .reset_pending(self.owner.clone(), scope)
            .await
            .expect("reset pending")
    }

    /// Publish with defaults as `caller`.
    pub async fn publish_as(&self, caller: &Caller, scope: AppScope) -> Result<Version, Error> {
        self.ports
            .versions
            .publish(PublishRequest {
                caller: caller.clone(),
                scope,
                version_number: None,
                publisher_name: None,
                notes: None,
            })
            .await
    }

    /// Publish with defaults as the owner.
    pub async fn publish(&self, scope: AppScope) -> Version {
        self.publish_as(&self.owner, scope)
            .await
            .expect("publish succeeds")
    }

    /// The app's next version number.
    pub async fn current_version(&self, scope: AppScope) -> i64 {
        self.ports
            .projects_query
            .get_app(self.owner.clone(), scope)
            .await
            .expect("get app")
            .current_version
    }

    /// Every string of the app in table order.
    pub async fn strings(&self, scope: AppScope) -> Vec<StringItem> {
        self.ports
            .strings_query
            .list_strings(
                self.owner.clone(),
                scope,
                PageRequest::new(Some(1), Some(10_000)),
            )
            .await
            .expect("list strings")
            .items
    }
}

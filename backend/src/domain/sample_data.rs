//! Start-up identity and sample data.
//!
//! Authentication is out of scope: every request acts as one configured user,
//! created on first start. An empty store can optionally be seeded with a
//! sample project so the service is usable straight away.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::RecordStore;
use crate::domain::service_support::{map_store_error, validation_error};
use crate::domain::{
    AdditionalColumns, AppName, ColumnLayout, DisplayName, EmailAddress, Error, NewApp,
    NewProject, NewStringItem, NewUser, ProjectName, StringKey, StringValue, User,
};

const SAMPLE_PROJECT_NAME: &str = "샘플 프로젝트";
const SAMPLE_PROJECT_DESCRIPTION: &str = "개발 및 테스트용 샘플 프로젝트";
const SAMPLE_APP_NAME: &str = "메인 앱";
const SAMPLE_COLUMNS: [&str; 5] = ["No", "String ID (Key)", "Korean", "English", "Status"];
const SAMPLE_KEY_COLUMN: &str = "String ID (Key)";
const SAMPLE_VALUE_COLUMN: &str = "Korean";

/// (key, value, No, English) rows of the sample string table.
const SAMPLE_STRINGS: [(&str, &str, &str, &str); 2] = [
    ("welcome_message", "환영합니다!", "1", "Welcome!"),
    ("goodbye_message", "안녕히 가세요!", "2", "Goodbye!"),
];

/// What start-up bootstrapping did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOutcome {
    /// The fixed caller identity.
    pub user: User,
    /// Whether the sample project was created.
    pub seeded: bool,
}

/// Resolves the default user and seeds sample data.
pub struct SampleDataSeeder<S> {
    store: Arc<S>,
}

impl<S> SampleDataSeeder<S> {
    /// Create a seeder writing through `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: RecordStore> SampleDataSeeder<S> {
    /// Find or create the default user, then seed sample data when the store
    /// held no users and seeding is enabled.
    pub async fn bootstrap(
        &self,
        email: &str,
        name: &str,
        seed_sample_data: bool,
    ) -> Result<BootstrapOutcome, Error> {
        let email = EmailAddress::new(email).map_err(|err| validation_error(&err))?;
        let name = DisplayName::new(name).map_err(|err| validation_error(&err))?;
        let existing_users = self.store.count_users().await.map_err(map_store_error)?;

        let user = match self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(map_store_error)?
        {
            Some(user) => user,
            None => {
                let user = self
                    .store
                    .create_user(NewUser {
                        email,
                        name,
                        avatar_url: None,
                    })
                    .await
                    .map_err(map_store_error)?;
                info!(user_id = %user.id, "created default user");
                user
            }
        };

        let seeded = seed_sample_data && existing_users == 0;
        if seeded {
            self.seed(&user).await?;
        } else {
            info!(existing_users, "sample data seeding skipped");
        }
        Ok(BootstrapOutcome { user, seeded })
    }

    async fn seed(&self, owner: &User) -> Result<(), Error> {
        let project = self
            .store
            .create_project(NewProject {
                name: ProjectName::new(SAMPLE_PROJECT_NAME).map_err(|err| validation_error(&err))?,
                description: Some(SAMPLE_PROJECT_DESCRIPTION.to_owned()),
                created_by: owner.id,
            })
            .await
            .map_err(map_store_error)?;
        let app = self
            .store
            .create_app(NewApp {
                project_id: project.id,
                name: AppName::new(SAMPLE_APP_NAME).map_err(|err| validation_error(&err))?,
                layout: ColumnLayout {
                    columns: Some(SAMPLE_COLUMNS.iter().map(|c| (*c).to_owned()).collect()),
                    key_column: Some(SAMPLE_KEY_COLUMN.to_owned()),
                    value_column: Some(SAMPLE_VALUE_COLUMN.to_owned()),
                },
            })
            .await
            .map_err(map_store_error)?;
        for (key, value, number, english) in SAMPLE_STRINGS {
            let columns = AdditionalColumns::from([
                ("No".to_owned(), number.to_owned()),
                ("English".to_owned(), english.to_owned()),
                ("Status".to_owned(), "Active".to_owned()),
            ]);
            let mut item = NewStringItem::published(
                app.id,
                StringKey::new(key).map_err(|err| validation_error(&err))?,
                StringValue::new(value).map_err(|err| validation_error(&err))?,
                columns,
            );
            item.modified_by = Some(owner.id);
            self.store
                .create_string(item)
                .await
                .map_err(map_store_error)?;
        }
        info!(
            project_id = %project.id,
            app_id = %app.id,
            strings = SAMPLE_STRINGS.len(),
            "seeded sample data"
        );
        Ok(())
    }
}

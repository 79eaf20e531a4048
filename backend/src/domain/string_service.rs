//! String table editing.
//!
//! Every edit goes through the status state machine on [`StringEdit`], so a
//! string created since the last publish stays `new` however often it is
//! edited.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    AppRepository, CreateStringRequest, MembershipRepository, StringCommand, StringItemRepository,
    StringQuery, UpdateStringRequest,
};
use crate::domain::service_support::map_store_error;
use crate::domain::{
    AccessGate, App, AppScope, Caller, Error, NewStringItem, Page, PageRequest, Role, StringId,
    StringItem,
};

/// Service implementing the string driving ports.
pub struct StringService<A, S, M> {
    access: AccessGate<A, M>,
    strings: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<A, S, M> StringService<A, S, M> {
    /// Create the service over its repositories.
    pub fn new(apps: Arc<A>, strings: Arc<S>, memberships: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            access: AccessGate::new(apps, memberships),
            strings,
            clock,
        }
    }
}

impl<A, S, M> StringService<A, S, M>
where
    A: AppRepository,
    S: StringItemRepository,
    M: MembershipRepository,
{
    async fn load_string(&self, app: &App, string_id: StringId) -> Result<StringItem, Error> {
        let item = self
            .strings
            .find_string(string_id)
            .await
            .map_err(map_store_error)?;
        match item {
            Some(item) if item.app_id == app.id => Ok(item),
            _ => Err(Error::not_found(format!("string {string_id} not found"))),
        }
    }
}

#[async_trait]
impl<A, S, M> StringCommand for StringService<A, S, M>
where
    A: AppRepository,
    S: StringItemRepository,
    M: MembershipRepository,
{
    async fn create_string(&self, request: CreateStringRequest) -> Result<StringItem, Error> {
        let CreateStringRequest {
            caller,
            scope,
            key,
            value,
            additional_columns,
        } = request;
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Member)
            .await?;
        let draft = NewStringItem::draft(
            app.id,
            key,
            value,
            additional_columns,
            caller.user_id,
            self.clock.utc(),
        );
        let item = self
            .strings
            .create_string(draft)
            .await
            .map_err(map_store_error)?;
        debug!(app_id = %app.id, string_id = %item.id, "created string");
        Ok(item)
    }

    async fn update_string(&self, request: UpdateStringRequest) -> Result<StringItem, Error> {
        let UpdateStringRequest {
            caller,
            scope,
            string_id,
            edit,
        } = request;
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Member)
            .await?;
        let current = self.load_string(&app, string_id).await?;
        let patch = edit.into_patch(current.status, caller.user_id, self.clock.utc());
        let updated = self
            .strings
            .update_string(string_id, patch)
            .await
            .map_err(map_store_error)?;
        updated.ok_or_else(|| Error::not_found(format!("string {string_id} not found")))
    }

    async fn delete_string(
        &self,
        caller: Caller,
        scope: AppScope,
        string_id: StringId,
    ) -> Result<(), Error> {
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Member)
            .await?;
        self.load_string(&app, string_id).await?;
        let deleted = self
            .strings
            .delete_string(string_id)
            .await
            .map_err(map_store_error)?;
        if !deleted {
            return Err(Error::not_found(format!("string {string_id} not found")));
        }
        Ok(())
    }

    async fn reset_pending(&self, caller: Caller, scope: AppScope) -> Result<u64, Error> {
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Member)
            .await?;
        let cleared = self
            .strings
            .reset_pending(app.id)
            .await
            .map_err(map_store_error)?;
        info!(app_id = %app.id, cleared, "reset pending changes");
        Ok(cleared)
    }
}

#[async_trait]
impl<A, S, M> StringQuery for StringService<A, S, M>
where
    A: AppRepository,
    S: StringItemRepository,
    M: MembershipRepository,
{
    async fn list_strings(
        &self,
        caller: Caller,
        scope: AppScope,
        page: PageRequest,
    ) -> Result<Page<StringItem>, Error> {
        let app = self
            .access
            .require_app(scope, caller.user_id, Role::Viewer)
            .await?;
        self.strings
            .list_strings(app.id, page)
            .await
            .map_err(map_store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockAppRepository, MockMembershipRepository, MockStringItemRepository,
    };
    use crate::domain::{
        AdditionalColumns, AppId, AppName, ColumnLayout, ErrorCode, INITIAL_VERSION, Membership,
        ProjectId, StringEdit, StringKey, StringStatus, StringValue,
    };
    use crate::test_support::{FixtureClock, caller, fixture_timestamp};
    use rstest::rstest;

    fn scope() -> AppScope {
        AppScope::new(ProjectId::new(1), AppId::new(10))
    }

    fn apps() -> MockAppRepository {
        let mut apps = MockAppRepository::new();
        apps.expect_find_app().returning(|id| {
            Ok(Some(App {
                id,
                project_id: ProjectId::new(1),
                name: AppName::new("Web").expect("name"),
                current_version: INITIAL_VERSION,
                layout: ColumnLayout::default(),
                created_at: fixture_timestamp(),
                updated_at: fixture_timestamp(),
            }))
        });
        apps
    }

    fn members(role: Role) -> MockMembershipRepository {
        let mut memberships = MockMembershipRepository::new();
        memberships
            .expect_find_membership()
            .returning(move |project_id, user_id| {
                Ok(Some(Membership {
                    project_id,
                    user_id,
                    role,
                    created_at: fixture_timestamp(),
                }))
            });
        memberships
    }

    fn stored(app: i64, status: Option<StringStatus>) -> StringItem {
        StringItem {
            id: StringId::new(5),
            app_id: AppId::new(app),
            key: StringKey::new("1").expect("key"),
            value: StringValue::new("Hello").expect("value"),
            additional_columns: AdditionalColumns::new(),
            status,
            modified_at: None,
            modified_by: None,
            created_at: fixture_timestamp(),
        }
    }

    fn service(
        strings: MockStringItemRepository,
        role: Role,
    ) -> StringService<MockAppRepository, MockStringItemRepository, MockMembershipRepository> {
        StringService::new(
            Arc::new(apps()),
            Arc::new(strings),
            Arc::new(members(role)),
            FixtureClock::shared(),
        )
    }

    #[tokio::test]
    async fn created_strings_start_pending_as_new() {
        let mut strings = MockStringItemRepository::new();
        strings
            .expect_create_string()
            .withf(|draft| {
                draft.status == Some(StringStatus::New)
                    && draft.modified_at == Some(fixture_timestamp())
                    && draft.modified_by == Some(caller(1).user_id)
            })
            .returning(|draft| {
                let mut item = stored(10, draft.status);
                item.modified_at = draft.modified_at;
                Ok(item)
            });
        let item = service(strings, Role::Member)
            .create_string(CreateStringRequest {
                caller: caller(1),
                scope: scope(),
                key: StringKey::new("1").expect("key"),
                value: StringValue::new("Hello").expect("value"),
                additional_columns: AdditionalColumns::new(),
            })
            .await
            .expect("created");
        assert_eq!(item.status, Some(StringStatus::New));
    }

    #[rstest]
    #[case(None, StringStatus::Modified)]
    #[case(Some(StringStatus::New), StringStatus::New)]
    #[case(Some(StringStatus::Modified), StringStatus::Modified)]
    #[tokio::test]
    async fn edits_apply_the_status_state_machine(
        #[case] before: Option<StringStatus>,
        #[case] after: StringStatus,
    ) {
        let mut strings = MockStringItemRepository::new();
        strings
            .expect_find_string()
            .returning(move |_| Ok(Some(stored(10, before))));
        strings
            .expect_update_string()
            .withf(move |_, patch| patch.status == after && patch.modified_at == fixture_timestamp())
            .returning(|_, patch| {
                let mut item = stored(10, None);
                patch.apply(&mut item);
                Ok(Some(item))
            });
        let item = service(strings, Role::Member)
            .update_string(UpdateStringRequest {
                caller: caller(1),
                scope: scope(),
                string_id: StringId::new(5),
                edit: StringEdit {
                    value: Some(StringValue::new("Hello again").expect("value")),
                    ..StringEdit::default()
                },
            })
            .await
            .expect("updated");
        assert_eq!(item.status, Some(after));
        assert_eq!(item.value.as_str(), "Hello again");
    }

    #[tokio::test]
    async fn strings_of_other_apps_are_not_found() {
        let mut strings = MockStringItemRepository::new();
        strings
            .expect_find_string()
            .returning(|_| Ok(Some(stored(99, None))));
        strings.expect_delete_string().never();
        let err = service(strings, Role::Admin)
            .delete_string(caller(1), scope(), StringId::new(5))
            .await
            .expect_err("foreign string");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn viewers_cannot_edit() {
        let mut strings = MockStringItemRepository::new();
        strings.expect_create_string().never();
        let err = service(strings, Role::Viewer)
            .reset_pending(caller(1), scope())
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn viewers_can_list() {
        let mut strings = MockStringItemRepository::new();
        strings
            .expect_list_strings()
            .returning(|_, request| Ok(Page::new(vec![stored(10, None)], 1, request)));
        let page = service(strings, Role::Viewer)
            .list_strings(caller(1), scope(), PageRequest::default())
            .await
            .expect("listed");
        assert_eq!(page.total, 1);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn reset_reports_cleared_count() {
        let mut strings = MockStringItemRepository::new();
        strings
            .expect_reset_pending()
            .withf(|app| *app == AppId::new(10))
            .returning(|_| Ok(4));
        let cleared = service(strings, Role::Member)
            .reset_pending(caller(1), scope())
            .await
            .expect("reset");
        assert_eq!(cleared, 4);
    }
}

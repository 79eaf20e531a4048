//! Tests for the project service.

use std::collections::HashMap;
use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockAppRepository, MockMembershipRepository, MockProjectRepository, MockUserRepository,
};
use crate::domain::{
    AppName, AppPatch, ColumnLayout, DisplayName, EmailAddress, ErrorCode, INITIAL_VERSION,
    ProjectName, ProjectPatch, User,
};
use crate::test_support::{caller, fixture_timestamp};

type Service =
    ProjectService<MockProjectRepository, MockAppRepository, MockMembershipRepository, MockUserRepository>;

fn project(id: i64) -> Project {
    Project {
        id: ProjectId::new(id),
        name: ProjectName::new("Mobile").expect("name"),
        description: None,
        created_by: UserId::new(1),
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

fn app(id: i64, project_id: i64) -> App {
    App {
        id: AppId::new(id),
        project_id: ProjectId::new(project_id),
        name: AppName::new("Web").expect("name"),
        current_version: INITIAL_VERSION,
        layout: ColumnLayout::default(),
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

fn membership(user: i64, role: Role) -> Membership {
    Membership {
        project_id: ProjectId::new(1),
        user_id: UserId::new(user),
        role,
        created_at: fixture_timestamp(),
    }
}

/// Membership mock backed by a fixed role table for project 1.
fn memberships(roles: &[(i64, Role)]) -> MockMembershipRepository {
    let table: HashMap<i64, Role> = roles.iter().copied().collect();
    let listed: Vec<Membership> = roles
        .iter()
        .map(|(user, role)| membership(*user, *role))
        .collect();
    let mut mock = MockMembershipRepository::new();
    mock.expect_find_membership().returning(move |_, user| {
        Ok(table.get(&user.get()).map(|role| membership(user.get(), *role)))
    });
    mock.expect_list_memberships()
        .returning(move |_| Ok(listed.clone()));
    mock
}

fn projects_with_one() -> MockProjectRepository {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_project()
        .returning(|id| Ok((id == ProjectId::new(1)).then(|| project(1))));
    projects
}

fn users_with_any() -> MockUserRepository {
    let mut users = MockUserRepository::new();
    users.expect_find_user().returning(|id| {
        Ok(Some(User {
            id,
            email: EmailAddress::new(format!("user{id}@example.com")).expect("email"),
            name: DisplayName::new("Someone").expect("name"),
            avatar_url: None,
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        }))
    });
    users
}

fn service(
    projects: MockProjectRepository,
    apps: MockAppRepository,
    memberships: MockMembershipRepository,
) -> Service {
    ProjectService::new(
        Arc::new(projects),
        Arc::new(apps),
        Arc::new(memberships),
        Arc::new(users_with_any()),
    )
}

#[tokio::test]
async fn create_project_trims_description_and_records_creator() {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_create_project()
        .withf(|new| {
            new.description.as_deref() == Some("Client strings")
                && new.created_by == UserId::new(1)
        })
        .returning(|new| {
            let mut created = project(1);
            created.description = new.description;
            Ok(created)
        });
    let created = service(projects, MockAppRepository::new(), memberships(&[]))
        .create_project(CreateProjectRequest {
            caller: caller(1),
            name: ProjectName::new("Mobile").expect("name"),
            description: Some("  Client strings ".to_owned()),
        })
        .await
        .expect("created");
    assert_eq!(created.description.as_deref(), Some("Client strings"));
}

#[rstest]
#[case(Role::Member, false)]
#[case(Role::Admin, true)]
#[case(Role::Owner, true)]
#[tokio::test]
async fn update_project_requires_admin(#[case] role: Role, #[case] allowed: bool) {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_update_project()
        .times(usize::from(allowed))
        .returning(|_, _| Ok(Some(project(1))));
    let result = service(projects, MockAppRepository::new(), memberships(&[(1, role)]))
        .update_project(UpdateProjectRequest {
            caller: caller(1),
            project_id: ProjectId::new(1),
            patch: ProjectPatch::default(),
        })
        .await;
    match result {
        Ok(_) => assert!(allowed),
        Err(err) => {
            assert!(!allowed);
            assert_eq!(err.code(), ErrorCode::Forbidden);
        }
    }
}

#[tokio::test]
async fn delete_project_requires_owner() {
    let mut projects = MockProjectRepository::new();
    projects.expect_delete_project().never();
    let err = service(projects, MockAppRepository::new(), memberships(&[(1, Role::Admin)]))
        .delete_project(caller(1), ProjectId::new(1))
        .await
        .expect_err("admins cannot delete");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn last_owner_cannot_be_demoted() {
    let mut members = memberships(&[(1, Role::Owner), (2, Role::Member)]);
    members.expect_upsert_membership().never();
    let err = service(projects_with_one(), MockAppRepository::new(), members)
        .set_member_role(SetMemberRoleRequest {
            caller: caller(1),
            project_id: ProjectId::new(1),
            user_id: UserId::new(1),
            role: Role::Admin,
        })
        .await
        .expect_err("last owner");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn owners_can_be_demoted_when_another_remains() {
    let mut members = memberships(&[(1, Role::Owner), (2, Role::Owner)]);
    members
        .expect_upsert_membership()
        .times(1)
        .returning(|_, user, role| Ok(membership(user.get(), role)));
    let updated = service(projects_with_one(), MockAppRepository::new(), members)
        .set_member_role(SetMemberRoleRequest {
            caller: caller(1),
            project_id: ProjectId::new(1),
            user_id: UserId::new(2),
            role: Role::Viewer,
        })
        .await
        .expect("demoted");
    assert_eq!(updated.role, Role::Viewer);
}

#[tokio::test]
async fn admins_cannot_grant_ownership() {
    let mut members = memberships(&[(1, Role::Admin), (2, Role::Member)]);
    members.expect_upsert_membership().never();
    let err = service(projects_with_one(), MockAppRepository::new(), members)
        .set_member_role(SetMemberRoleRequest {
            caller: caller(1),
            project_id: ProjectId::new(1),
            user_id: UserId::new(2),
            role: Role::Owner,
        })
        .await
        .expect_err("owner only");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn admins_can_add_members() {
    let mut members = memberships(&[(1, Role::Admin)]);
    members
        .expect_upsert_membership()
        .times(1)
        .returning(|_, user, role| Ok(membership(user.get(), role)));
    let added = service(projects_with_one(), MockAppRepository::new(), members)
        .set_member_role(SetMemberRoleRequest {
            caller: caller(1),
            project_id: ProjectId::new(1),
            user_id: UserId::new(3),
            role: Role::Member,
        })
        .await
        .expect("added");
    assert_eq!(added.user_id, UserId::new(3));
}

#[tokio::test]
async fn last_owner_cannot_be_removed() {
    let mut members = memberships(&[(1, Role::Owner)]);
    members.expect_remove_membership().never();
    let err = service(projects_with_one(), MockAppRepository::new(), members)
        .remove_member(caller(1), ProjectId::new(1), UserId::new(1))
        .await
        .expect_err("last owner");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn removing_a_non_member_is_not_found() {
    let err = service(
        projects_with_one(),
        MockAppRepository::new(),
        memberships(&[(1, Role::Admin)]),
    )
    .remove_member(caller(1), ProjectId::new(1), UserId::new(9))
    .await
    .expect_err("not a member");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn create_app_trims_the_column_layout() {
    let mut apps = MockAppRepository::new();
    apps.expect_create_app()
        .withf(|new| {
            new.layout.columns.as_deref()
                == Some(&["Key".to_owned(), "Korean".to_owned()][..])
                && new.layout.key_column.as_deref() == Some("Key")
                && new.layout.value_column.is_none()
        })
        .returning(|new| {
            let mut created = app(10, 1);
            created.layout = new.layout;
            Ok(created)
        });
    let created = service(projects_with_one(), apps, memberships(&[(1, Role::Member)]))
        .create_app(CreateAppRequest {
            caller: caller(1),
            project_id: ProjectId::new(1),
            name: AppName::new("Web").expect("name"),
            layout: ColumnLayout {
                columns: Some(vec![" Key ".to_owned(), "  ".to_owned(), "Korean".to_owned()]),
                key_column: Some(" Key".to_owned()),
                value_column: Some("   ".to_owned()),
            },
        })
        .await
        .expect("created");
    assert_eq!(created.current_version, INITIAL_VERSION);
}

#[tokio::test]
async fn update_app_rejects_apps_of_other_projects() {
    let mut apps = MockAppRepository::new();
    apps.expect_find_app().returning(|_| Ok(Some(app(10, 2))));
    apps.expect_update_app().never();
    let err = service(projects_with_one(), apps, memberships(&[(1, Role::Owner)]))
        .update_app(UpdateAppRequest {
            caller: caller(1),
            scope: AppScope::new(ProjectId::new(1), AppId::new(10)),
            patch: AppPatch::default(),
        })
        .await
        .expect_err("foreign app");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn list_projects_attaches_apps() {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_list_projects_for_user()
        .returning(|_| Ok(vec![project(1), project(2)]));
    let mut apps = MockAppRepository::new();
    apps.expect_list_apps().returning(|project_id| {
        Ok(if project_id == ProjectId::new(1) {
            vec![app(10, 1), app(11, 1)]
        } else {
            Vec::new()
        })
    });
    let summaries = service(projects, apps, memberships(&[]))
        .list_projects(caller(1))
        .await
        .expect("listed");
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].apps.len(), 2);
    assert!(summaries[1].apps.is_empty());
}

#[tokio::test]
async fn get_project_requires_membership() {
    let err = service(projects_with_one(), MockAppRepository::new(), memberships(&[]))
        .get_project(caller(1), ProjectId::new(1))
        .await
        .expect_err("no membership");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

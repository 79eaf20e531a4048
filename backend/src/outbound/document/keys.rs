//! Key layout of the document store.
//!
//! Every record is a JSON document at `sm:{kind}:{id}`. Secondary indexes are
//! sorted sets hanging off the owning record's key, scored by the member's
//! id (or version number), so range reads come back in ascending order.

use crate::domain::{AppId, EmailAddress, ProjectId, StringId, UserId, VersionId};

const PREFIX: &str = "sm";

/// Record kinds with their own id counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    User,
    Project,
    App,
    String,
    Version,
}

impl Kind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::App => "app",
            Self::String => "string",
            Self::Version => "version",
        }
    }
}

pub(crate) fn counter(kind: Kind) -> String {
    format!("{PREFIX}:counter:{}", kind.as_str())
}

pub(crate) fn user(id: UserId) -> String {
    format!("{PREFIX}:user:{id}")
}

/// Unique email lookup; holds the owning user id.
pub(crate) fn user_email(email: &EmailAddress) -> String {
    format!("{PREFIX}:user-email:{email}")
}

/// Every user id, for counting.
pub(crate) fn users_index() -> String {
    format!("{PREFIX}:users")
}

/// Projects the user belongs to.
pub(crate) fn user_projects(id: UserId) -> String {
    format!("{}:projects", user(id))
}

pub(crate) fn project(id: ProjectId) -> String {
    format!("{PREFIX}:project:{id}")
}

pub(crate) fn project_members(id: ProjectId) -> String {
    format!("{}:members", project(id))
}

pub(crate) fn project_apps(id: ProjectId) -> String {
    format!("{}:apps", project(id))
}

pub(crate) fn membership(project: ProjectId, user: UserId) -> String {
    format!("{PREFIX}:membership:{project}:{user}")
}

pub(crate) fn app(id: AppId) -> String {
    format!("{PREFIX}:app:{id}")
}

pub(crate) fn app_strings(id: AppId) -> String {
    format!("{}:strings", app(id))
}

/// Versions of an app, scored by version number.
pub(crate) fn app_versions(id: AppId) -> String {
    format!("{}:versions", app(id))
}

pub(crate) fn string(id: StringId) -> String {
    format!("{PREFIX}:string:{id}")
}

pub(crate) fn version(id: VersionId) -> String {
    format!("{PREFIX}:version:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn record_keys_follow_kind_and_id() {
        assert_eq!(user(UserId::new(3)), "sm:user:3");
        assert_eq!(project(ProjectId::new(4)), "sm:project:4");
        assert_eq!(app(AppId::new(5)), "sm:app:5");
        assert_eq!(string(StringId::new(6)), "sm:string:6");
        assert_eq!(version(VersionId::new(7)), "sm:version:7");
    }

    #[rstest]
    fn indexes_hang_off_their_owner() {
        assert_eq!(project_members(ProjectId::new(1)), "sm:project:1:members");
        assert_eq!(project_apps(ProjectId::new(1)), "sm:project:1:apps");
        assert_eq!(app_strings(AppId::new(2)), "sm:app:2:strings");
        assert_eq!(app_versions(AppId::new(2)), "sm:app:2:versions");
        assert_eq!(user_projects(UserId::new(9)), "sm:user:9:projects");
        assert_eq!(membership(ProjectId::new(1), UserId::new(9)), "sm:membership:1:9");
    }

    #[rstest]
    #[case(Kind::User, "sm:counter:user")]
    #[case(Kind::Version, "sm:counter:version")]
    fn counters_are_per_kind(#[case] kind: Kind, #[case] expected: &str) {
        assert_eq!(counter(kind), expected);
    }

    #[rstest]
    fn email_keys_ignore_case() {
        let email = EmailAddress::new("Admin@Example.com").expect("email");
        assert_eq!(user_email(&email), "sm:user-email:admin@example.com");
    }
}

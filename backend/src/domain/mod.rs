//! Domain primitives, aggregates and services.
//!
//! Purpose: model projects, apps and their translatable string tables, track
//! unpublished changes, and publish immutable versions. Everything here is
//! independent of HTTP and storage; adapters reach the domain through the
//! traits in [`ports`].
//!
//! Public surface:
//! - Entities: [`User`], [`Project`], [`Membership`], [`App`],
//!   [`StringItem`], [`Version`].
//! - Pending-change view: [`pending_changes`], [`notifications`].
//! - Access checks: [`AccessGate`].
//! - Services: [`ProjectService`], [`StringService`], [`VersionService`],
//!   [`SampleDataSeeder`].
//! - Errors: [`Error`] and [`ErrorCode`].

pub mod access;
pub mod app;
pub mod app_locks;
pub mod caller;
pub mod error;
pub mod ids;
pub mod membership;
pub mod pagination;
pub mod pending;
pub mod ports;
pub mod project;
pub mod project_service;
pub mod sample_data;
pub(crate) mod service_support;
pub mod snapshot_policy;
pub mod string_item;
pub mod string_service;
pub mod text;
pub mod trace_id;
pub mod user;
pub mod version;
pub mod version_service;

pub use self::access::AccessGate;
pub use self::app::{App, AppPatch, AppScope, ColumnLayout, INITIAL_VERSION, NewApp};
pub use self::app_locks::{AppLockGuard, AppLocks};
pub use self::caller::Caller;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::ids::{AppId, ProjectId, RecordIdParseError, StringId, UserId, VersionId};
pub use self::membership::{Membership, ParseRoleError, Role};
pub use self::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
pub use self::pending::{PendingChange, notifications, pending_changes, string_number};
pub use self::project::{NewProject, Project, ProjectPatch};
pub use self::project_service::ProjectService;
pub use self::sample_data::{BootstrapOutcome, SampleDataSeeder};
pub use self::service_support::validation_error;
pub use self::snapshot_policy::{
    ConstrainedSnapshots, DEFAULT_LARGE_APP_THRESHOLD, SnapshotPolicy,
};
pub use self::string_item::{
    AdditionalColumns, NewStringItem, StringEdit, StringItem, StringPatch, StringStatus,
};
pub use self::string_service::StringService;
pub use self::text::{
    AppName, DisplayName, EmailAddress, ProjectName, StringKey, StringValue, TextValidationError,
    optional_text,
};
pub use self::trace_id::TraceId;
pub use self::user::{NewUser, User, UserPatch};
pub use self::version::{
    ChangeLabel, NewVersion, Notification, PendingMarker, Publication, PublicationOutcome,
    SnapshotEntry, SnapshotFidelity, Version, VersionSnapshot,
};
pub use self::version_service::VersionService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use string_manager::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

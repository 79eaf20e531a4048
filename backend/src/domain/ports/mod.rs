//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe the storage the domain needs: one repository trait
//! per aggregate plus the snapshot archive. Driving ports are the use-cases
//! inbound adapters call. Driven ports return typed port errors; driving ports
//! return [`crate::domain::Error`].

mod macros;
pub(crate) use macros::define_port_error;

mod app_repository;
mod membership_repository;
mod project_command;
mod project_query;
mod project_repository;
mod record_store;
mod snapshot_archive;
mod string_command;
mod string_item_repository;
mod string_query;
mod user_repository;
mod version_command;
mod version_query;
mod version_repository;

#[cfg(test)]
pub use app_repository::MockAppRepository;
pub use app_repository::AppRepository;
#[cfg(test)]
pub use membership_repository::MockMembershipRepository;
pub use membership_repository::MembershipRepository;
#[cfg(test)]
pub use project_command::MockProjectCommand;
pub use project_command::{
    CreateAppRequest, CreateProjectRequest, ProjectCommand, SetMemberRoleRequest,
    UpdateAppRequest, UpdateProjectRequest,
};
#[cfg(test)]
pub use project_query::MockProjectQuery;
pub use project_query::{ProjectDetails, ProjectQuery, ProjectSummary};
#[cfg(test)]
pub use project_repository::MockProjectRepository;
pub use project_repository::ProjectRepository;
pub use record_store::{RecordStore, RecordStoreError};
#[cfg(test)]
pub use snapshot_archive::MockSnapshotArchive;
pub use snapshot_archive::{ArchiveUsage, SnapshotArchive, SnapshotArchiveError, SnapshotKey};
#[cfg(test)]
pub use string_command::MockStringCommand;
pub use string_command::{CreateStringRequest, StringCommand, UpdateStringRequest};
#[cfg(test)]
pub use string_item_repository::MockStringItemRepository;
pub use string_item_repository::StringItemRepository;
#[cfg(test)]
pub use string_query::MockStringQuery;
pub use string_query::StringQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
#[cfg(test)]
pub use version_command::MockVersionCommand;
pub use version_command::{PublishRequest, VersionCommand};
#[cfg(test)]
pub use version_query::MockVersionQuery;
pub use version_query::VersionQuery;
#[cfg(test)]
pub use version_repository::MockVersionRepository;
pub use version_repository::VersionRepository;

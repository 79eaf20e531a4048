//! Driving port for project and app reads.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{App, AppScope, Caller, Error, Membership, Project, ProjectId};

/// A project with its apps, as listed for a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub apps: Vec<App>,
}

/// A project with its apps and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,
    pub apps: Vec<App>,
    pub members: Vec<Membership>,
}

/// Project and app read use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectQuery: Send + Sync {
    /// Projects the caller belongs to, each with its apps.
    async fn list_projects(&self, caller: Caller) -> Result<Vec<ProjectSummary>, Error>;

    /// One project with apps and members. Requires viewer.
    async fn get_project(
        &self,
        caller: Caller,
        project_id: ProjectId,
    ) -> Result<ProjectDetails, Error>;

    /// One app. Requires viewer.
    async fn get_app(&self, caller: Caller, scope: AppScope) -> Result<App, Error>;
}

//! Projects group apps and carry the membership table used for access checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProjectId, ProjectName, UserId};

/// A project owned by its creator.
///
/// ## Invariants
/// - At least one membership with [`crate::domain::Role::Owner`] exists. The
///   creator's owner membership is written together with the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: ProjectName,
    pub description: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: ProjectName,
    pub description: Option<String>,
    pub created_by: UserId,
}

/// Mutable project fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<ProjectName>,
    pub description: Option<String>,
}

impl ProjectPatch {
    /// Apply the patch to a stored project, bumping `updated_at`.
    pub fn apply(self, project: &mut Project, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = Some(description);
        }
        project.updated_at = now;
    }
}

//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    ProjectCommand, ProjectQuery, RecordStore, StringCommand, StringQuery, VersionCommand,
    VersionQuery,
};
use crate::domain::{ProjectService, SnapshotPolicy, StringService, VersionService};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub projects: Arc<dyn ProjectCommand>,
    pub projects_query: Arc<dyn ProjectQuery>,
    pub strings: Arc<dyn StringCommand>,
    pub strings_query: Arc<dyn StringQuery>,
    pub versions: Arc<dyn VersionCommand>,
    pub versions_query: Arc<dyn VersionQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub projects: Arc<dyn ProjectCommand>,
    pub projects_query: Arc<dyn ProjectQuery>,
    pub strings: Arc<dyn StringCommand>,
    pub strings_query: Arc<dyn StringQuery>,
    pub versions: Arc<dyn VersionCommand>,
    pub versions_query: Arc<dyn VersionQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from explicit port implementations.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            projects,
            projects_query,
            strings,
            strings_query,
            versions,
            versions_query,
        } = ports;
        Self {
            projects,
            projects_query,
            strings,
            strings_query,
            versions,
            versions_query,
        }
    }

    /// Wire every service over one record store backend.
    ///
    /// The project and string services are each shared between their
    /// command and query ports so per-app publish locks stay process-wide.
    pub fn for_store<S>(store: Arc<S>, policy: SnapshotPolicy, clock: Arc<dyn Clock>) -> Self
    where
        S: RecordStore + 'static,
    {
        let projects = Arc::new(ProjectService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
        ));
        let strings = Arc::new(StringService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&clock),
        ));
        let versions = Arc::new(VersionService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            store,
            policy,
            clock,
        ));
        Self::new(HttpStatePorts {
            projects: projects.clone(),
            projects_query: projects,
            strings: strings.clone(),
            strings_query: strings,
            versions: versions.clone(),
            versions_query: versions,
        })
    }
}

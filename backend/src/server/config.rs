//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use string_manager::config::{BackendSettings, ServiceSettings, SnapshotSettings};

/// Identity every request acts as, plus the sample data switch.
#[derive(Debug, Clone)]
pub(crate) struct DefaultIdentity {
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) seed_sample_data: bool,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) backend: BackendSettings,
    pub(crate) snapshots: SnapshotSettings,
    pub(crate) identity: DefaultIdentity,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ServerConfig {
    /// Construct a server configuration from validated settings.
    #[must_use]
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            bind_addr: settings.bind_addr,
            backend: settings.backend,
            snapshots: settings.snapshots,
            identity: DefaultIdentity {
                email: settings.default_user_email,
                name: settings.default_user_name,
                seed_sample_data: settings.seed_sample_data,
            },
            clock: Arc::new(DefaultClock),
        }
    }

    /// Replace the wall clock used for timestamps.
    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "Exercised by server tests with a fixed clock")
    )]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Short name of the configured record store.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

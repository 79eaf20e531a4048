//! Service settings loaded via OrthoConfig.
//!
//! Values come from (in increasing precedence) defaults, a configuration
//! file, `STRING_MANAGER_*` environment variables and command-line flags.
//! [`AppSettings`] holds the raw layered values; [`AppSettings::resolve`]
//! validates them into [`ServiceSettings`] so that a typo in an enumerated
//! value stops start-up instead of silently falling back.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_LARGE_APP_THRESHOLD;
use crate::outbound::snapshot_archive::{DEFAULT_HISTORY_PER_APP, DEFAULT_QUOTA_BYTES};

const DEFAULT_DATA_FILE: &str = "data/memory-db.json";
const DEFAULT_ARCHIVE_FILE: &str = "data/snapshot-archive.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_USER_EMAIL: &str = "admin@example.com";
const DEFAULT_USER_NAME: &str = "Admin User";

/// Raw layered settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STRING_MANAGER")]
pub struct AppSettings {
    /// Record store backend: `memory`, `postgres` or `redis`.
    pub backend: Option<String>,
    /// JSON snapshot file for the memory backend.
    pub data_file: Option<PathBuf>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Redis connection URL.
    pub redis_url: Option<String>,
    /// Listen address.
    pub bind_addr: Option<String>,
    /// Snapshot policy: `full` or `constrained`.
    pub snapshot_policy: Option<String>,
    /// Archive capacity under the constrained policy.
    pub snapshot_quota_bytes: Option<u64>,
    /// String count above which constrained snapshots keep only pending entries.
    pub large_app_threshold: Option<usize>,
    /// Archived snapshots retained per app under the constrained policy.
    pub history_per_app: Option<usize>,
    /// JSON file backing the snapshot archive under the constrained policy.
    pub snapshot_archive_file: Option<PathBuf>,
    /// Seed a sample project when the store holds no users.
    pub seed_sample_data: Option<bool>,
    /// Email of the fixed caller identity.
    pub default_user_email: Option<String>,
    /// Display name of the fixed caller identity.
    pub default_user_name: Option<String>,
}

/// Errors raised while validating settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The backend name is not one of the supported stores.
    #[error("unknown backend `{0}`; expected memory, postgres or redis")]
    UnknownBackend(String),
    /// The snapshot policy name is not recognised.
    #[error("unknown snapshot policy `{0}`; expected full or constrained")]
    UnknownSnapshotPolicy(String),
    /// A backend was selected without its connection URL.
    #[error("backend `{backend}` requires STRING_MANAGER_{variable}")]
    MissingUrl {
        backend: &'static str,
        variable: &'static str,
    },
    /// The listen address does not parse.
    #[error("invalid bind address `{value}`: {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Selected record store and its connection details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSettings {
    Memory { data_file: PathBuf },
    Postgres { database_url: String },
    Redis { redis_url: String },
}

impl BackendSettings {
    /// Short backend name for logs and health probes.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory { .. } => "memory",
            Self::Postgres { .. } => "postgres",
            Self::Redis { .. } => "redis",
        }
    }
}

/// Snapshot policy and its limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSettings {
    Full,
    Constrained {
        quota_bytes: u64,
        large_app_threshold: usize,
        history_per_app: usize,
        archive_file: PathBuf,
    },
}

/// Validated settings used by the composition root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub backend: BackendSettings,
    pub bind_addr: SocketAddr,
    pub snapshots: SnapshotSettings,
    pub seed_sample_data: bool,
    pub default_user_email: String,
    pub default_user_name: String,
}

fn normalised(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .to_ascii_lowercase()
}

fn required_url(
    value: Option<&String>,
    backend: &'static str,
    variable: &'static str,
) -> Result<String, ConfigError> {
    value
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::MissingUrl { backend, variable })
}

impl AppSettings {
    fn backend(&self) -> Result<BackendSettings, ConfigError> {
        match normalised(self.backend.as_deref(), "memory").as_str() {
            "memory" => Ok(BackendSettings::Memory {
                data_file: self
                    .data_file
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
            }),
            "postgres" => Ok(BackendSettings::Postgres {
                database_url: required_url(self.database_url.as_ref(), "postgres", "DATABASE_URL")?,
            }),
            "redis" => Ok(BackendSettings::Redis {
                redis_url: required_url(self.redis_url.as_ref(), "redis", "REDIS_URL")?,
            }),
            other => Err(ConfigError::UnknownBackend(other.to_owned())),
        }
    }

    fn snapshots(&self) -> Result<SnapshotSettings, ConfigError> {
        match normalised(self.snapshot_policy.as_deref(), "full").as_str() {
            "full" => Ok(SnapshotSettings::Full),
            "constrained" => Ok(SnapshotSettings::Constrained {
                quota_bytes: self.snapshot_quota_bytes.unwrap_or(DEFAULT_QUOTA_BYTES),
                large_app_threshold: self
                    .large_app_threshold
                    .unwrap_or(DEFAULT_LARGE_APP_THRESHOLD),
                history_per_app: self.history_per_app.unwrap_or(DEFAULT_HISTORY_PER_APP),
                archive_file: self
                    .snapshot_archive_file
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_FILE)),
            }),
            other => Err(ConfigError::UnknownSnapshotPolicy(other.to_owned())),
        }
    }

    /// Validate the layered values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unknown enumerated values, a missing
    /// connection URL or an unparsable bind address.
    pub fn resolve(&self) -> Result<ServiceSettings, ConfigError> {
        let bind_addr = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        Ok(ServiceSettings {
            backend: self.backend()?,
            bind_addr: bind_addr
                .parse()
                .map_err(|source| ConfigError::InvalidBindAddr {
                    value: bind_addr.to_owned(),
                    source,
                })?,
            snapshots: self.snapshots()?,
            seed_sample_data: self.seed_sample_data.unwrap_or(true),
            default_user_email: self
                .default_user_email
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_EMAIL.to_owned()),
            default_user_name: self
                .default_user_name
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_owned()),
        })
    }
}

//! Builders for the record store and the HTTP state wired over it.

use std::io;
use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use string_manager::config::{BackendSettings, SnapshotSettings};
use string_manager::domain::ports::RecordStore;
use string_manager::domain::{Caller, ConstrainedSnapshots, SampleDataSeeder, SnapshotPolicy};
use string_manager::inbound::http::state::HttpState;
use string_manager::outbound::document::RedisRecordStore;
use string_manager::outbound::memory::{MemoryRecordStore, SnapshotFile};
use string_manager::outbound::persistence::{DbPool, DieselRecordStore, PoolConfig};
use string_manager::outbound::snapshot_archive::QuotaSnapshotArchive;

use super::ServerConfig;
use super::config::DefaultIdentity;

/// Services plus the caller identity every request acts as.
pub(crate) struct ServerState {
    pub(crate) http_state: HttpState,
    pub(crate) caller: Caller,
}

fn snapshot_policy(settings: &SnapshotSettings) -> io::Result<SnapshotPolicy> {
    match settings {
        SnapshotSettings::Full => Ok(SnapshotPolicy::Full),
        SnapshotSettings::Constrained {
            quota_bytes,
            large_app_threshold,
            history_per_app,
            archive_file,
        } => {
            let archive = QuotaSnapshotArchive::open(
                SnapshotFile::new(archive_file),
                *quota_bytes,
                *history_per_app,
            )
            .map_err(io::Error::other)?;
            Ok(SnapshotPolicy::Constrained(ConstrainedSnapshots::new(
                *large_app_threshold,
                Arc::new(archive),
            )))
        }
    }
}

/// Bootstrap the default user and wire every service over `store`.
async fn wire_store<S>(
    store: Arc<S>,
    policy: SnapshotPolicy,
    clock: Arc<dyn Clock>,
    identity: &DefaultIdentity,
) -> io::Result<ServerState>
where
    S: RecordStore + 'static,
{
    let outcome = SampleDataSeeder::new(Arc::clone(&store))
        .bootstrap(&identity.email, &identity.name, identity.seed_sample_data)
        .await
        .map_err(|err| io::Error::other(format!("bootstrap failed: {err}")))?;
    info!(
        user_id = outcome.user.id.get(),
        seeded = outcome.seeded,
        "default user ready"
    );
    Ok(ServerState {
        http_state: HttpState::for_store(store, policy, clock),
        caller: Caller::from(&outcome.user),
    })
}

/// Open the configured backend and build the HTTP state over it.
///
/// # Errors
///
/// Returns [`io::Error`] when the backend cannot be opened or the default
/// user cannot be bootstrapped.
pub(crate) async fn build_server_state(config: &ServerConfig) -> io::Result<ServerState> {
    let clock = Arc::clone(&config.clock);
    let policy = snapshot_policy(&config.snapshots)?;
    match &config.backend {
        BackendSettings::Memory { data_file } => {
            let store = MemoryRecordStore::open(SnapshotFile::new(data_file), Arc::clone(&clock))
                .map_err(io::Error::other)?;
            wire_store(Arc::new(store), policy, clock, &config.identity).await
        }
        BackendSettings::Postgres { database_url } => {
            let pool = DbPool::connect(PoolConfig::new(database_url.as_str()))
                .await
                .map_err(io::Error::other)?;
            let store = DieselRecordStore::new(pool, Arc::clone(&clock));
            wire_store(Arc::new(store), policy, clock, &config.identity).await
        }
        BackendSettings::Redis { redis_url } => {
            let store = RedisRecordStore::connect(redis_url, Arc::clone(&clock))
                .await
                .map_err(io::Error::other)?;
            wire_store(Arc::new(store), policy, clock, &config.identity).await
        }
    }
}

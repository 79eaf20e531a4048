//! Service entry-point: loads settings, opens the record store and serves
//! the REST API with OpenAPI docs.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use string_manager::config::AppSettings;
use string_manager::inbound::http::health::HealthState;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?
        .resolve()
        .map_err(std::io::Error::other)?;
    let config = ServerConfig::new(settings);
    info!(
        backend = config.backend_name(),
        bind_addr = %config.bind_addr(),
        "starting string manager"
    );

    let health_state = web::Data::new(HealthState::new(config.backend_name()));
    let server = create_server(health_state, config).await?;
    server.await
}

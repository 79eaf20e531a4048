//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_server_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use string_manager::Trace;
#[cfg(debug_assertions)]
use string_manager::doc::ApiDoc;
use string_manager::domain::Caller;
use string_manager::inbound::http::health::HealthState;
use string_manager::inbound::http::routes;
use string_manager::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    caller: web::Data<Caller>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        caller,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(caller)
        .wrap(Trace)
        .configure(routes::configure);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Opens the configured record store, bootstraps the default user and binds
/// the listener. Readiness is flagged only once all of that succeeded.
///
/// # Errors
/// Propagates [`std::io::Error`] when the store cannot be opened, the default
/// user cannot be created or the socket cannot be bound.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let state = build_server_state(&config).await?;
    let http_state = web::Data::new(state.http_state);
    let caller = web::Data::new(state.caller);
    let bind_addr = config.bind_addr();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            caller: caller.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Wiring tests over a file-backed memory store.

    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::Value;
    use string_manager::config::{BackendSettings, ServiceSettings, SnapshotSettings};
    use string_manager::test_support::FixtureClock;

    fn settings(data_file: std::path::PathBuf) -> ServiceSettings {
        ServiceSettings {
            backend: BackendSettings::Memory { data_file },
            bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
            snapshots: SnapshotSettings::Full,
            seed_sample_data: true,
            default_user_email: "admin@example.com".to_owned(),
            default_user_name: "Admin User".to_owned(),
        }
    }

    async fn deps_for(config: &ServerConfig) -> AppDependencies {
        let state = build_server_state(config).await.expect("server state");
        let health_state = web::Data::new(HealthState::new(config.backend_name()));
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: web::Data::new(state.http_state),
            caller: web::Data::new(state.caller),
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn seeded_store_serves_the_sample_project() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = ServerConfig::new(settings(dir.path().join("memory-db.json")))
            .with_clock(FixtureClock::shared());
        let app = test::init_service(build_app(deps_for(&config).await)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/projects").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        let projects = body["data"].as_array().expect("project list");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["name"], "샘플 프로젝트");

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["backend"], "memory");
    }

    #[rstest]
    #[actix_web::test]
    async fn restarting_reuses_the_snapshot_without_reseeding() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("memory-db.json");

        let first = ServerConfig::new(settings(path.clone())).with_clock(FixtureClock::shared());
        drop(build_server_state(&first).await.expect("first start"));
        assert!(path.exists());

        let second = ServerConfig::new(settings(path)).with_clock(FixtureClock::shared());
        let app = test::init_service(build_app(deps_for(&second).await)).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/projects").to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    }
}

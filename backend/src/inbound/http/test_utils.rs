//! Test helpers for inbound HTTP components.
//!
//! Handlers are exercised end to end against the in-memory record store, so
//! these helpers build the real services rather than mocks.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use crate::domain::ports::{MembershipRepository, UserRepository};
use crate::domain::{
    Caller, DisplayName, EmailAddress, NewUser, ProjectId, Role, SampleDataSeeder, SnapshotPolicy,
};
use crate::inbound::http::health::HealthState;
use crate::inbound::http::routes;
use crate::inbound::http::state::HttpState;
use crate::middleware::Trace;
use crate::outbound::memory::MemoryRecordStore;
use crate::test_support::FixtureClock;

/// Shared store plus the bootstrapped default caller.
pub(crate) struct TestApi {
    pub(crate) store: Arc<MemoryRecordStore>,
    pub(crate) state: HttpState,
    pub(crate) owner: Caller,
}

impl TestApi {
    /// Empty store with one default user and no sample data.
    pub(crate) async fn new() -> Self {
        let clock = FixtureClock::shared();
        let store = Arc::new(MemoryRecordStore::ephemeral(Arc::clone(&clock)));
        let outcome = SampleDataSeeder::new(Arc::clone(&store))
            .bootstrap("admin@example.com", "Admin User", false)
            .await
            .expect("bootstrap default user");
        let state = HttpState::for_store(Arc::clone(&store), SnapshotPolicy::Full, clock);
        Self {
            store,
            state,
            owner: Caller::from(&outcome.user),
        }
    }

    /// Create another user and give them `role` on `project`.
    pub(crate) async fn member(&self, project: ProjectId, role: Role, name: &str) -> Caller {
        let user = self
            .store
            .create_user(NewUser {
                email: EmailAddress::new(format!("{name}@example.com")).expect("email"),
                name: DisplayName::new(name).expect("name"),
                avatar_url: None,
            })
            .await
            .expect("create user");
        self.store
            .upsert_membership(project, user.id, role)
            .await
            .expect("membership");
        Caller::from(&user)
    }

    /// Create a project and an app through the API; returns their ids.
    pub(crate) async fn project_with_app(&self) -> (i64, i64) {
        let app = self.service(&self.owner).await;
        let (_, body) = call_json(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/projects")
                .set_json(json!({"name": "Localisation"})),
        )
        .await;
        let project = body["data"]["id"].as_i64().expect("project id");
        let (_, body) = call_json(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/projects/{project}/apps"))
                .set_json(json!({"name": "Main"})),
        )
        .await;
        (project, body["data"]["id"].as_i64().expect("app id"))
    }

    /// Initialise the full route table acting as `caller`.
    pub(crate) async fn service(
        &self,
        caller: &Caller,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
        let health = HealthState::new("memory");
        health.mark_ready();
        actix_test::init_service(
            App::new()
                .wrap(Trace)
                .app_data(web::Data::new(self.state.clone()))
                .app_data(web::Data::new(caller.clone()))
                .app_data(web::Data::new(health))
                .configure(routes::configure),
        )
        .await
    }
}

/// Send a request and decode the JSON response body.
pub(crate) async fn call_json(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    request: actix_test::TestRequest,
) -> (actix_web::http::StatusCode, Value) {
    let response = actix_test::call_service(app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body_json(response).await;
    (status, body)
}

//! Handler tests for projects, members and apps.

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use rstest::rstest;
use serde_json::json;

use crate::domain::{ProjectId, Role};
use crate::inbound::http::test_utils::{TestApi, call_json};

async fn create_project(api: &TestApi) -> i64 {
    let app = api.service(&api.owner).await;
    let (status, body) = call_json(
        &app,
        TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(json!({"name": "  Mobile  ", "description": "iOS and Android"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_i64().expect("project id")
}

#[rstest]
#[actix_web::test]
async fn created_projects_are_listed_with_their_apps() {
    let api = TestApi::new().await;
    let project = create_project(&api).await;
    let app = api.service(&api.owner).await;

    let (status, body) = call_json(
        &app,
        TestRequest::post()
            .uri(&format!("/api/v1/projects/{project}/apps"))
            .set_json(json!({"name": "iOS", "columns": ["Key", " Value ", ""], "keyColumn": "Key"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["currentVersion"], 1);
    assert_eq!(body["data"]["columns"], json!(["Key", "Value"]));

    let (status, body) = call_json(&app, TestRequest::get().uri("/api/v1/projects")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["name"], "Mobile");
    assert_eq!(body["data"][0]["apps"][0]["name"], "iOS");
}

#[rstest]
#[actix_web::test]
async fn project_names_are_required() {
    let api = TestApi::new().await;
    let app = api.service(&api.owner).await;
    let (status, body) = call_json(
        &app,
        TestRequest::post()
            .uri("/api/v1/projects")
            .set_json(json!({"description": "no name"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "name");
}

#[rstest]
#[case("/api/v1/projects/abc")]
#[case("/api/v1/projects/0")]
#[case("/api/v1/projects/1/apps/-2")]
#[actix_web::test]
async fn malformed_path_ids_are_bad_requests(#[case] uri: &str) {
    let api = TestApi::new().await;
    let app = api.service(&api.owner).await;
    let (status, body) = call_json(&app, TestRequest::get().uri(uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "invalid_id");
}

#[rstest]
#[actix_web::test]
async fn project_details_include_members() {
    let api = TestApi::new().await;
    let project = create_project(&api).await;
    let app = api.service(&api.owner).await;

    let (status, body) =
        call_json(&app, TestRequest::get().uri(&format!("/api/v1/projects/{project}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["members"][0]["role"], "owner");
    assert_eq!(body["data"]["members"][0]["userId"], api.owner.user_id.get());
}

#[rstest]
#[actix_web::test]
async fn viewers_cannot_rename_projects() {
    let api = TestApi::new().await;
    let project = create_project(&api).await;
    let viewer = api
        .member(ProjectId::new(project), Role::Viewer, "viewer")
        .await;
    let app = api.service(&viewer).await;

    let (status, body) = call_json(
        &app,
        TestRequest::put()
            .uri(&format!("/api/v1/projects/{project}"))
            .set_json(json!({"name": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
    assert!(body["traceId"].is_string());
}

#[rstest]
#[actix_web::test]
async fn the_last_owner_cannot_leave() {
    let api = TestApi::new().await;
    let project = create_project(&api).await;
    let app = api.service(&api.owner).await;
    let owner = api.owner.user_id.get();

    let (status, body) = call_json(
        &app,
        TestRequest::delete().uri(&format!("/api/v1/projects/{project}/members/{owner}")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[rstest]
#[actix_web::test]
async fn members_can_be_granted_and_removed() {
    let api = TestApi::new().await;
    let project = create_project(&api).await;
    let other = api
        .member(ProjectId::new(project), Role::Viewer, "translator")
        .await;
    let other_id = other.user_id.get();
    let app = api.service(&api.owner).await;

    let (status, body) = call_json(
        &app,
        TestRequest::put()
            .uri(&format!("/api/v1/projects/{project}/members/{other_id}"))
            .set_json(json!({"role": "Member"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "member");

    let (status, _) = call_json(
        &app,
        TestRequest::put()
            .uri(&format!("/api/v1/projects/{project}/members/{other_id}"))
            .set_json(json!({"role": "superuser"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call_json(
        &app,
        TestRequest::delete().uri(&format!("/api/v1/projects/{project}/members/{other_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);
}

#[rstest]
#[actix_web::test]
async fn apps_are_scoped_to_their_project() {
    let api = TestApi::new().await;
    let first = create_project(&api).await;
    let second = create_project(&api).await;
    let app = api.service(&api.owner).await;

    let (_, body) = call_json(
        &app,
        TestRequest::post()
            .uri(&format!("/api/v1/projects/{first}/apps"))
            .set_json(json!({"name": "Web"})),
    )
    .await;
    let app_id = body["data"]["id"].as_i64().expect("app id");

    let (status, _) = call_json(
        &app,
        TestRequest::get().uri(&format!("/api/v1/projects/{second}/apps/{app_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call_json(
        &app,
        TestRequest::put()
            .uri(&format!("/api/v1/projects/{first}/apps/{app_id}"))
            .set_json(json!({"name": "Web app", "currentVersion": 99})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Web app");
    assert_eq!(body["data"]["currentVersion"], 1);
}

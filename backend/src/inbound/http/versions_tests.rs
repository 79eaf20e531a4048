//! Handler tests for publishing and version history.

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use rstest::rstest;
use serde_json::json;

use crate::inbound::http::test_utils::{TestApi, call_json};

#[rstest]
#[actix_web::test]
async fn publishing_records_pending_strings_and_advances_the_counter() {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let app = api.service(&api.owner).await;
    let base = format!("/api/v1/projects/{project}/apps/{app_id}");
    for key in ["title", "subtitle"] {
        call_json(
            &app,
            TestRequest::post()
                .uri(&format!("{base}/strings"))
                .set_json(json!({"key": key, "value": "text"})),
        )
        .await;
    }

    let (status, body) =
        call_json(&app, TestRequest::get().uri(&format!("{base}/pending-changes"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][1]["positionalIndex"], 2);
    assert_eq!(body["data"][1]["label"], "New");

    let (status, body) = call_json(
        &app,
        TestRequest::post()
            .uri(&format!("{base}/versions"))
            .set_json(json!({"notes": "first drop"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let version = &body["data"];
    assert_eq!(version["versionNumber"], 1);
    assert_eq!(version["notes"], "first drop");
    assert_eq!(version["publisherName"], "Admin User");
    assert_eq!(version["snapshot"]["fidelity"], "full");
    assert_eq!(version["notifications"].as_array().map(Vec::len), Some(2));
    let version_id = version["id"].as_i64().expect("version id");

    let (_, body) =
        call_json(&app, TestRequest::get().uri(&format!("{base}/pending-changes"))).await;
    assert_eq!(body["data"], json!([]));

    let (_, body) = call_json(
        &app,
        TestRequest::get().uri(&format!("/api/v1/projects/{project}/apps/{app_id}")),
    )
    .await;
    assert_eq!(body["data"]["currentVersion"], 2);

    let (status, body) = call_json(
        &app,
        TestRequest::get().uri(&format!("{base}/versions/{version_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["snapshot"]["strings"][0]["key"], "title");
}

#[rstest]
#[actix_web::test]
async fn empty_bodies_publish_with_defaults() {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let app = api.service(&api.owner).await;
    let uri = format!("/api/v1/projects/{project}/apps/{app_id}/versions");

    let (status, body) = call_json(&app, TestRequest::post().uri(&uri)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["versionNumber"], 1);
    assert_eq!(body["data"]["notifications"], json!([]));

    let (status, body) = call_json(&app, TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[case(json!({"versionNumber": 0}))]
#[case(json!({"versionNumber": "two"}))]
#[actix_web::test]
async fn invalid_publish_requests_are_rejected(#[case] payload: serde_json::Value) {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let app = api.service(&api.owner).await;

    let (status, body) = call_json(
        &app,
        TestRequest::post()
            .uri(&format!("/api/v1/projects/{project}/apps/{app_id}/versions"))
            .set_json(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[rstest]
#[actix_web::test]
async fn versions_of_other_apps_are_not_found() {
    let api = TestApi::new().await;
    let (project, first) = api.project_with_app().await;
    let app = api.service(&api.owner).await;
    let (_, body) = call_json(
        &app,
        TestRequest::post()
            .uri(&format!("/api/v1/projects/{project}/apps"))
            .set_json(json!({"name": "Second"})),
    )
    .await;
    let second = body["data"]["id"].as_i64().expect("app id");

    let (_, body) = call_json(
        &app,
        TestRequest::post().uri(&format!("/api/v1/projects/{project}/apps/{first}/versions")),
    )
    .await;
    let version_id = body["data"]["id"].as_i64().expect("version id");

    let (status, _) = call_json(
        &app,
        TestRequest::get().uri(&format!(
            "/api/v1/projects/{project}/apps/{second}/versions/{version_id}"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

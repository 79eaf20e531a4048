//! Handler tests for the string table endpoints.

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use rstest::rstest;
use serde_json::json;

use crate::domain::{ProjectId, Role};
use crate::inbound::http::test_utils::{TestApi, call_json};

#[rstest]
#[actix_web::test]
async fn new_strings_start_pending_and_stay_new_when_edited() {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let app = api.service(&api.owner).await;
    let base = format!("/api/v1/projects/{project}/apps/{app_id}/strings");

    let (status, body) = call_json(
        &app,
        TestRequest::post().uri(&base).set_json(json!({
            "key": " greeting ",
            "value": "Hello",
            "additionalColumns": {"English": "Hello"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["key"], "greeting");
    assert_eq!(body["data"]["status"], "new");
    assert_eq!(body["data"]["modifiedBy"], api.owner.user_id.get());
    let string_id = body["data"]["id"].as_i64().expect("string id");

    let (status, body) = call_json(
        &app,
        TestRequest::put()
            .uri(&format!("{base}/{string_id}"))
            .set_json(json!({"value": "Hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "Hi");
    assert_eq!(body["data"]["status"], "new");
    assert_eq!(body["data"]["additionalColumns"]["English"], "Hello");
}

#[rstest]
#[case(json!({"value": "missing key"}), "key")]
#[case(json!({"key": "k", "value": "   "}), "value")]
#[actix_web::test]
async fn keys_and_values_are_required(#[case] payload: serde_json::Value, #[case] field: &str) {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let app = api.service(&api.owner).await;

    let (status, body) = call_json(
        &app,
        TestRequest::post()
            .uri(&format!("/api/v1/projects/{project}/apps/{app_id}/strings"))
            .set_json(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn listing_is_paginated_in_creation_order() {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let app = api.service(&api.owner).await;
    let base = format!("/api/v1/projects/{project}/apps/{app_id}/strings");
    for index in 1..=5 {
        let (status, _) = call_json(
            &app,
            TestRequest::post()
                .uri(&base)
                .set_json(json!({"key": format!("key_{index}"), "value": "v"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) =
        call_json(&app, TestRequest::get().uri(&format!("{base}?page=2&limit=2"))).await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["total"], 5);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["items"][0]["key"], "key_3");
    assert_eq!(page["items"][1]["key"], "key_4");

    let (status, body) = call_json(&app, TestRequest::get().uri(&format!("{base}?page=x"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["source"], "query");
}

#[rstest]
#[actix_web::test]
async fn reset_clears_every_pending_marker() {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let app = api.service(&api.owner).await;
    let base = format!("/api/v1/projects/{project}/apps/{app_id}/strings");
    for key in ["a", "b"] {
        call_json(
            &app,
            TestRequest::post()
                .uri(&base)
                .set_json(json!({"key": key, "value": "v"})),
        )
        .await;
    }

    let (status, body) = call_json(&app, TestRequest::post().uri(&format!("{base}/reset"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cleared"], 2);

    let (_, body) = call_json(&app, TestRequest::get().uri(&base)).await;
    let items = body["data"]["items"].as_array().expect("items");
    assert!(items.iter().all(|item| item.get("status").is_none()));
    assert!(items.iter().all(|item| item.get("modifiedAt").is_none()));
}

#[rstest]
#[actix_web::test]
async fn viewers_read_but_cannot_write() {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let viewer = api
        .member(ProjectId::new(project), Role::Viewer, "reader")
        .await;
    let app = api.service(&viewer).await;
    let base = format!("/api/v1/projects/{project}/apps/{app_id}/strings");

    let (status, _) = call_json(&app, TestRequest::get().uri(&base)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call_json(
        &app,
        TestRequest::post()
            .uri(&base)
            .set_json(json!({"key": "k", "value": "v"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[rstest]
#[actix_web::test]
async fn deleted_strings_are_gone() {
    let api = TestApi::new().await;
    let (project, app_id) = api.project_with_app().await;
    let app = api.service(&api.owner).await;
    let base = format!("/api/v1/projects/{project}/apps/{app_id}/strings");
    let (_, body) = call_json(
        &app,
        TestRequest::post()
            .uri(&base)
            .set_json(json!({"key": "k", "value": "v"})),
    )
    .await;
    let string_id = body["data"]["id"].as_i64().expect("id");

    let (status, _) =
        call_json(&app, TestRequest::delete().uri(&format!("{base}/{string_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call_json(
        &app,
        TestRequest::put()
            .uri(&format!("{base}/{string_id}"))
            .set_json(json!({"value": "again"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

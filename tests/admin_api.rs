//! Rotas administrativas contra uma API Kaonavi simulada (httpmock)

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use config::{File, FileFormat};
use httpmock::prelude::*;
use kaonavi::KaonaviClient;
use kaonavi_middleware::config::Settings;
use kaonavi_middleware::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(server: &MockServer) -> Router {
    app_with(server, false)
}

fn app_with(server: &MockServer, dry_run: bool) -> Router {
    let raw = format!(
        r#"
        [kaonavi]
        consumer_key = "key"
        consumer_secret = "secret"
        base_url = "{}"
        dry_run = {}

        [webhook]
        token = "hook-secret"
        "#,
        server.base_url(),
        dry_run
    );
    let settings: Settings = Settings::defaults()
        .unwrap()
        .add_source(File::from_str(&raw, FileFormat::Toml))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();

    let client = KaonaviClient::from_keys("key", "secret", settings.kaonavi.client_options()).unwrap();
    let mut state = AppState::new(settings, client).unwrap();
    state.environment = "test".to_string();
    build_router(Arc::new(state))
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(200).json_body(json!({
                "access_token": "admin-token",
                "token_type": "Bearer",
                "expires_in": 3600
            }));
        })
        .await
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_ready_when_token_exchange_works() {
    let server = MockServer::start_async().await;
    let token = mock_token(&server).await;

    let response = app(&server)
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["dependencies"]["webhook_receiver"]["configured"], true);
    token.assert_async().await;
}

#[tokio::test]
async fn test_not_ready_when_credentials_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(401).json_body(json!({"errors": ["invalid consumer key"]}));
        })
        .await;

    let response = app(&server)
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["dependencies"]["kaonavi"]["status"], "disconnected");
}

#[tokio::test]
async fn test_list_members() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/members")
                .header("Kaonavi-Token", "admin-token");
            then.status(200).json_body(json!({
                "updated_at": "2024-01-10 08:00:00",
                "member_data": [
                    {"code": "A0001", "name": "カオナビ 太郎", "custom_fields": []},
                    {"code": "A0002", "name": "カオナビ 花子", "custom_fields": []}
                ]
            }));
        })
        .await;

    let response = app(&server)
        .oneshot(Request::get("/admin/members").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["updated_at"], "2024-01-10 08:00:00");
    assert_eq!(body["member_data"][1]["code"], "A0002");
}

#[tokio::test]
async fn test_task_progress_and_missing_task() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/12");
            then.status(200).json_body(json!({
                "id": 12,
                "status": "NG",
                "messages": ["A0001 の日付が不正です"]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/99");
            then.status(404).json_body(json!({"errors": ["task not found"]}));
        })
        .await;

    let router = app(&server);

    let response = router
        .clone()
        .oneshot(Request::get("/admin/tasks/12").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "NG");
    assert_eq!(body["messages"][0], "A0001 の日付が不正です");

    let missing = router
        .oneshot(Request::get("/admin/tasks/99").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = json_body(missing).await;
    assert!(body["error"].as_str().unwrap().contains("task not found"));
}

#[tokio::test]
async fn test_ensure_webhook_creates_with_configured_token() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/webhook");
            then.status(200).json_body(json!({"webhook_data": []}));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/webhook").json_body(json!({
                "url": "https://middleware.example.com/webhooks/kaonavi",
                "events": ["member_created", "member_updated", "member_deleted"],
                "secret_token": "hook-secret"
            }));
            then.status(200).json_body(json!({
                "id": 5,
                "url": "https://middleware.example.com/webhooks/kaonavi",
                "events": ["member_created", "member_updated", "member_deleted"],
                "secret_token": "hook-secret"
            }));
        })
        .await;

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/admin/webhooks")
        .header("Content-Type", "application/json")
        .body(Body::from(
            r#"{"url":"https://middleware.example.com/webhooks/kaonavi"}"#,
        ))
        .unwrap();
    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], 5);
    create.assert_async().await;
}

#[tokio::test]
async fn test_ensure_webhook_in_dry_run_writes_nothing() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/webhook");
            then.status(200).json_body(json!({"webhook_data": []}));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/webhook");
            then.status(200).json_body(json!({}));
        })
        .await;

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/admin/webhooks")
        .header("Content-Type", "application/json")
        .body(Body::from(
            r#"{"url":"https://middleware.example.com/webhooks/kaonavi"}"#,
        ))
        .unwrap();
    let response = app_with(&server, true).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["url"], "https://middleware.example.com/webhooks/kaonavi");
    list.assert_async().await;
    create.assert_hits_async(0).await;
}

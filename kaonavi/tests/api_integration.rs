//! Testes de integração contra um servidor HTTP local (httpmock)
//!
//! Exercitam o `ReqwestTransport` de verdade: headers, corpo, mapeamento de
//! status e polling de tasks.

use std::time::Duration;

use httpmock::prelude::*;
use httpmock::Method::PATCH;
use kaonavi::{
    CancellationToken, ClientOptions, Credentials, KaonaviClient, KaonaviError, MemberData,
    PollPolicy, RecordType, TaskId, TaskOutcome,
};
use serde_json::json;

fn options(server: &MockServer) -> ClientOptions {
    ClientOptions::default()
        .with_base_url(server.base_url())
        .with_polling(Duration::from_millis(20), Duration::from_secs(2))
}

fn client(options: ClientOptions) -> KaonaviClient {
    KaonaviClient::new(Credentials::new("key", "secret").unwrap(), options).unwrap()
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .header("Authorization", "Basic a2V5OnNlY3JldA==")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body("grant_type=client_credentials");
            then.status(200).json_body(json!({
                "access_token": "integration-token",
                "token_type": "Bearer",
                "expires_in": 3600
            }));
        })
        .await
}

#[tokio::test]
async fn test_token_is_exchanged_once_and_sent_as_header() {
    let server = MockServer::start_async().await;
    let token = mock_token(&server).await;

    let members = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/members")
                .header("Kaonavi-Token", "integration-token");
            then.status(200).json_body(json!({
                "updated_at": "2020-10-01 01:23:45",
                "member_data": [{
                    "code": "A0002",
                    "name": "カオナビ 太郎",
                    "entered_date": "2005-09-20",
                    "retired_date": "",
                    "birthday": "",
                    "sub_departments": [],
                    "custom_fields": []
                }]
            }));
        })
        .await;

    let client = client(options(&server));
    let first = client.members().list().await.unwrap();
    let second = client.members().list().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.member_data[0].code, "A0002");
    token.assert_hits_async(1).await;
    members.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_dry_run_transmits_nothing() {
    let server = MockServer::start_async().await;
    let token = mock_token(&server).await;
    let write = server
        .mock_async(|when, then| {
            when.path("/members");
            then.status(200).json_body(json!({"task_id": 1}));
        })
        .await;

    let client = client(options(&server).with_dry_run(true));
    let outcome = client
        .members()
        .create(&[MemberData::with_code("A0002")])
        .await
        .unwrap();

    assert_eq!(outcome, TaskOutcome::DryRun);
    token.assert_hits_async(0).await;
    write.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_member_write_waits_for_task() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;

    let write = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/members")
                .header("Content-Type", "application/json")
                .json_body(json!({"member_data": [{
                    "code": "A0002",
                    "entered_date": "",
                    "retired_date": "",
                    "birthday": "",
                    "sub_departments": [],
                    "custom_fields": []
                }]}));
            then.status(200).json_body(json!({"task_id": 31}));
        })
        .await;
    let task = server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/31");
            then.status(200)
                .json_body(json!({"id": 31, "status": "OK", "messages": []}));
        })
        .await;

    let client = client(options(&server));
    let outcome = client
        .members()
        .update(&[MemberData::with_code("A0002")])
        .await
        .unwrap();

    assert_eq!(outcome.task_id(), Some(TaskId(31)));
    write.assert_async().await;
    task.assert_async().await;
}

#[tokio::test]
async fn test_running_task_times_out() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/8");
            then.status(200)
                .json_body(json!({"id": 8, "status": "RUNNING", "messages": null}));
        })
        .await;

    let client = client(options(&server));
    let err = client
        .tasks()
        .await_task(
            TaskId(8),
            PollPolicy::new(Duration::from_millis(20), Duration::from_millis(150)),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, KaonaviError::TaskTimedOut { task_id: TaskId(8) }));
}

#[tokio::test]
async fn test_status_mapping() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/roles");
            then.status(429)
                .header("Retry-After", "7")
                .json_body(json!({"errors": ["リクエスト数の上限を超えました"]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/sheets/99");
            then.status(404)
                .json_body(json!({"errors": ["シートが見つかりません"]}));
        })
        .await;

    let client = client(options(&server));

    match client.roles().list().await.unwrap_err() {
        KaonaviError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)))
        }
        other => panic!("unexpected error: {other:?}"),
    }

    match client.sheets().list(99).await.unwrap_err() {
        KaonaviError::ServiceError {
            status, message, ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "シートが見つかりません");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(401)
                .json_body(json!({"errors": ["consumer_keyとconsumer_secretの組み合わせが不正です"]}));
        })
        .await;

    let client = client(options(&server));
    let err = client.layouts().member_layout().await.unwrap_err();
    assert!(matches!(err, KaonaviError::AuthRejected(_)));
}

#[tokio::test]
async fn test_sheet_layouts_envelope() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/sheet_layouts");
            then.status(200).json_body(json!({"sheets": [
                {"id": 12, "name": "住所・連絡先", "record_type": 1, "custom_fields": []},
                {"id": 13, "name": "評価", "record_type": 0, "custom_fields": []}
            ]}));
        })
        .await;

    let client = client(options(&server));
    let sheets = client.layouts().sheet_layouts().await.unwrap();

    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].record_type, RecordType::Multiple);
    assert_eq!(sheets[1].record_type, RecordType::Single);
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let options = ClientOptions::default()
        .with_base_url("http://127.0.0.1:9")
        .with_polling(Duration::from_millis(20), Duration::from_secs(1));
    let client = KaonaviClient::new(Credentials::new("key", "secret").unwrap(), options).unwrap();

    let err = client.roles().list().await.unwrap_err();
    assert!(matches!(err, KaonaviError::Transport(_)));
}

#[test]
fn test_missing_credentials_fail_at_construction() {
    let err = KaonaviClient::from_keys("", "secret", ClientOptions::default()).unwrap_err();
    assert!(matches!(err, KaonaviError::InvalidCredentials(_)));
}

//! End-to-end dispatch against a mock Google.

use std::sync::Arc;

use async_trait::async_trait;
use gworkspace::{ApiEndpoints, AuthError, Dispatcher, Envelope, TokenSource, WorkspaceContext};
use httpmock::prelude::*;
use serde_json::{json, Value};

struct FixedToken;

#[async_trait]
impl TokenSource for FixedToken {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok("integration-token".to_string())
    }
}

struct Revoked;

#[async_trait]
impl TokenSource for Revoked {
    async fn access_token(&self) -> Result<String, AuthError> {
        Err(AuthError::NotAuthenticated)
    }
}

fn dispatcher_with(server: &MockServer, tokens: Arc<dyn TokenSource>) -> Dispatcher {
    let endpoints = ApiEndpoints::rooted_at(&server.base_url());
    let ctx = WorkspaceContext::with_endpoints(reqwest::Client::new(), tokens, &endpoints);
    Dispatcher::new(Arc::new(ctx))
}

fn dispatcher(server: &MockServer) -> Dispatcher {
    dispatcher_with(server, Arc::new(FixedToken))
}

fn failure(envelope: &Envelope) -> (String, String) {
    let value = envelope.to_value();
    assert_eq!(value["success"], false, "expected failure, got {}", value);
    (
        value["error"].as_str().unwrap_or_default().to_string(),
        value["kind"].as_str().unwrap_or_default().to_string(),
    )
}

#[tokio::test]
async fn unknown_tool_is_a_failure_envelope() {
    let server = MockServer::start_async().await;
    let guard = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(500);
        })
        .await;

    let envelope = dispatcher(&server).invoke("slack_post_message", json!({})).await;
    let (error, kind) = failure(&envelope);
    assert_eq!(error, "Unknown tool: slack_post_message");
    assert_eq!(kind, "invalid_argument");
    assert_eq!(guard.hits_async().await, 0);
}

#[tokio::test]
async fn missing_argument_makes_no_remote_call() {
    let server = MockServer::start_async().await;
    let guard = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(json!({}));
        })
        .await;

    let envelope = dispatcher(&server)
        .invoke("drive_get_file", json!({"fileId": "wrong-name"}))
        .await;
    let (error, kind) = failure(&envelope);
    assert_eq!(kind, "invalid_argument");
    assert!(error.starts_with("Invalid arguments for drive_get_file"), "{}", error);
    assert_eq!(guard.hits_async().await, 0);
}

#[tokio::test]
async fn gmail_send_returns_ids() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/gmail/v1/users/me/messages/send")
                .header("authorization", "Bearer integration-token")
                .body_contains("\"raw\":");
            then.status(200)
                .json_body(json!({"id": "18c1", "threadId": "18c0", "labelIds": ["SENT"]}));
        })
        .await;

    let envelope = dispatcher(&server)
        .invoke(
            "gmail_send_message",
            json!({"to": "ops@example.com", "subject": "Deploy", "body": "Done."}),
        )
        .await;
    mock.assert_async().await;
    assert_eq!(
        envelope,
        Envelope::Success(json!({"success": true, "message_id": "18c1", "thread_id": "18c0"}))
    );
}

#[tokio::test]
async fn sheets_update_reports_cells() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path_contains("/sheets/v4/spreadsheets/sheet-1/values/")
                .query_param("valueInputOption", "USER_ENTERED");
            then.status(200).json_body(json!({
                "spreadsheetId": "sheet-1",
                "updatedRange": "Sheet1!A1:B2",
                "updatedCells": 4
            }));
        })
        .await;

    let envelope = dispatcher(&server)
        .invoke(
            "sheets_update_values",
            json!({
                "spreadsheet_id": "sheet-1",
                "range_name": "Sheet1!A1:B2",
                "values": [["a", "b"], [1, 2]]
            }),
        )
        .await;
    mock.assert_async().await;
    let value = envelope.to_value();
    assert_eq!(value["updated_cells"], 4);
    assert_eq!(value["updated_range"], "Sheet1!A1:B2");
}

#[tokio::test]
async fn calendar_list_uses_explicit_lower_bound() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/calendar/v3/calendars/primary/events")
                .query_param("timeMin", "2026-01-01T00:00:00Z")
                .query_param("maxResults", "2");
            then.status(200).json_body(json!({"items": [
                {"id": "e1", "summary": "Standup", "start": {"dateTime": "2026-01-02T09:00:00Z"}},
                {"id": "e2", "start": {"date": "2026-01-03"}}
            ]}));
        })
        .await;

    let envelope = dispatcher(&server)
        .invoke(
            "calendar_list_events",
            json!({"time_min": "2026-01-01T00:00:00Z", "max_results": 2.0}),
        )
        .await;
    mock.assert_async().await;

    let events = envelope.to_value();
    assert_eq!(events.as_array().map(Vec::len), Some(2));
    assert_eq!(events[0]["start"], "2026-01-02T09:00:00Z");
    assert_eq!(events[1]["summary"], "No title");
    assert_eq!(events[1]["attendees"], json!([]));
}

#[tokio::test]
async fn docs_get_extracts_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/docs/v1/documents/doc-9");
            then.status(200).json_body(json!({
                "documentId": "doc-9",
                "title": "Notes",
                "body": {"content": [
                    {"paragraph": {"elements": [{"textRun": {"content": "Hello "}}]}},
                    {"paragraph": {"elements": [{"textRun": {"content": "world\n"}}]}}
                ]}
            }));
        })
        .await;

    let envelope = dispatcher(&server)
        .invoke("docs_get_document", json!({"document_id": "doc-9"}))
        .await;
    assert_eq!(
        envelope.to_value(),
        json!({
            "success": true,
            "document_id": "doc-9",
            "title": "Notes",
            "content": "Hello world\n",
            "document_url": "https://docs.google.com/document/d/doc-9/edit"
        })
    );
}

#[tokio::test]
async fn remote_not_found_is_classified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/drive/v3/files/missing");
            then.status(404).json_body(json!({
                "error": {"code": 404, "message": "File not found: missing."}
            }));
        })
        .await;

    let envelope = dispatcher(&server)
        .invoke("drive_get_file", json!({"file_id": "missing"}))
        .await;
    let (error, kind) = failure(&envelope);
    assert_eq!(kind, "not_found");
    assert_eq!(error, "Failed to get file: Google API error 404: File not found: missing.");
}

#[tokio::test]
async fn credential_failure_is_authorization() {
    let server = MockServer::start_async().await;
    let guard = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(json!({}));
        })
        .await;

    let envelope = dispatcher_with(&server, Arc::new(Revoked))
        .invoke("chat_list_spaces", Value::Null)
        .await;
    let (_, kind) = failure(&envelope);
    assert_eq!(kind, "authorization");
    assert_eq!(guard.hits_async().await, 0);
}

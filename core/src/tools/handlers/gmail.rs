//! Gmail tools

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{done, field};
use crate::common::{GoogleResultExt, ToolError, ToolResult};
use crate::google::gmail::{extract_plain_text_body, summary_headers};
use crate::google::GmailApi;
use crate::tools::args::{decode, default_max_results, lenient_u32};
use crate::tools::registry::{descriptor, ToolDescriptor};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListMessagesArgs {
    #[serde(default = "default_max_results", deserialize_with = "lenient_u32")]
    pub max_results: u32,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchMessagesArgs {
    pub query: String,
    #[serde(default = "default_max_results", deserialize_with = "lenient_u32")]
    pub max_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageIdArgs {
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageArgs {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
}

#[derive(Debug)]
pub enum GmailCall {
    ListMessages(ListMessagesArgs),
    GetMessage(MessageIdArgs),
    SendMessage(SendMessageArgs),
    SearchMessages(SearchMessagesArgs),
    MarkAsRead(MessageIdArgs),
    MarkAsUnread(MessageIdArgs),
    DeleteMessage(MessageIdArgs),
}

impl GmailCall {
    pub fn parse(tool: &str, action: &str, args: Value) -> ToolResult<Self> {
        Ok(match action {
            "list_messages" => Self::ListMessages(decode(tool, args)?),
            "get_message" => Self::GetMessage(decode(tool, args)?),
            "send_message" => Self::SendMessage(decode(tool, args)?),
            "search_messages" => Self::SearchMessages(decode(tool, args)?),
            "mark_as_read" => Self::MarkAsRead(decode(tool, args)?),
            "mark_as_unread" => Self::MarkAsUnread(decode(tool, args)?),
            "delete_message" => Self::DeleteMessage(decode(tool, args)?),
            _ => return Err(ToolError::UnknownTool(tool.to_string())),
        })
    }

    pub async fn execute(self, gmail: &GmailApi) -> ToolResult<Value> {
        match self {
            Self::ListMessages(args) => {
                fetch_messages(gmail, args.query.as_deref(), &args.label_ids, args.max_results)
                    .await
                    .map(Value::Array)
            }
            Self::SearchMessages(args) => {
                fetch_messages(gmail, Some(&args.query), &[], args.max_results)
                    .await
                    .map(Value::Array)
            }
            Self::GetMessage(args) => {
                let message = gmail
                    .get_message(&args.message_id)
                    .await
                    .context("Failed to get message")?;
                Ok(message_summary(&message))
            }
            Self::SendMessage(args) => {
                let sent = gmail
                    .send_message(
                        &args.to,
                        &args.subject,
                        &args.body,
                        args.cc.as_deref(),
                        args.bcc.as_deref(),
                    )
                    .await
                    .context("Failed to send message")?;
                Ok(json!({
                    "success": true,
                    "message_id": field(&sent, "id"),
                    "thread_id": field(&sent, "threadId"),
                }))
            }
            Self::MarkAsRead(args) => {
                gmail
                    .modify_labels(&args.message_id, &[], &["UNREAD"])
                    .await
                    .context("Failed to mark message as read")?;
                Ok(done(format!("Message {} marked as read", args.message_id)))
            }
            Self::MarkAsUnread(args) => {
                gmail
                    .modify_labels(&args.message_id, &["UNREAD"], &[])
                    .await
                    .context("Failed to mark message as unread")?;
                Ok(done(format!("Message {} marked as unread", args.message_id)))
            }
            Self::DeleteMessage(args) => {
                gmail
                    .trash_message(&args.message_id)
                    .await
                    .context("Failed to delete message")?;
                Ok(done(format!("Message {} moved to trash", args.message_id)))
            }
        }
    }
}

/// One list call, then one full fetch per id. Any failed fetch fails the call.
async fn fetch_messages(
    gmail: &GmailApi,
    query: Option<&str>,
    label_ids: &[String],
    max_results: u32,
) -> ToolResult<Vec<Value>> {
    let stubs = gmail
        .list_messages(query, label_ids, max_results)
        .await
        .context("Failed to list messages")?;

    let mut messages = Vec::with_capacity(stubs.len());
    for stub in &stubs {
        let Some(id) = stub.get("id").and_then(Value::as_str) else {
            debug!("Skipping message stub without id");
            continue;
        };
        let message = gmail
            .get_message(id)
            .await
            .context("Failed to get message")?;
        messages.push(message_summary(&message));
    }
    Ok(messages)
}

fn message_summary(message: &Value) -> Value {
    let payload = message.get("payload").cloned().unwrap_or_else(|| json!({}));
    json!({
        "id": field(message, "id"),
        "threadId": field(message, "threadId"),
        "snippet": field(message, "snippet"),
        "headers": summary_headers(&payload),
        "body": extract_plain_text_body(&payload),
    })
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    let message_id = json!({ "message_id": { "type": "string", "description": "Gmail message ID" } });
    vec![
        descriptor(
            "gmail_list_messages",
            "List recent Gmail messages with headers and plain-text body.",
            json!({
                "max_results": { "type": "integer", "description": "Maximum number of messages", "default": 10 },
                "query": { "type": "string", "description": "Gmail search query (same syntax as the web UI)" },
                "label_ids": { "type": "array", "items": { "type": "string" }, "description": "Only messages carrying all of these labels" }
            }),
            &[],
        ),
        descriptor(
            "gmail_get_message",
            "Get one Gmail message with headers and plain-text body.",
            message_id.clone(),
            &["message_id"],
        ),
        descriptor(
            "gmail_send_message",
            "Send a plain-text email.",
            json!({
                "to": { "type": "string", "description": "Recipient address(es), comma separated" },
                "subject": { "type": "string" },
                "body": { "type": "string", "description": "Plain-text body" },
                "cc": { "type": "string" },
                "bcc": { "type": "string" }
            }),
            &["to", "subject", "body"],
        ),
        descriptor(
            "gmail_search_messages",
            "Search Gmail messages with a Gmail query.",
            json!({
                "query": { "type": "string", "description": "Gmail search query, e.g. 'from:alice is:unread'" },
                "max_results": { "type": "integer", "default": 10 }
            }),
            &["query"],
        ),
        descriptor(
            "gmail_mark_as_read",
            "Remove the UNREAD label from a message.",
            message_id.clone(),
            &["message_id"],
        ),
        descriptor(
            "gmail_mark_as_unread",
            "Add the UNREAD label to a message.",
            message_id.clone(),
            &["message_id"],
        ),
        descriptor(
            "gmail_delete_message",
            "Move a message to the trash.",
            message_id,
            &["message_id"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use crate::google::client::tests::StaticToken;
    use httpmock::prelude::*;
    use std::sync::Arc;

    fn gmail(server: &MockServer) -> GmailApi {
        GmailApi::with_base_url(
            reqwest::Client::new(),
            Arc::new(StaticToken("t")),
            &server.base_url(),
        )
    }

    #[test]
    fn unknown_action_is_unknown_tool() {
        let err = GmailCall::parse("gmail_archive", "archive", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: gmail_archive");
    }

    #[test]
    fn search_requires_query() {
        let err = GmailCall::parse("gmail_search_messages", "search_messages", json!({}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn summary_defaults_missing_fields() {
        let summary = message_summary(&json!({"id": "m1"}));
        assert_eq!(
            summary,
            json!({"id": "m1", "threadId": "", "snippet": "", "headers": {}, "body": ""})
        );
    }

    #[tokio::test]
    async fn list_fetches_each_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/me/messages");
                then.status(200)
                    .json_body(json!({"messages": [{"id": "a"}, {"id": "b"}]}));
            })
            .await;
        let details = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_contains("/users/me/messages/")
                    .query_param("format", "full");
                then.status(200).json_body(json!({
                    "id": "a",
                    "snippet": "hello",
                    "payload": {"headers": [{"name": "Subject", "value": "Hi"}]}
                }));
            })
            .await;

        let call = GmailCall::parse("gmail_list_messages", "list_messages", json!({})).unwrap();
        let out = call.execute(&gmail(&server)).await.unwrap();
        assert_eq!(details.hits_async().await, 2);
        assert_eq!(out.as_array().unwrap().len(), 2);
        assert_eq!(out[0]["headers"]["subject"], "Hi");
    }

    #[tokio::test]
    async fn failed_detail_fetch_fails_the_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/me/messages");
                then.status(200).json_body(json!({"messages": [{"id": "gone"}]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/me/messages/gone");
                then.status(404)
                    .json_body(json!({"error": {"code": 404, "message": "Not Found"}}));
            })
            .await;

        let call = GmailCall::parse("gmail_list_messages", "list_messages", json!({})).unwrap();
        let err = call.execute(&gmail(&server)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("Failed to get message: "));
    }
}

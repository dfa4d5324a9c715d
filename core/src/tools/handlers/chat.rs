//! Google Chat tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{done, field};
use crate::common::{GoogleResultExt, ToolError, ToolResult};
use crate::google::ChatApi;
use crate::tools::args::{decode, default_max_results, lenient_u32};
use crate::tools::registry::{descriptor, ToolDescriptor};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSpacesArgs {
    #[serde(default = "default_max_results", deserialize_with = "lenient_u32")]
    pub max_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageArgs {
    pub space: String,
    pub text: String,
    #[serde(default)]
    pub thread_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListMessagesArgs {
    pub space: String,
    #[serde(default = "default_max_results", deserialize_with = "lenient_u32")]
    pub max_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageNameArgs {
    pub message_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSpaceArgs {
    pub display_name: String,
}

#[derive(Debug)]
pub enum ChatCall {
    ListSpaces(ListSpacesArgs),
    SendMessage(SendMessageArgs),
    ListMessages(ListMessagesArgs),
    GetMessage(MessageNameArgs),
    DeleteMessage(MessageNameArgs),
    CreateSpace(CreateSpaceArgs),
}

impl ChatCall {
    pub fn parse(tool: &str, action: &str, args: Value) -> ToolResult<Self> {
        Ok(match action {
            "list_spaces" => Self::ListSpaces(decode(tool, args)?),
            "send_message" => Self::SendMessage(decode(tool, args)?),
            "list_messages" => Self::ListMessages(decode(tool, args)?),
            "get_message" => Self::GetMessage(decode(tool, args)?),
            "delete_message" => Self::DeleteMessage(decode(tool, args)?),
            "create_space" => Self::CreateSpace(decode(tool, args)?),
            _ => return Err(ToolError::UnknownTool(tool.to_string())),
        })
    }

    pub async fn execute(self, chat: &ChatApi) -> ToolResult<Value> {
        match self {
            Self::ListSpaces(args) => {
                let spaces = chat
                    .list_spaces(args.max_results)
                    .await
                    .context("Failed to list spaces")?;
                Ok(spaces
                    .iter()
                    .map(|s| {
                        json!({
                            "name": field(s, "name"),
                            "displayName": field(s, "displayName"),
                            "type": field(s, "type"),
                            "spaceType": field(s, "spaceType"),
                        })
                    })
                    .collect())
            }
            Self::SendMessage(args) => {
                let message = chat
                    .create_message(&args.space, &args.text, args.thread_key.as_deref())
                    .await
                    .context("Failed to send message")?;
                Ok(json!({
                    "success": true,
                    "message_name": field(&message, "name"),
                    "create_time": field(&message, "createTime"),
                    "text": field(&message, "text"),
                }))
            }
            Self::ListMessages(args) => {
                let messages = chat
                    .list_messages(&args.space, args.max_results)
                    .await
                    .context("Failed to list messages")?;
                Ok(messages
                    .iter()
                    .map(|m| {
                        json!({
                            "name": field(m, "name"),
                            "text": field(m, "text"),
                            "sender": sender_name(m),
                            "createTime": field(m, "createTime"),
                        })
                    })
                    .collect())
            }
            Self::GetMessage(args) => {
                let message = chat
                    .get_message(&args.message_name)
                    .await
                    .context("Failed to get message")?;
                Ok(json!({
                    "name": field(&message, "name"),
                    "text": field(&message, "text"),
                    "sender": sender_name(&message),
                    "createTime": field(&message, "createTime"),
                    "thread": message
                        .get("thread")
                        .and_then(|t| t.get("name"))
                        .cloned()
                        .unwrap_or_else(|| json!("")),
                }))
            }
            Self::DeleteMessage(args) => {
                chat.delete_message(&args.message_name)
                    .await
                    .context("Failed to delete message")?;
                Ok(done(format!("Message {} deleted", args.message_name)))
            }
            Self::CreateSpace(args) => {
                let space = chat
                    .create_space(&args.display_name)
                    .await
                    .context("Failed to create space")?;
                Ok(json!({
                    "success": true,
                    "space_name": field(&space, "name"),
                    "display_name": field(&space, "displayName"),
                }))
            }
        }
    }
}

fn sender_name(message: &Value) -> Value {
    message
        .get("sender")
        .and_then(|s| s.get("displayName"))
        .cloned()
        .unwrap_or_else(|| json!(""))
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    let space = json!({ "type": "string", "description": "Space resource name, e.g. 'spaces/AAAA'" });
    let message_name = json!({
        "message_name": { "type": "string", "description": "Message resource name, e.g. 'spaces/AAAA/messages/BBBB'" }
    });
    vec![
        descriptor(
            "chat_list_spaces",
            "List Google Chat spaces the user belongs to.",
            json!({ "max_results": { "type": "integer", "default": 10 } }),
            &[],
        ),
        descriptor(
            "chat_send_message",
            "Post a text message to a Chat space, optionally into a thread.",
            json!({
                "space": space.clone(),
                "text": { "type": "string" },
                "thread_key": { "type": "string", "description": "Thread key; messages sharing a key form one thread" }
            }),
            &["space", "text"],
        ),
        descriptor(
            "chat_list_messages",
            "List recent messages in a Chat space.",
            json!({
                "space": space,
                "max_results": { "type": "integer", "default": 10 }
            }),
            &["space"],
        ),
        descriptor(
            "chat_get_message",
            "Get one Chat message.",
            message_name.clone(),
            &["message_name"],
        ),
        descriptor(
            "chat_delete_message",
            "Delete a Chat message.",
            message_name,
            &["message_name"],
        ),
        descriptor(
            "chat_create_space",
            "Create a named Chat space.",
            json!({ "display_name": { "type": "string" } }),
            &["display_name"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::client::tests::StaticToken;
    use httpmock::prelude::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn list_messages_flattens_sender() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/spaces/S/messages").query_param("pageSize", "10");
                then.status(200).json_body(json!({"messages": [
                    {"name": "spaces/S/messages/1", "text": "hi", "sender": {"displayName": "Ada"}},
                    {"name": "spaces/S/messages/2"}
                ]}));
            })
            .await;

        let chat = ChatApi::with_base_url(
            reqwest::Client::new(),
            Arc::new(StaticToken("t")),
            &server.base_url(),
        );
        let call =
            ChatCall::parse("chat_list_messages", "list_messages", json!({"space": "spaces/S"}))
                .unwrap();
        let out = call.execute(&chat).await.unwrap();
        assert_eq!(out[0]["sender"], "Ada");
        assert_eq!(out[1], json!({
            "name": "spaces/S/messages/2", "text": "", "sender": "", "createTime": ""
        }));
    }
}

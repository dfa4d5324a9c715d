//! Google Chat API v1 Client
//!
//! Spaces and messages. Resource names (`spaces/AAA`, `spaces/AAA/messages/BBB`)
//! are passed through as paths, segment-encoded.

use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};
use super::common::{extract_array, resource_path};

const CHAT_API_BASE: &str = "https://chat.googleapis.com/v1";

pub struct ChatApi {
    client: GoogleClient,
}

super::google_api_wrapper!(ChatApi, CHAT_API_BASE);

impl ChatApi {
    /// List spaces the caller is a member of (first page only)
    pub async fn list_spaces(&self, page_size: u32) -> Result<Vec<Value>, GoogleError> {
        info!("Listing Chat spaces");

        let response = self
            .client
            .get("/spaces", &[("pageSize", page_size.to_string())])
            .await?;
        let spaces = extract_array(&response, "spaces");

        debug!("Retrieved {} spaces", spaces.len());
        Ok(spaces)
    }

    /// Post a message to a space.
    ///
    /// With a `thread_key` the message joins (or starts) that thread; Chat falls
    /// back to a new thread when the key is unknown.
    pub async fn create_message(
        &self,
        space: &str,
        text: &str,
        thread_key: Option<&str>,
    ) -> Result<Value, GoogleError> {
        info!("Sending Chat message to {}", space);

        let mut body = json!({ "text": text });
        let mut params = Vec::new();
        if let Some(key) = thread_key {
            body["thread"] = json!({ "threadKey": key });
            params.push((
                "messageReplyOption",
                "REPLY_MESSAGE_FALLBACK_TO_NEW_THREAD".to_string(),
            ));
        }

        let path = format!("/{}/messages", resource_path(space));
        self.client.post(&path, &params, &body).await
    }

    pub async fn list_messages(&self, space: &str, page_size: u32) -> Result<Vec<Value>, GoogleError> {
        info!("Listing Chat messages in {}", space);

        let path = format!("/{}/messages", resource_path(space));
        let response = self
            .client
            .get(&path, &[("pageSize", page_size.to_string())])
            .await?;
        let messages = extract_array(&response, "messages");

        debug!("Retrieved {} messages", messages.len());
        Ok(messages)
    }

    pub async fn get_message(&self, name: &str) -> Result<Value, GoogleError> {
        info!("Fetching Chat message {}", name);
        self.client.get(&format!("/{}", resource_path(name)), &[]).await
    }

    pub async fn delete_message(&self, name: &str) -> Result<Value, GoogleError> {
        info!("Deleting Chat message {}", name);
        self.client.delete(&format!("/{}", resource_path(name))).await
    }

    /// Create a named space (`spaceType = SPACE`)
    pub async fn create_space(&self, display_name: &str) -> Result<Value, GoogleError> {
        info!("Creating Chat space {}", display_name);

        let body = json!({
            "displayName": display_name,
            "spaceType": "SPACE",
        });
        self.client.post("/spaces", &[], &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::client::tests::StaticToken;
    use httpmock::prelude::*;
    use std::sync::Arc;

    fn api(server: &MockServer) -> ChatApi {
        ChatApi::with_base_url(
            reqwest::Client::new(),
            Arc::new(StaticToken("t")),
            &server.base_url(),
        )
    }

    #[tokio::test]
    async fn test_threaded_message_sets_reply_option() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/spaces/AAA/messages")
                    .query_param("messageReplyOption", "REPLY_MESSAGE_FALLBACK_TO_NEW_THREAD")
                    .json_body(json!({"text": "hi", "thread": {"threadKey": "standup"}}));
                then.status(200)
                    .json_body(json!({"name": "spaces/AAA/messages/1", "text": "hi"}));
            })
            .await;

        let msg = api(&server)
            .create_message("spaces/AAA", "hi", Some("standup"))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(msg["name"], "spaces/AAA/messages/1");
    }

    #[tokio::test]
    async fn test_plain_message_has_no_thread() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/spaces/AAA/messages")
                    .json_body(json!({"text": "hi"}));
                then.status(200).json_body(json!({"name": "spaces/AAA/messages/2"}));
            })
            .await;

        api(&server).create_message("spaces/AAA", "hi", None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_spaces_uses_page_size() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/spaces").query_param("pageSize", "2");
                then.status(200)
                    .json_body(json!({"spaces": [{"name": "spaces/A"}, {"name": "spaces/B"}]}));
            })
            .await;

        let spaces = api(&server).list_spaces(2).await.unwrap();
        assert_eq!(spaces.len(), 2);
    }
}

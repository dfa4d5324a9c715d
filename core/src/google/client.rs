//! Google API Authenticated HTTP Client
//!
//! Injects a bearer token from the credential provider on every request and
//! turns Google's REST error conventions into [`GoogleError`].

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::{AuthError, TokenSource};
use crate::common::ErrorKind;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Google API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("Rate limited. Please try again later.")]
    RateLimited,

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl GoogleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GoogleError::Auth(_) => ErrorKind::Authorization,
            GoogleError::Api { code: 401 | 403, .. } => ErrorKind::Authorization,
            GoogleError::Api { code: 404, .. } => ErrorKind::NotFound,
            _ => ErrorKind::Remote,
        }
    }
}

/// Google API HTTP client bound to one API surface (base URL).
#[derive(Clone)]
pub struct GoogleClient {
    http: Client,
    tokens: Arc<dyn TokenSource>,
    base_url: String,
}

impl GoogleClient {
    pub fn new(http: Client, tokens: Arc<dyn TokenSource>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an authenticated GET request
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, GoogleError> {
        self.execute(Method::GET, path, query, None).await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<Value, GoogleError> {
        self.execute(Method::POST, path, query, Some(body)).await
    }

    /// Make an authenticated PUT request with JSON body
    pub async fn put(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<Value, GoogleError> {
        self.execute(Method::PUT, path, query, Some(body)).await
    }

    /// Make an authenticated PATCH request with JSON body
    pub async fn patch(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<Value, GoogleError> {
        self.execute(Method::PATCH, path, query, Some(body)).await
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, path: &str) -> Result<Value, GoogleError> {
        self.execute(Method::DELETE, path, &[], None).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, GoogleError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut builder = self.http.request(method, &url).bearer_auth(token);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!("Response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by Google API");
            return Err(GoogleError::RateLimited);
        }

        let text = response.text().await?;

        // Empty successful responses (e.g., DELETE)
        if status.is_success() && text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        if !status.is_success() {
            let err = extract_error(&text, status);
            error!("Google API error: {}", err);
            return Err(err);
        }

        serde_json::from_str(&text)
            .map_err(|e| GoogleError::Decode(format!("invalid JSON ({}): {}", e, truncate(&text))))
    }
}

/// Extract the error from a Google API error response.
///
/// Google APIs return errors in this format:
/// `{"error": {"code": 400, "message": "Invalid request", "errors": [...]}}`
fn extract_error(body: &str, status: StatusCode) -> GoogleError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error_obj = parsed.as_ref().and_then(|v| v.get("error"));

    if let Some(message) = error_obj
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
    {
        let code = error_obj
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_u64())
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(status.as_u16());
        return GoogleError::Api {
            code,
            message: message.to_string(),
        };
    }

    // Fallback to status code
    GoogleError::Api {
        code: status.as_u16(),
        message: status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {} error", status.as_u16())),
    }
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 200;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::json;

    pub(crate) struct StaticToken(pub &'static str);

    #[async_trait]
    impl TokenSource for StaticToken {
        async fn access_token(&self) -> Result<String, AuthError> {
            Ok(self.0.to_string())
        }
    }

    struct NoToken;

    #[async_trait]
    impl TokenSource for NoToken {
        async fn access_token(&self) -> Result<String, AuthError> {
            Err(AuthError::NotAuthenticated)
        }
    }

    pub(crate) fn client_for(server: &MockServer) -> GoogleClient {
        GoogleClient::new(Client::new(), Arc::new(StaticToken("test-token")), server.base_url())
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error": {"code": 400, "message": "Invalid request format"}}"#;
        let err = extract_error(body, StatusCode::BAD_REQUEST);
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("Invalid request format"));
        assert_eq!(err.kind(), ErrorKind::Remote);
    }

    #[test]
    fn test_non_json_error_falls_back_to_status() {
        let err = extract_error("<html>gone</html>", StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Google API error 404: Not Found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_permission_errors_are_authorization() {
        let err = extract_error(
            r#"{"error": {"code": 403, "message": "Insufficient Permission"}}"#,
            StatusCode::FORBIDDEN,
        );
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_bearer_token_and_query_are_sent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/things")
                    .query_param("pageSize", "5")
                    .header("authorization", "Bearer test-token");
                then.status(200).json_body(json!({"things": [1, 2]}));
            })
            .await;

        let value = client_for(&server)
            .get("/things", &[("pageSize", "5".to_string())])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(value["things"], json!([1, 2]));
    }

    #[tokio::test]
    async fn test_empty_body_becomes_empty_object() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/things/1");
                then.status(204);
            })
            .await;

        let value = client_for(&server).delete("/things/1").await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/busy");
                then.status(429);
            })
            .await;

        let err = client_for(&server).get("/busy", &[]).await.unwrap_err();
        assert!(matches!(err, GoogleError::RateLimited));
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_token_failure_short_circuits() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let client = GoogleClient::new(Client::new(), Arc::new(NoToken), server.base_url());
        let err = client.get("/anything", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(mock.hits_async().await, 0);
    }
}

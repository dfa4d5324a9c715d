//! Workspace context
//!
//! Everything a tool call needs, built once at startup: one adapter per
//! service, all sharing a single HTTP client and credential source.

use std::sync::Arc;

use crate::auth::TokenSource;
use crate::google::{
    CalendarApi, ChatApi, DocsApi, DriveApi, FormsApi, GmailApi, SheetsApi,
};

/// Base URL for each service API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEndpoints {
    pub gmail: String,
    pub chat: String,
    pub sheets: String,
    pub drive: String,
    pub forms: String,
    pub calendar: String,
    pub docs: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            gmail: GmailApi::DEFAULT_BASE_URL.to_string(),
            chat: ChatApi::DEFAULT_BASE_URL.to_string(),
            sheets: SheetsApi::DEFAULT_BASE_URL.to_string(),
            drive: DriveApi::DEFAULT_BASE_URL.to_string(),
            forms: FormsApi::DEFAULT_BASE_URL.to_string(),
            calendar: CalendarApi::DEFAULT_BASE_URL.to_string(),
            docs: DocsApi::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Every API under one root, keeping each API's own path
    /// (`<root>/gmail/v1`, `<root>/drive/v3`, ...).
    pub fn rooted_at(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            gmail: format!("{}/gmail/v1", root),
            chat: format!("{}/chat/v1", root),
            sheets: format!("{}/sheets/v4", root),
            drive: format!("{}/drive/v3", root),
            forms: format!("{}/forms/v1", root),
            calendar: format!("{}/calendar/v3", root),
            docs: format!("{}/docs/v1", root),
        }
    }
}

pub struct WorkspaceContext {
    pub gmail: GmailApi,
    pub chat: ChatApi,
    pub sheets: SheetsApi,
    pub drive: DriveApi,
    pub forms: FormsApi,
    pub calendar: CalendarApi,
    pub docs: DocsApi,
}

impl WorkspaceContext {
    pub fn new(http: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_endpoints(http, tokens, &ApiEndpoints::default())
    }

    pub fn with_endpoints(
        http: reqwest::Client,
        tokens: Arc<dyn TokenSource>,
        endpoints: &ApiEndpoints,
    ) -> Self {
        Self {
            gmail: GmailApi::with_base_url(http.clone(), tokens.clone(), &endpoints.gmail),
            chat: ChatApi::with_base_url(http.clone(), tokens.clone(), &endpoints.chat),
            sheets: SheetsApi::with_base_url(http.clone(), tokens.clone(), &endpoints.sheets),
            drive: DriveApi::with_base_url(http.clone(), tokens.clone(), &endpoints.drive),
            forms: FormsApi::with_base_url(http.clone(), tokens.clone(), &endpoints.forms),
            calendar: CalendarApi::with_base_url(http.clone(), tokens.clone(), &endpoints.calendar),
            docs: DocsApi::with_base_url(http, tokens, &endpoints.docs),
        }
    }
}

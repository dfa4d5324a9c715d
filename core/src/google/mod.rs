//! Google API Client Module
//!
//! One thin REST wrapper per Workspace API. Each wrapper owns a
//! [`client::GoogleClient`] bound to that API's base URL and returns the raw
//! JSON payloads; reshaping into tool output happens in `crate::tools::handlers`.

pub mod calendar_api;
pub mod chat;
pub mod client;
pub mod common;
pub mod docs;
pub mod drive;
pub mod forms;
pub mod gmail;
pub mod sheets;

pub use calendar_api::CalendarApi;
pub use chat::ChatApi;
pub use client::{GoogleClient, GoogleError};
pub use docs::DocsApi;
pub use drive::DriveApi;
pub use forms::FormsApi;
pub use gmail::GmailApi;
pub use sheets::SheetsApi;

/// Macro to implement the standard Google API wrapper constructor pattern.
/// Each API struct wraps a `GoogleClient` and provides `new` (production base
/// URL) and `with_base_url` (tests, proxies).
macro_rules! google_api_wrapper {
    ($name:ident, $base:expr) => {
        impl $name {
            pub const DEFAULT_BASE_URL: &'static str = $base;

            pub fn new(
                http: reqwest::Client,
                tokens: std::sync::Arc<dyn crate::auth::TokenSource>,
            ) -> Self {
                Self::with_base_url(http, tokens, $base)
            }

            pub fn with_base_url(
                http: reqwest::Client,
                tokens: std::sync::Arc<dyn crate::auth::TokenSource>,
                base_url: &str,
            ) -> Self {
                Self {
                    client: crate::google::client::GoogleClient::new(http, tokens, base_url),
                }
            }
        }
    };
}

pub(crate) use google_api_wrapper;

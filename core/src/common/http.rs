//! HTTP Client Utilities
//!
//! One reqwest client is built at start-up and shared by the OAuth provider and
//! every service adapter.

use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;

pub type HttpClient = reqwest::Client;

/// Create a reqwest HTTP client with the standard 30 second timeout
pub fn create_http_client() -> Result<reqwest::Client, String> {
    create_http_client_with_timeout(30)
}

/// Create a reqwest HTTP client with a custom request timeout
pub fn create_http_client_with_timeout(timeout_secs: u64) -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(concat!("gworkspace/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}

//! Google OAuth2 Provider
//!
//! Implements the PKCE Authorization Code flow for an installed application.
//! Client identity and endpoints come from the `client_secret.json` downloaded
//! from Google Cloud Console.

use serde::Deserialize;
use std::path::Path;
use tracing::{error, info};

use super::{OAuthProvider, OAuthTokens};

// ── Google OAuth endpoints ──────────────────────────────────────────────────

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";

/// Scopes requested for the seven Workspace services.
pub const WORKSPACE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.compose",
    "https://www.googleapis.com/auth/chat.spaces",
    "https://www.googleapis.com/auth/chat.messages",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/forms.body",
    "https://www.googleapis.com/auth/forms.responses.readonly",
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/calendar.events",
    "https://www.googleapis.com/auth/documents",
];

// ── Client secret file ──────────────────────────────────────────────────────

/// `client_secret.json` as downloaded from Google Cloud Console.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_revoke_uri")]
    pub revoke_uri: String,
}

fn default_auth_uri() -> String {
    AUTH_ENDPOINT.to_string()
}

fn default_token_uri() -> String {
    TOKEN_ENDPOINT.to_string()
}

fn default_revoke_uri() -> String {
    REVOKE_ENDPOINT.to_string()
}

impl ClientSecret {
    pub fn parse(json: &str) -> Result<Self, String> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| format!("Invalid client secret JSON: {}", e))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| "Client secret JSON has neither an 'installed' nor a 'web' section".to_string())
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }
}

// ── Provider ────────────────────────────────────────────────────────────────

/// Google OAuth2 provider.
pub struct GoogleProvider {
    secret: ClientSecret,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(secret: ClientSecret, http: reqwest::Client) -> Self {
        Self { secret, http }
    }

    pub fn client_id(&self) -> &str {
        &self.secret.client_id
    }

    /// POST a form-encoded request and return the response body.
    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<String, String> {
        let response = self
            .http
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?;

        if !status.is_success() {
            error!("OAuth endpoint returned HTTP {}: {}", status, body);
            return Err(describe_oauth_error(&body)
                .unwrap_or_else(|| format!("HTTP {} error: {}", status, body)));
        }

        Ok(body)
    }
}

impl OAuthProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorize_url(
        &self,
        scopes: &[String],
        state: &str,
        code_challenge: &str,
        redirect_uri: &str,
    ) -> String {
        let scope_str = scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
            self.secret.auth_uri,
            urlencoding::encode(&self.secret.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope_str),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<OAuthTokens, String> {
        info!("Exchanging authorization code for tokens");

        let params = [
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.post_form(&self.secret.token_uri, &params).await?;
        parse_token_response(&response)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthTokens, String> {
        info!("Refreshing access token");

        let params = [
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.post_form(&self.secret.token_uri, &params).await?;
        parse_token_response(&response)
    }

    async fn revoke_token(&self, token: &str) -> Result<(), String> {
        info!("Revoking token at Google");
        self.post_form(&self.secret.revoke_uri, &[("token", token)])
            .await
            .map(|_| ())
    }
}

/// Pull `error: error_description` out of an OAuth error body.
fn describe_oauth_error(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    let err = parsed.get("error").and_then(|v| v.as_str())?;
    let desc = parsed
        .get("error_description")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown error");
    Some(format!("{}: {}", err, desc))
}

/// Parse a Google OAuth2 token response.
fn parse_token_response(body: &str) -> Result<OAuthTokens, String> {
    if let Some(err) = describe_oauth_error(body) {
        return Err(err);
    }

    let parsed: serde_json::Value =
        serde_json::from_str(body).map_err(|e| format!("Invalid JSON response: {}", e))?;

    let access_token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or("Missing access_token in response")?
        .to_string();

    let refresh_token = parsed
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .map(String::from);

    let token_type = parsed
        .get("token_type")
        .and_then(|v| v.as_str())
        .unwrap_or("Bearer")
        .to_string();

    let expires_in = parsed
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(3600);

    let expiry = (chrono::Utc::now() + chrono::Duration::seconds(expires_in)).to_rfc3339();

    let scopes = parsed
        .get("scope")
        .and_then(|v| v.as_str())
        .map(|s| s.split_whitespace().map(String::from).collect())
        .unwrap_or_default();

    Ok(OAuthTokens {
        access_token,
        refresh_token,
        token_type,
        expiry,
        scopes,
    })
}

// ── PKCE Utilities ──────────────────────────────────────────────────────────

/// Generate a PKCE code verifier (43-128 characters of unreserved URI characters).
pub fn generate_code_verifier() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64_url_encode(&bytes)
}

/// Derive the PKCE code challenge from a code verifier using S256.
pub fn generate_code_challenge(verifier: &str) -> String {
    use sha2::{Digest, Sha256};
    base64_url_encode(&Sha256::digest(verifier.as_bytes()))
}

fn base64_url_encode(data: &[u8]) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD.encode(data)
}

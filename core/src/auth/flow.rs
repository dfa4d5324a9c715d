//! Interactive consent
//!
//! Loopback-redirect PKCE flow: bind `127.0.0.1:0`, send the user's browser to
//! Google's consent screen, and wait for the redirect carrying the
//! authorization code.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use super::provider::google::{generate_code_challenge, generate_code_verifier, GoogleProvider};
use super::provider::{OAuthProvider, OAuthTokens};
use super::AuthError;

/// Obtains a brand new grant from the user.
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    async fn authorize(
        &self,
        provider: &GoogleProvider,
        scopes: &[String],
    ) -> Result<OAuthTokens, AuthError>;
}

/// Browser + loopback listener consent.
pub struct LoopbackConsent {
    timeout: Duration,
    open_browser: bool,
}

impl LoopbackConsent {
    pub fn new(timeout: Duration, open_browser: bool) -> Self {
        Self {
            timeout,
            open_browser,
        }
    }
}

#[async_trait]
impl ConsentFlow for LoopbackConsent {
    async fn authorize(
        &self,
        provider: &GoogleProvider,
        scopes: &[String],
    ) -> Result<OAuthTokens, AuthError> {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| AuthError::Consent(format!("Failed to bind local server: {}", e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AuthError::Consent(format!("Failed to get local address: {}", e)))?;

        let redirect_uri = format!("http://127.0.0.1:{}", local_addr.port());
        info!("OAuth callback server listening on {}", redirect_uri);

        let state = generate_state();
        let auth_url = provider.authorize_url(scopes, &state, &code_challenge, &redirect_uri);

        // stderr: stdout belongs to the protocol stream
        eprintln!(
            "Authorize {} access by visiting:\n\n    {}\n",
            provider.name(),
            auth_url
        );
        if self.open_browser {
            if let Err(e) = open::that(&auth_url) {
                warn!("Failed to open browser automatically: {}", e);
            }
        }

        let code = wait_for_callback(&listener, &state, self.timeout).await?;

        provider
            .exchange_code(&code, &code_verifier, &redirect_uri)
            .await
            .map_err(AuthError::Exchange)
    }
}

/// Accept connections until one carries `code` + matching `state`, or an `error`.
pub(crate) async fn wait_for_callback(
    listener: &TcpListener,
    state: &str,
    timeout: Duration,
) -> Result<String, AuthError> {
    tokio::time::timeout(timeout, async {
        loop {
            let (mut socket, _) = listener
                .accept()
                .await
                .map_err(|e| AuthError::Consent(format!("Callback server error: {}", e)))?;

            let params = match read_request_params(&mut socket).await {
                Ok(Some(p)) => p,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Dropping malformed callback request: {}", e);
                    continue;
                }
            };

            if let (Some(code), Some(received_state)) = (params.get("code"), params.get("state")) {
                if received_state != state {
                    respond(&mut socket, "400 Bad Request", "Invalid state parameter. Please try again.").await;
                    return Err(AuthError::Consent("State mismatch in OAuth callback".to_string()));
                }
                respond(&mut socket, "200 OK", "Authentication successful! You can close this tab.").await;
                return Ok(code.clone());
            }

            if let Some(error) = params.get("error") {
                let desc = params
                    .get("error_description")
                    .map(String::as_str)
                    .unwrap_or("Unknown error");
                respond(&mut socket, "400 Bad Request", &format!("Error: {} - {}", error, desc)).await;
                return Err(AuthError::Consent(format!("{}: {}", error, desc)));
            }

            // Favicon and other stray requests
            respond(&mut socket, "404 Not Found", "Waiting for authorization...").await;
        }
    })
    .await
    .map_err(|_| AuthError::ConsentTimedOut(timeout.as_secs()))?
}

/// Read the request line ("GET /path?query HTTP/1.1") and parse its query string.
async fn read_request_params(
    socket: &mut TcpStream,
) -> std::io::Result<Option<HashMap<String, String>>> {
    let mut reader = BufReader::new(socket);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Drain headers so closing the socket does not reset the browser's connection
    let mut header = String::new();
    loop {
        header.clear();
        let n = reader.read_line(&mut header).await?;
        if n == 0 || header.trim().is_empty() {
            break;
        }
    }

    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Ok(None);
    };
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");
    Ok(Some(parse_query_params(query)))
}

async fn respond(socket: &mut TcpStream, status: &str, message: &str) {
    if let Err(e) = send_response(socket, status, callback_html(message)).await {
        warn!("Failed to answer OAuth callback: {}", e);
    }
}

/// Generate a random state string for CSRF protection
fn generate_state() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::rngs::OsRng.gen();
    hex::encode(bytes)
}

/// Parse URL query parameters into a HashMap
fn parse_query_params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            let decoded = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
            Some((key.to_string(), decoded))
        })
        .collect()
}

async fn send_response(socket: &mut TcpStream, status: &str, html: String) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        html.len(),
        html
    );
    socket.write_all(response.as_bytes()).await?;
    socket.flush().await
}

fn callback_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Google Workspace MCP</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 20vh;">
    <h1>Google Workspace MCP</h1>
    <p>{}</p>
</body>
</html>"#,
        message
    )
}

//! Credential lifecycle
//!
//! One Google credential per process. The record is encrypted at rest with
//! AES-256-GCM under a key derived from machine identity + user name
//! (HKDF-SHA256), cached in memory, refreshed on demand and replaced by an
//! interactive consent grant when refresh is impossible.
//!
//! Refresh and consent are serialized through a single gate: concurrent
//! callers that observe an expired token wait for the one refresh in flight
//! and then reuse its result.

pub mod crypto;
pub mod flow;
pub mod provider;
pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::WorkspaceConfig;

use self::provider::google::{ClientSecret, GoogleProvider};
use self::provider::{OAuthProvider, OAuthTokens};
use self::store::TokenStore;

pub use self::flow::{ConsentFlow, LoopbackConsent};

/// Tokens expiring within this window are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

// ── Public types ────────────────────────────────────────────────────────────

/// Stored token record (decrypted form)
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct TokenRecord {
    #[zeroize(skip)]
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[zeroize(skip)]
    pub expiry: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub scopes: Vec<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub issued_at: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub last_refreshed: String,
}

// Custom Debug implementation that redacts sensitive fields
impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("scopes", &self.scopes)
            .field("issued_at", &self.issued_at)
            .field("last_refreshed", &self.last_refreshed)
            .finish()
    }
}

impl TokenRecord {
    /// Build a record from a fresh consent grant.
    pub fn from_grant(tokens: OAuthTokens) -> Self {
        Self {
            token_type: tokens.token_type,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token.unwrap_or_default(),
            expiry: tokens.expiry,
            scopes: tokens.scopes,
            issued_at: chrono::Utc::now().to_rfc3339(),
            last_refreshed: String::new(),
        }
    }

    /// Replace the access token with a refreshed one. Google usually omits the
    /// refresh token and scope on refresh; the previous values are kept then.
    fn apply_refresh(&mut self, tokens: OAuthTokens) {
        self.access_token = tokens.access_token;
        if let Some(rt) = tokens.refresh_token {
            self.refresh_token = rt;
        }
        if !tokens.scopes.is_empty() {
            self.scopes = tokens.scopes;
        }
        self.token_type = tokens.token_type;
        self.expiry = tokens.expiry;
        self.last_refreshed = chrono::Utc::now().to_rfc3339();
    }

    pub fn is_valid(&self) -> bool {
        !is_token_expiring(&self.expiry, EXPIRY_MARGIN_SECS)
    }

    pub fn is_refreshable(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// Credential summary for `auth status` (no secrets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub token_path: PathBuf,
    pub client_secret_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    pub scopes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("OAuth client secret not found at {0}. Download an OAuth 2.0 Desktop client JSON from Google Cloud Console and place it there.")]
    ClientSecretMissing(PathBuf),

    #[error("Invalid OAuth client secret: {0}")]
    ClientSecretInvalid(String),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Failed to persist credential: {0}")]
    Persist(String),

    #[error("No valid credential and interactive authorization is not allowed here; run `gworkspace-mcp auth login`")]
    NotAuthenticated,

    #[error("Authorization failed: {0}")]
    Consent(String),

    #[error("Authorization timed out after {0} seconds")]
    ConsentTimedOut(u64),

    #[error("Token exchange failed: {0}")]
    Exchange(String),
}

/// Supplies a bearer token for each outgoing API call.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

// ── Credential Provider ─────────────────────────────────────────────────────

pub struct CredentialProvider {
    store: TokenStore,
    client_secret_path: PathBuf,
    scopes: Vec<String>,
    consent: Arc<dyn ConsentFlow>,
    http: reqwest::Client,
    cached: RwLock<Option<TokenRecord>>,
    refresh_gate: Mutex<()>,
}

impl CredentialProvider {
    pub fn new(
        store: TokenStore,
        client_secret_path: PathBuf,
        scopes: Vec<String>,
        consent: Arc<dyn ConsentFlow>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            store,
            client_secret_path,
            scopes,
            consent,
            http,
            cached: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Provider with the on-disk store and browser consent described by `config`.
    pub fn from_config(
        config: &WorkspaceConfig,
        home: &Path,
        http: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let store = TokenStore::open(config.token_path(home)).map_err(AuthError::Store)?;
        let consent = Arc::new(LoopbackConsent::new(
            Duration::from_secs(config.consent_timeout_secs),
            config.open_browser,
        ));
        Ok(Self::new(
            store,
            config.client_secret_path(home),
            config.scopes.clone(),
            consent,
            http,
        ))
    }

    /// Return a currently valid credential, refreshing or re-consenting as needed.
    pub async fn acquire(&self) -> Result<TokenRecord, AuthError> {
        self.obtain(true).await
    }

    /// Whether a valid credential can be produced without user interaction.
    /// May refresh (and persist) an expired token; never prompts.
    pub async fn is_authenticated(&self) -> bool {
        match self.obtain(false).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Not authenticated: {}", e);
                false
            }
        }
    }

    pub async fn status(&self) -> AuthStatus {
        let authenticated = self.is_authenticated().await;
        let cached = self.cached.read().await.clone();
        AuthStatus {
            authenticated,
            token_path: self.store.path().to_path_buf(),
            client_secret_present: self.client_secret_path.exists(),
            expiry: cached.as_ref().map(|r| r.expiry.clone()),
            scopes: cached.map(|r| r.scopes.clone()).unwrap_or_default(),
        }
    }

    /// Run the consent flow unconditionally and persist the new grant.
    pub async fn login(&self) -> Result<TokenRecord, AuthError> {
        let _gate = self.refresh_gate.lock().await;
        let provider = self.oauth_client()?;
        self.consent_and_persist(&provider).await
    }

    /// Delete the persisted credential; the next `acquire` re-runs consent.
    /// Provider-side revocation is best-effort.
    pub async fn revoke(&self) -> Result<(), AuthError> {
        let _gate = self.refresh_gate.lock().await;

        let cached = self.cached.read().await.clone();
        let current = match cached {
            Some(record) => Some(record),
            None => self.store.load().unwrap_or_else(|e| {
                warn!("Could not read credential before revocation: {}", e);
                None
            }),
        };

        if let Some(record) = current {
            match self.oauth_client() {
                Ok(provider) => {
                    // Revoking the refresh token also invalidates its access tokens
                    let token = if record.is_refreshable() {
                        &record.refresh_token
                    } else {
                        &record.access_token
                    };
                    if let Err(e) = provider.revoke_token(token).await {
                        warn!("Provider-side revocation failed (continuing): {}", e);
                    }
                }
                Err(e) => warn!("Skipping provider-side revocation: {}", e),
            }
        }

        *self.cached.write().await = None;
        self.store.delete().map_err(AuthError::Persist)?;
        info!("Revoked stored credential");
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────────────────────

    async fn cached_valid(&self) -> Option<TokenRecord> {
        self.cached
            .read()
            .await
            .as_ref()
            .filter(|r| r.is_valid())
            .cloned()
    }

    async fn obtain(&self, interactive: bool) -> Result<TokenRecord, AuthError> {
        if let Some(record) = self.cached_valid().await {
            return Ok(record);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited for the gate
        if let Some(record) = self.cached_valid().await {
            return Ok(record);
        }

        let cached = self.cached.read().await.clone();
        let current = match cached {
            Some(record) => Some(record),
            None => self.store.load().map_err(AuthError::Store)?,
        };

        if let Some(mut record) = current {
            if record.is_valid() {
                debug!("Using stored credential (expires {})", record.expiry);
                *self.cached.write().await = Some(record.clone());
                return Ok(record);
            }

            if record.is_refreshable() {
                let provider = self.oauth_client()?;
                match provider.refresh_token(&record.refresh_token).await {
                    Ok(tokens) => {
                        record.apply_refresh(tokens);
                        self.persist(&record).await?;
                        info!("Refreshed access token (expires {})", record.expiry);
                        return Ok(record);
                    }
                    Err(e) => warn!("Token refresh failed, re-authorization required: {}", e),
                }
            } else {
                info!("Stored credential expired and has no refresh token");
            }
        }

        if !interactive {
            return Err(AuthError::NotAuthenticated);
        }

        let provider = self.oauth_client()?;
        self.consent_and_persist(&provider).await
    }

    async fn consent_and_persist(&self, provider: &GoogleProvider) -> Result<TokenRecord, AuthError> {
        info!(
            "Starting interactive authorization ({} scopes)",
            self.scopes.len()
        );
        let tokens = self.consent.authorize(provider, &self.scopes).await?;
        let record = TokenRecord::from_grant(tokens);
        if !record.is_refreshable() {
            warn!("Grant carried no refresh token; consent will be needed again after expiry");
        }
        self.persist(&record).await?;
        info!("Authorization complete");
        Ok(record)
    }

    async fn persist(&self, record: &TokenRecord) -> Result<(), AuthError> {
        self.store.save(record).map_err(AuthError::Persist)?;
        *self.cached.write().await = Some(record.clone());
        Ok(())
    }

    fn oauth_client(&self) -> Result<GoogleProvider, AuthError> {
        if !self.client_secret_path.exists() {
            return Err(AuthError::ClientSecretMissing(self.client_secret_path.clone()));
        }
        let secret =
            ClientSecret::load(&self.client_secret_path).map_err(AuthError::ClientSecretInvalid)?;
        Ok(GoogleProvider::new(secret, self.http.clone()))
    }
}

#[async_trait]
impl TokenSource for CredentialProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let record = self.acquire().await?;
        Ok(record.access_token.clone())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Check whether a token's expiry (RFC 3339) is within `margin_secs` of now.
fn is_token_expiring(expiry: &str, margin_secs: i64) -> bool {
    match chrono::DateTime::parse_from_rfc3339(expiry) {
        Ok(exp) => {
            let remaining = exp.signed_duration_since(chrono::Utc::now()).num_seconds();
            remaining < margin_secs
        }
        Err(_) => true, // unparseable ⇒ treat as expired
    }
}

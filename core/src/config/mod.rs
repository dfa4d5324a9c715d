//! Configuration management
//!
//! Reads the optional `config.json` from the server home directory. Every
//! field has a default, so a missing file is equivalent to `{}`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::provider::google::WORKSPACE_SCOPES;
use crate::common::paths;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding the client secret and token. Defaults to `<home>/credentials`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_dir: Option<PathBuf>,
    pub client_secret_file: String,
    pub token_file: String,
    pub consent_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub open_browser: bool,
    pub scopes: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            credentials_dir: None,
            client_secret_file: "client_secret.json".to_string(),
            token_file: "token.json.enc".to_string(),
            consent_timeout_secs: 120,
            http_timeout_secs: 30,
            open_browser: true,
            scopes: WORKSPACE_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl WorkspaceConfig {
    /// Load `<home>/config.json`, falling back to defaults when it does not exist.
    pub fn load(home: &Path) -> Result<Self, ConfigError> {
        let path = paths::config_path(home);
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn credentials_dir(&self, home: &Path) -> PathBuf {
        self.credentials_dir
            .clone()
            .unwrap_or_else(|| paths::default_credentials_dir(home))
    }

    pub fn client_secret_path(&self, home: &Path) -> PathBuf {
        self.credentials_dir(home).join(&self.client_secret_file)
    }

    pub fn token_path(&self, home: &Path) -> PathBuf {
        self.credentials_dir(home).join(&self.token_file)
    }
}

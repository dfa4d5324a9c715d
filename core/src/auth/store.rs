//! Token Store
//!
//! Single encrypted credential file (by default `<credentials_dir>/token.json.enc`).
//! Writes go to a temporary sibling and are renamed into place.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::crypto::{self, KEY_SIZE};
use super::TokenRecord;

pub struct TokenStore {
    path: PathBuf,
    master_key: [u8; KEY_SIZE],
}

impl TokenStore {
    pub fn new(path: PathBuf, master_key: [u8; KEY_SIZE]) -> Self {
        Self { path, master_key }
    }

    /// Open the store at `path` with the machine-derived master key.
    pub fn open(path: PathBuf) -> Result<Self, String> {
        let master_key = crypto::derive_master_key()?;
        Ok(Self::new(path, master_key))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record.
    ///
    /// A file that cannot be decrypted or parsed is reported as absent so the
    /// caller falls back to re-consent; only IO failures are errors.
    pub fn load(&self) -> Result<Option<TokenRecord>, String> {
        if !self.path.exists() {
            debug!("No token file at {:?}", self.path);
            return Ok(None);
        }

        let encrypted =
            fs::read(&self.path).map_err(|e| format!("Failed to read token file: {}", e))?;

        let decrypted = match crypto::decrypt(&self.master_key, &encrypted) {
            Ok(d) => d,
            Err(e) => {
                warn!("Ignoring unreadable token file {:?}: {}", self.path, e);
                return Ok(None);
            }
        };

        match serde_json::from_slice::<TokenRecord>(&decrypted) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Ignoring malformed token file {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    /// Encrypt and persist `record`, replacing any previous one.
    pub fn save(&self, record: &TokenRecord) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create credentials dir: {}", e))?;
        }

        let json = serde_json::to_vec(record)
            .map_err(|e| format!("Failed to serialize token: {}", e))?;
        let encrypted = crypto::encrypt(&self.master_key, &json)?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &encrypted).map_err(|e| format!("Failed to write token file: {}", e))?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| format!("Failed to move token file into place: {}", e))?;

        info!("Persisted credential to {:?}", self.path);
        Ok(())
    }

    /// Remove the persisted record. Returns whether a file existed.
    pub fn delete(&self) -> Result<bool, String> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| format!("Failed to delete token file: {}", e))?;
        info!("Deleted credential at {:?}", self.path);
        Ok(true)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), String> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| format!("Failed to restrict token file permissions: {}", e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), String> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(token: &str) -> TokenRecord {
        TokenRecord {
            token_type: "Bearer".to_string(),
            access_token: token.to_string(),
            refresh_token: "1//refresh".to_string(),
            expiry: "2030-01-01T00:00:00+00:00".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/drive".to_string()],
            issued_at: String::new(),
            last_refreshed: String::new(),
        }
    }

    fn store_in(dir: &Path) -> TokenStore {
        TokenStore::new(
            dir.join("nested").join("token.json.enc"),
            crypto::derive_key("test-machine", "tester").unwrap(),
        )
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.load().unwrap().is_none());

        store.save(&record("ya29.first")).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "ya29.first");
        assert_eq!(loaded.refresh_token, "1//refresh");

        // File is not plaintext JSON
        let raw = fs::read(store.path()).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("ya29.first"));
    }

    #[test]
    fn save_overwrites_previous_record() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save(&record("a")).unwrap();
        store.save(&record("b")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().access_token, "b");
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn foreign_key_reads_as_absent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save(&record("a")).unwrap();

        let other = TokenStore::new(
            store.path().to_path_buf(),
            crypto::derive_key("other-machine", "tester").unwrap(),
        );
        assert!(other.load().unwrap().is_none());
    }

    #[test]
    fn delete_reports_presence() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(!store.delete().unwrap());
        store.save(&record("a")).unwrap();
        assert!(store.delete().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_into_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a dir").unwrap();
        let store = TokenStore::new(
            blocker.join("token.json.enc"),
            crypto::derive_key("m", "u").unwrap(),
        );
        assert!(store.save(&record("a")).is_err());
    }
}

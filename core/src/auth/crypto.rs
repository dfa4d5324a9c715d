//! Cryptographic utilities for the credential store
//!
//! - AES-256-GCM for token encryption at rest
//! - Master key derived from machine identity + user name via HKDF-SHA256

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use tracing::{debug, warn};

/// AES-256-GCM nonce size (96 bits)
const NONCE_SIZE: usize = 12;
/// AES-256 key size (256 bits)
pub const KEY_SIZE: usize = 32;

const KEY_SALT: &[u8] = b"gworkspace-mcp/token-store/v1";
const KEY_INFO: &[u8] = b"aes-256-gcm master key";

const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

// ── Encryption / Decryption ─────────────────────────────────────────────────

/// Encrypt plaintext bytes with AES-256-GCM.
/// Returns: nonce (12 bytes) || ciphertext+tag
pub fn encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> Result<Vec<u8>, String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| format!("Encryption failed: {}", e))?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data produced by `encrypt()`.
pub fn decrypt(key: &[u8; KEY_SIZE], data: &[u8]) -> Result<Vec<u8>, String> {
    if data.len() < NONCE_SIZE {
        return Err("Ciphertext too short".to_string());
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| format!("Decryption failed: {}", e))
}

// ── Master Key ──────────────────────────────────────────────────────────────

/// Derive the store's master key for the current machine and user.
///
/// The key is never written anywhere; moving the token file to another machine
/// (or another account) makes it undecryptable, which the store treats as
/// "no credential".
pub fn derive_master_key() -> Result<[u8; KEY_SIZE], String> {
    let machine = machine_identity();
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    debug!("Deriving master key for user {:?}", user);
    derive_key(&machine, &user)
}

pub fn derive_key(machine_id: &str, user: &str) -> Result<[u8; KEY_SIZE], String> {
    let ikm = format!("{}:{}", machine_id, user);
    let hk = Hkdf::<Sha256>::new(Some(KEY_SALT), ikm.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    hk.expand(KEY_INFO, &mut key)
        .map_err(|e| format!("Key derivation failed: {}", e))?;
    Ok(key)
}

fn machine_identity() -> String {
    for path in MACHINE_ID_PATHS {
        if let Ok(id) = std::fs::read_to_string(path) {
            let id = id.trim();
            if !id.is_empty() {
                return id.to_string();
            }
        }
    }

    warn!("No machine-id found, falling back to host name for key derivation");
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = derive_key("machine", "user").unwrap();
        let plaintext = b"{\"access_token\":\"ya29\"}";
        let encrypted = encrypt(&key, plaintext).unwrap();
        assert_ne!(&encrypted[NONCE_SIZE..], plaintext);
        assert_eq!(decrypt(&key, &encrypted).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = derive_key("machine-a", "user").unwrap();
        let key2 = derive_key("machine-b", "user").unwrap();

        let encrypted = encrypt(&key1, b"secret").unwrap();
        assert!(decrypt(&key2, &encrypted).is_err());
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = derive_key("m", "u").unwrap();
        assert!(decrypt(&key, &[0u8; 4]).is_err());
    }

    #[test]
    fn test_derivation_is_deterministic_per_user() {
        assert_eq!(derive_key("m", "alice").unwrap(), derive_key("m", "alice").unwrap());
        assert_ne!(derive_key("m", "alice").unwrap(), derive_key("m", "bob").unwrap());
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        let key = derive_key("m", "u").unwrap();
        let a = encrypt(&key, b"same").unwrap();
        let b = encrypt(&key, b"same").unwrap();
        assert_ne!(a, b);
    }
}

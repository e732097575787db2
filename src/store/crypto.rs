//! Passphrase encryption for stored credentials.
//!
//! Keys are derived with PBKDF2-HMAC-SHA256 and payloads sealed with
//! AES-256-GCM. The result is a self-describing envelope so the parameters
//! can change without breaking previously stored data.

use aes_gcm::aead::rand_core::RngCore as _;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::BundlerError;

const ENVELOPE_VERSION: u32 = 1;
const ALGORITHM: &str = "AES-GCM";
const KEY_DERIVATION: &str = "PBKDF2";
const SALT_BYTES: usize = 16;
const IV_BYTES: usize = 12;
pub const DEFAULT_ITERATIONS: u32 = 100_000;
/// Envelopes claiming more rounds than this are rejected before derivation.
const MAX_ITERATIONS: u32 = 10_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    pub version: u32,
    pub algorithm: String,
    pub key_derivation: String,
    pub iterations: u32,
    pub salt: String,
    pub iv: String,
    pub data: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct PassphraseCipher {
    iterations: u32,
}

impl Default for PassphraseCipher {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl PassphraseCipher {
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.clamp(1, MAX_ITERATIONS),
        }
    }

    pub fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Result<EncryptedEnvelope, BundlerError> {
        let mut salt = [0u8; SALT_BYTES];
        let mut iv = [0u8; IV_BYTES];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let key = derive_key(passphrase.as_bytes(), &salt, self.iterations);
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| BundlerError::CryptoUnavailable {
            reason: "derived key has invalid length".to_string(),
        })?;
        let data = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| BundlerError::CryptoUnavailable {
                reason: "AES-GCM encryption failed".to_string(),
            })?;

        Ok(EncryptedEnvelope {
            version: ENVELOPE_VERSION,
            algorithm: ALGORITHM.to_string(),
            key_derivation: KEY_DERIVATION.to_string(),
            iterations: self.iterations,
            salt: BASE64_STANDARD.encode(salt),
            iv: BASE64_STANDARD.encode(iv),
            data: BASE64_STANDARD.encode(data),
            timestamp: Utc::now(),
        })
    }

    /// Decrypts with the parameters recorded in the envelope, not the
    /// cipher's own iteration count.
    pub fn decrypt(&self, envelope: &EncryptedEnvelope, passphrase: &str) -> Result<Vec<u8>, BundlerError> {
        if envelope.version != ENVELOPE_VERSION
            || envelope.algorithm != ALGORITHM
            || envelope.key_derivation != KEY_DERIVATION
        {
            return Err(BundlerError::CryptoUnavailable {
                reason: format!(
                    "unsupported envelope v{} ({}/{})",
                    envelope.version, envelope.algorithm, envelope.key_derivation
                ),
            });
        }

        let decode = |field: &str| {
            BASE64_STANDARD
                .decode(field)
                .map_err(|_| BundlerError::DecryptFailed)
        };
        let salt = decode(&envelope.salt)?;
        let iv = decode(&envelope.iv)?;
        let data = decode(&envelope.data)?;
        if iv.len() != IV_BYTES {
            return Err(BundlerError::DecryptFailed);
        }
        if envelope.iterations > MAX_ITERATIONS {
            tracing::warn!(
                iterations = envelope.iterations,
                max = MAX_ITERATIONS,
                "credential envelope exceeds the iteration limit"
            );
            return Err(BundlerError::DecryptFailed);
        }

        let key = derive_key(passphrase.as_bytes(), &salt, envelope.iterations.max(1));
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| BundlerError::CryptoUnavailable {
            reason: "derived key has invalid length".to_string(),
        })?;
        cipher
            .decrypt(Nonce::from_slice(&iv), data.as_ref())
            .map_err(|_| BundlerError::DecryptFailed)
    }
}

fn derive_key(passphrase: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut key);
    key
}

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::BundlerError;

use super::crypto::{EncryptedEnvelope, PassphraseCipher};
use super::persist::WriteBehind;

/// Per-server credentials, either in plain text or sealed with a passphrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredCredentials {
    Encrypted(EncryptedEnvelope),
    Plain(BTreeMap<String, String>),
}

/// Simple credential mode: one flat credential map per server id, kept apart
/// from named connections.
pub struct CredentialStore {
    record: WriteBehind<BTreeMap<String, StoredCredentials>>,
    cipher: PassphraseCipher,
}

impl CredentialStore {
    pub fn open(path: PathBuf, delay: Duration, cipher: PassphraseCipher) -> Result<Self, BundlerError> {
        Ok(Self {
            record: WriteBehind::load(path, delay)?,
            cipher,
        })
    }

    /// Server ids with stored credentials and whether each is encrypted.
    pub fn servers(&self) -> Vec<(&str, bool)> {
        self.record
            .get()
            .iter()
            .map(|(id, stored)| (id.as_str(), matches!(stored, StoredCredentials::Encrypted(_))))
            .collect()
    }

    pub fn get(
        &self,
        server_id: &str,
        passphrase: Option<&str>,
    ) -> Result<BTreeMap<String, String>, BundlerError> {
        match self.record.get().get(server_id) {
            None => Ok(BTreeMap::new()),
            Some(StoredCredentials::Plain(map)) => Ok(map.clone()),
            Some(StoredCredentials::Encrypted(envelope)) => {
                let passphrase = passphrase.ok_or_else(|| BundlerError::PassphraseRequired {
                    server: server_id.to_string(),
                })?;
                let plaintext = self.cipher.decrypt(envelope, passphrase)?;
                serde_json::from_slice(&plaintext).map_err(|_| BundlerError::DecryptFailed)
            }
        }
    }

    /// Sets one credential. With a passphrase the whole map is (re)sealed;
    /// without one it is stored in plain text, which requires the existing
    /// entry to be plain too.
    pub fn set(
        &mut self,
        server_id: &str,
        name: &str,
        value: &str,
        passphrase: Option<&str>,
    ) -> Result<(), BundlerError> {
        let mut map = self.get(server_id, passphrase)?;
        map.insert(name.to_string(), value.to_string());
        self.store(server_id, map, passphrase)
    }

    /// Removes one credential, or every credential for the server when `name`
    /// is `None`. Returns whether anything was removed.
    pub fn remove(
        &mut self,
        server_id: &str,
        name: Option<&str>,
        passphrase: Option<&str>,
    ) -> Result<bool, BundlerError> {
        let Some(name) = name else {
            let removed = self.record.get_mut().remove(server_id).is_some();
            if removed {
                self.record.touch(Instant::now());
            }
            return Ok(removed);
        };

        let mut map = self.get(server_id, passphrase)?;
        if map.remove(name).is_none() {
            return Ok(false);
        }
        self.store(server_id, map, passphrase)?;
        Ok(true)
    }

    pub fn flush(&mut self) -> Result<(), BundlerError> {
        self.record.flush()
    }

    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool, BundlerError> {
        self.record.flush_if_due(now)
    }

    fn store(
        &mut self,
        server_id: &str,
        map: BTreeMap<String, String>,
        passphrase: Option<&str>,
    ) -> Result<(), BundlerError> {
        let stored = match passphrase {
            Some(passphrase) => {
                let plaintext = serde_json::to_vec(&map)?;
                StoredCredentials::Encrypted(self.cipher.encrypt(&plaintext, passphrase)?)
            }
            None => StoredCredentials::Plain(map),
        };
        self.record.get_mut().insert(server_id.to_string(), stored);
        self.record.touch(Instant::now());
        Ok(())
    }
}

//! In-process keyring.
//!
//! Keeps key bytes in memory and identifies them by a SHA-256 fingerprint.
//! The generated "keys" are random secrets with a derived public part; they
//! are not OpenPGP keys. Useful for tests and for tools that only need
//! Autocrypt bookkeeping.

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::debug;

use super::{KeyHandle, KeyInfo, Keyring, KeyringError};

/// Number of fingerprint bytes used for key ids (16 hex digits).
const KEY_ID_BYTES: usize = 8;

/// Length of generated secret material.
const SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
struct StoredKey {
    public: Vec<u8>,
    secret: Option<Vec<u8>>,
    uids: Vec<String>,
}

/// Keyring that holds everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyring {
    keys: BTreeMap<KeyHandle, StoredKey>,
}

impl MemoryKeyring {
    /// Creates an empty keyring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the keyring holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns true if a key with this handle is held.
    #[must_use]
    pub fn contains(&self, handle: &KeyHandle) -> bool {
        self.keys.contains_key(handle)
    }

    fn key_id(public: &[u8]) -> KeyHandle {
        let digest = Sha256::digest(public);
        let mut id = String::with_capacity(KEY_ID_BYTES * 2);
        for byte in &digest[..KEY_ID_BYTES] {
            let _ = write!(id, "{byte:02X}");
        }
        KeyHandle::new(id)
    }
}

impl Keyring for MemoryKeyring {
    fn generate_key(&mut self, identity: &str) -> Result<KeyHandle, KeyringError> {
        let mut secret = vec![0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut secret);

        let mut public = identity.as_bytes().to_vec();
        public.push(b'\n');
        public.extend_from_slice(&Sha256::digest(&secret));

        let handle = Self::key_id(&public);
        debug!("Generated key {handle} for {identity}");
        self.keys.insert(
            handle.clone(),
            StoredKey {
                public,
                secret: Some(secret),
                uids: vec![identity.to_string()],
            },
        );
        Ok(handle)
    }

    fn import_key(&mut self, key_material: &[u8]) -> Result<KeyHandle, KeyringError> {
        if key_material.is_empty() {
            return Err(KeyringError::InvalidKey("empty key material".to_string()));
        }

        let handle = Self::key_id(key_material);
        self.keys.entry(handle.clone()).or_insert_with(|| StoredKey {
            public: key_material.to_vec(),
            secret: None,
            uids: Vec::new(),
        });
        Ok(handle)
    }

    fn export_public(&self, handle: &KeyHandle) -> Result<Vec<u8>, KeyringError> {
        self.keys
            .get(handle)
            .map(|k| k.public.clone())
            .ok_or_else(|| KeyringError::NotFound(handle.to_string()))
    }

    fn export_secret(&self, handle: &KeyHandle) -> Result<Vec<u8>, KeyringError> {
        self.keys
            .get(handle)
            .and_then(|k| k.secret.clone())
            .ok_or_else(|| KeyringError::NotFound(handle.to_string()))
    }

    fn list_key_info(&self, query: &str) -> Result<Vec<KeyInfo>, KeyringError> {
        Ok(self
            .keys
            .iter()
            .filter(|(_, key)| key.secret.is_some())
            .map(|(handle, key)| KeyInfo {
                id: handle.to_string(),
                uids: key.uids.clone(),
            })
            .filter(|info| info.matches(query))
            .collect())
    }
}

//! Keyring interface.
//!
//! Key generation, import and export live outside this crate. The core
//! only stores the opaque [`KeyHandle`] a keyring hands back and asks for
//! key bytes when it builds our own header.

mod memory;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use memory::MemoryKeyring;

/// Opaque reference to a key held by a keyring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyHandle(String);

impl KeyHandle {
    /// Wraps a keyring-provided identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Summary of a key as listed by a keyring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Key id (hex).
    pub id: String,
    /// User ids bound to the key.
    pub uids: Vec<String>,
}

impl KeyInfo {
    /// Checks whether `query` names this key by id.
    ///
    /// Matches the full id or a trailing short id, case-insensitively and
    /// with an optional `0x` prefix.
    #[must_use]
    pub fn matches_id(&self, query: &str) -> bool {
        let query = query.trim();
        let query = query
            .strip_prefix("0x")
            .or_else(|| query.strip_prefix("0X"))
            .unwrap_or(query)
            .to_ascii_uppercase();
        !query.is_empty() && self.id.to_ascii_uppercase().ends_with(&query)
    }

    /// Checks whether `query` names this key by id or appears in a uid.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        self.uids.iter().any(|uid| uid.contains(query)) || self.matches_id(query)
    }
}

/// Errors reported by a keyring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyringError {
    /// No key for the handle.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The key material was rejected.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    /// Backend failure (process, storage).
    #[error("Keyring backend failure: {0}")]
    Backend(String),
}

/// Key storage used by an account.
pub trait Keyring {
    /// Generates a new secret key for `identity` and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot create the key.
    fn generate_key(&mut self, identity: &str) -> Result<KeyHandle, KeyringError>;

    /// Imports public key material and returns its handle.
    ///
    /// Importing the same material twice returns the same handle.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::InvalidKey`] if the material is not a key.
    fn import_key(&mut self, key_material: &[u8]) -> Result<KeyHandle, KeyringError>;

    /// Exports the public key bytes for a handle.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::NotFound`] for an unknown handle.
    fn export_public(&self, handle: &KeyHandle) -> Result<Vec<u8>, KeyringError>;

    /// Exports the secret key bytes for a handle.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::NotFound`] if there is no secret key.
    fn export_secret(&self, handle: &KeyHandle) -> Result<Vec<u8>, KeyringError>;

    /// Lists the secret keys matching `query` (id or uid fragment).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    fn list_key_info(&self, query: &str) -> Result<Vec<KeyInfo>, KeyringError>;
}

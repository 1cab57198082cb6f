//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::keyring::KeyringError;

/// Errors that can occur in core operations.
///
/// Adversarial inbound mail never produces one of these: header parse and
/// selection failures are reported as values (see [`crate::HeaderError`]
/// and [`crate::SelectionError`]).
#[derive(Debug, Error)]
pub enum Error {
    /// Operation requires an initialized account.
    #[error("Account directory {} not initialized", .0.display())]
    NotInitialized(PathBuf),

    /// `init` called on an account that already exists.
    #[error("Account directory {} already initialized", .0.display())]
    AlreadyInitialized(PathBuf),

    /// No secret key matched the requested key handle.
    #[error("Could not find secret key for {query:?}, found {found:?}")]
    KeyNotFound {
        /// The key handle or uid fragment that was looked up.
        query: String,
        /// Ids of the keys the keyring returned for the query.
        found: Vec<String>,
    },

    /// A setting was given a value outside its allowed set.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Autocrypt headers cannot be built without key material.
    #[error("Key material is empty")]
    EmptyKeyMaterial,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Keyring operation failed.
    #[error("Keyring error: {0}")]
    Keyring(#[from] KeyringError),

    /// Envelope parsing failed.
    #[error("Message error: {0}")]
    Mime(#[from] acledger_mime::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

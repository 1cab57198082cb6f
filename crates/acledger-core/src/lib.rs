//! # acledger-core
//!
//! Autocrypt protocol state for a mail account.
//!
//! This crate provides:
//! - **Header codec** - build, parse and select `Autocrypt:` headers
//! - **Peer state store** - per-peer state persisted with all-or-nothing commits
//! - **Reconciliation** - last-writer-wins merge of inbound headers by message date
//! - **Recommendations** - whether a client should offer or default to encryption
//! - **Accounts** - one directory, one keyring, one own key
//!
//! Key material is handled through the [`Keyring`] trait; [`MemoryKeyring`]
//! keeps keys in process.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod envelope;
mod error;
pub mod header;
pub mod keyring;
pub mod recommendation;
pub mod store;

pub use account::{Account, IgnoreReason, InitOptions, ProcessOutcome, default_account_dir};
pub use envelope::MailEnvelope;
pub use error::{Error, Result};
pub use header::{AutocryptHeader, HeaderError, PreferEncrypt, SelectionError};
pub use keyring::{KeyHandle, KeyInfo, Keyring, KeyringError, MemoryKeyring};
pub use recommendation::{Recommendation, UiRecommendation};
pub use store::{AccountConfig, AccountPreference, GpgMode, PeerState};

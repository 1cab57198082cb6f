//! Autocrypt account.
//!
//! An [`Account`] owns one account directory (holding its `config` file)
//! and a keyring. It builds our own Autocrypt header, processes inbound
//! mail into peer state, and answers encryption recommendations.
//!
//! # Example
//!
//! ```ignore
//! use acledger_core::{Account, InitOptions, MemoryKeyring};
//!
//! let mut account = Account::open("/tmp/acledger/alice", MemoryKeyring::new())?;
//! account.init(InitOptions::default())?;
//! let header = account.make_header_line("alice@example.org")?;
//!
//! let outcome = account.process_incoming(&inbound)?;
//! let rec = account.recommend(&["bob@example.org"]);
//! ```

mod reconcile;

use std::path::{Path, PathBuf};

use acledger_mime::Message;
use tracing::{debug, info, warn};

pub use reconcile::{IgnoreReason, ProcessOutcome, is_not_older};

use self::reconcile::{Decision, decide};
use crate::envelope::MailEnvelope;
use crate::error::{Error, Result};
use crate::header::{HEADER_NAME, encode_header, select_header};
use crate::keyring::{KeyHandle, Keyring};
use crate::recommendation::Recommendation;
use crate::store::{
    AccountConfig, AccountPreference, AtomicStore, GpgMode, PeerState, normalize_addr,
};

/// Name of the config file inside an account directory.
pub const CONFIG_FILE: &str = "config";

/// Application directory under the platform config dir.
const APP_DIR: &str = "acledger";

/// Returns `<config_dir>/acledger/<name>`.
///
/// # Errors
///
/// Returns [`Error::Config`] if the platform has no config directory.
pub fn default_account_dir(name: &str) -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(name))
        .ok_or_else(|| Error::Config("no platform config directory".to_string()))
}

/// Options for [`Account::init`].
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// gpg binary recorded for the keyring.
    pub gpgbin: String,
    /// Existing secret key to use (id or uid fragment). `None` generates one.
    pub keyhandle: Option<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            gpgbin: "gpg".to_string(),
            keyhandle: None,
        }
    }
}

/// An Autocrypt account bound to a directory and a keyring.
#[derive(Debug)]
pub struct Account<K> {
    dir: PathBuf,
    store: AtomicStore<AccountConfig>,
    keyring: K,
}

impl<K: Keyring> Account<K> {
    /// Opens the account stored in `dir`. The directory need not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read or decoded.
    pub fn open(dir: impl Into<PathBuf>, keyring: K) -> Result<Self> {
        let dir = dir.into();
        let store = AtomicStore::load(dir.join(CONFIG_FILE))?;
        Ok(Self {
            dir,
            store,
            keyring,
        })
    }

    /// Opens the account `name` under the default config location.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no config directory or the config is invalid.
    pub fn open_default(name: &str, keyring: K) -> Result<Self> {
        Self::open(default_account_dir(name)?, keyring)
    }

    /// The account directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &AccountConfig {
        self.store.get()
    }

    /// The keyring backing this account.
    #[must_use]
    pub const fn keyring(&self) -> &K {
        &self.keyring
    }

    /// True if the account has been initialized.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.config().is_initialized()
    }

    /// Initializes the account with a uuid, our own secret key and default
    /// settings, as one atomic change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] if the account exists,
    /// [`Error::KeyNotFound`] if `options.keyhandle` names no secret key, or
    /// a keyring/persistence error. On error nothing is persisted.
    pub fn init(&mut self, options: InitOptions) -> Result<()> {
        if self.exists() {
            return Err(Error::AlreadyInitialized(self.dir.clone()));
        }

        let keyring = &mut self.keyring;
        self.store.atomic_change(|config| {
            config.uuid = uuid::Uuid::new_v4().simple().to_string();
            config.gpgmode = Some(if options.keyhandle.is_some() {
                GpgMode::System
            } else {
                GpgMode::Own
            });
            config.gpgbin = options.gpgbin;

            let handle = match options.keyhandle {
                None => keyring.generate_key(&config.uuid)?,
                Some(query) => {
                    let found = keyring.list_key_info(&query)?;
                    let id = found.iter().find(|k| k.matches(&query)).map(|k| k.id.clone());
                    let Some(id) = id else {
                        return Err(Error::KeyNotFound {
                            query,
                            found: found.into_iter().map(|k| k.id).collect(),
                        });
                    };
                    KeyHandle::new(id)
                }
            };

            config.own_keyhandle = Some(handle);
            config.prefer_encrypt = AccountPreference::NotSet;
            Ok(())
        })?;

        info!(
            "Initialized account {} in {}",
            self.config().uuid,
            self.dir.display()
        );
        Ok(())
    }

    /// Sets the preference advertised in our header.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be written.
    pub fn set_prefer_encrypt(&mut self, value: AccountPreference) -> Result<()> {
        self.store.atomic_change(|config| {
            config.prefer_encrypt = value;
            Ok(())
        })?;
        debug!("Set prefer_encrypt to {value}");
        Ok(())
    }

    /// Builds our Autocrypt header value for the sending address `addr`.
    ///
    /// The same key is advertised for every alias the account sends from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before `init`, or a keyring error.
    pub fn make_header(&self, addr: &str) -> Result<String> {
        let keydata = self.keyring.export_public(self.own_keyhandle()?)?;
        encode_header(addr, &keydata, self.config().prefer_encrypt.advertised())
    }

    /// Like [`Account::make_header`], prefixed with `Autocrypt: `.
    ///
    /// # Errors
    ///
    /// Same as [`Account::make_header`].
    pub fn make_header_line(&self, addr: &str) -> Result<String> {
        Ok(format!("{HEADER_NAME}: {}", self.make_header(addr)?))
    }

    /// Processes an inbound message, updating the sender's peer state.
    ///
    /// Only a header whose `addr` matches the From address is considered.
    /// Malformed, ambiguous, foreign or stale headers leave state untouched
    /// and are reported as [`ProcessOutcome::Ignored`]; they never produce
    /// an `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before `init`, or a persistence error.
    pub fn process_incoming<E>(&mut self, message: &E) -> Result<ProcessOutcome>
    where
        E: MailEnvelope + ?Sized,
    {
        self.own_keyhandle()?;

        let Some(sender) = message.from_address() else {
            debug!("Ignoring message without sender address");
            return Ok(ProcessOutcome::Ignored(IgnoreReason::MissingSender));
        };
        let peer = normalize_addr(&sender);
        let date = message.date().unwrap_or_default();

        let selected = select_header(message, Some(&[sender.as_str()][..]));
        match decide(&date, selected, self.config().peers.get(&peer)) {
            Decision::Accept(header) => {
                let key_handle = match self.keyring.import_key(&header.keydata) {
                    Ok(handle) => handle,
                    Err(e) => {
                        warn!("Not updating peer {peer}: key import failed: {e}");
                        return Ok(ProcessOutcome::Ignored(IgnoreReason::KeyImport(e)));
                    }
                };

                let state = PeerState::new(header, key_handle, date);
                self.store.atomic_change(|config| {
                    config.peers.insert(peer.clone(), state.clone());
                    Ok(())
                })?;
                info!("Accepted Autocrypt header: {state}");
                Ok(ProcessOutcome::Updated(state))
            }
            Decision::Clear => {
                self.store.atomic_change(|config| {
                    if let Some(state) = config.peers.get_mut(&peer) {
                        state.last_header = None;
                    }
                    Ok(())
                })?;
                info!("Peer {peer} sent mail without Autocrypt header, cleared");
                Ok(ProcessOutcome::Cleared)
            }
            Decision::Ignore(reason) => {
                debug!("Peer state for {peer} unchanged: {reason}");
                Ok(ProcessOutcome::Ignored(reason))
            }
        }
    }

    /// Parses a raw RFC 5322 message and processes it like
    /// [`Account::process_incoming`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mime`] if `raw` holds no header block, otherwise the
    /// errors of [`Account::process_incoming`].
    pub fn process_raw(&mut self, raw: &[u8]) -> Result<ProcessOutcome> {
        let message = Message::parse_bytes(raw)?;
        self.process_incoming(&message)
    }

    /// Stored state for a peer address, if any.
    #[must_use]
    pub fn peer_state(&self, addr: &str) -> Option<&PeerState> {
        self.config().peers.get(&normalize_addr(addr))
    }

    /// Encryption recommendation for a set of recipients.
    #[must_use]
    pub fn recommend<S: AsRef<str>>(&self, recipients: &[S]) -> Recommendation {
        let peers = recipients
            .iter()
            .map(|addr| {
                let addr = addr.as_ref();
                (addr.to_string(), self.peer_state(addr).cloned())
            })
            .collect();
        Recommendation::new(peers, self.config().prefer_encrypt)
    }

    /// Exports a public key: ours, or the one behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] when exporting our own key before
    /// `init`, or a keyring error.
    pub fn export_public_key(&self, handle: Option<&KeyHandle>) -> Result<Vec<u8>> {
        let handle = match handle {
            Some(handle) => handle,
            None => self.own_keyhandle()?,
        };
        Ok(self.keyring.export_public(handle)?)
    }

    /// Exports our own secret key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before `init`, or a keyring error.
    pub fn export_secret_key(&self) -> Result<Vec<u8>> {
        Ok(self.keyring.export_secret(self.own_keyhandle()?)?)
    }

    /// Deletes the account directory and resets the configuration.
    /// Call `init` again to reuse the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn remove(&mut self) -> Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        self.store.reset();
        info!("Removed account directory {}", self.dir.display());
        Ok(())
    }

    fn own_keyhandle(&self) -> Result<&KeyHandle> {
        let config = self.config();
        config
            .own_keyhandle
            .as_ref()
            .filter(|_| config.is_initialized())
            .ok_or_else(|| Error::NotInitialized(self.dir.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::keyring::{KeyringError, MemoryKeyring};

    fn account(dir: &tempfile::TempDir) -> Account<MemoryKeyring> {
        Account::open(dir.path().join("acct"), MemoryKeyring::new()).unwrap()
    }

    /// Keyring that refuses every import.
    #[derive(Debug, Default)]
    struct RejectingKeyring(MemoryKeyring);

    impl Keyring for RejectingKeyring {
        fn generate_key(&mut self, identity: &str) -> std::result::Result<KeyHandle, KeyringError> {
            self.0.generate_key(identity)
        }

        fn import_key(&mut self, _: &[u8]) -> std::result::Result<KeyHandle, KeyringError> {
            Err(KeyringError::InvalidKey("not an OpenPGP key".into()))
        }

        fn export_public(&self, handle: &KeyHandle) -> std::result::Result<Vec<u8>, KeyringError> {
            self.0.export_public(handle)
        }

        fn export_secret(&self, handle: &KeyHandle) -> std::result::Result<Vec<u8>, KeyringError> {
            self.0.export_secret(handle)
        }

        fn list_key_info(
            &self,
            query: &str,
        ) -> std::result::Result<Vec<crate::keyring::KeyInfo>, KeyringError> {
            self.0.list_key_info(query)
        }
    }

    fn raw_mail(from: &str, date: &str, autocrypt: Option<&str>) -> String {
        let mut raw = format!("From: {from}\nTo: me@example.org\nDate: {date}\n");
        if let Some(value) = autocrypt {
            raw.push_str(value);
            raw.push('\n');
        }
        raw.push_str("\nbody\n");
        raw
    }

    #[test]
    fn fresh_account_does_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let account = account(&dir);
        assert!(!account.exists());
        assert!(matches!(
            account.make_header("a@example.org"),
            Err(Error::NotInitialized(_))
        ));
        assert!(matches!(account.export_secret_key(), Err(Error::NotInitialized(_))));
    }

    #[test]
    fn init_generates_own_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = account(&dir);
        account.init(InitOptions::default()).unwrap();

        let config = account.config();
        assert!(account.exists());
        assert_eq!(config.uuid.len(), 32);
        assert_eq!(config.gpgmode, Some(GpgMode::Own));
        assert_eq!(config.gpgbin, "gpg");
        assert_eq!(config.prefer_encrypt, AccountPreference::NotSet);
        assert!(account.export_secret_key().is_ok());
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = account(&dir);
        account.init(InitOptions::default()).unwrap();
        assert!(matches!(
            account.init(InitOptions::default()),
            Err(Error::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn init_with_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut keyring = MemoryKeyring::new();
        let handle = keyring.generate_key("Alice <alice@example.org>").unwrap();

        let mut account = Account::open(dir.path(), keyring).unwrap();
        account
            .init(InitOptions {
                gpgbin: "/usr/bin/gpg2".into(),
                keyhandle: Some("alice@example.org".into()),
            })
            .unwrap();

        assert_eq!(account.config().own_keyhandle.as_ref(), Some(&handle));
        assert_eq!(account.config().gpgmode, Some(GpgMode::System));
    }

    #[test]
    fn init_with_unknown_key_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = account(&dir);
        let result = account.init(InitOptions {
            gpgbin: "gpg".into(),
            keyhandle: Some("nobody@example.org".into()),
        });

        assert!(matches!(result, Err(Error::KeyNotFound { .. })));
        assert!(!account.exists());
        assert_eq!(account.config(), &AccountConfig::default());
        assert!(!dir.path().join("acct").join(CONFIG_FILE).exists());
    }

    #[test]
    fn config_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let uuid = {
            let mut account = account(&dir);
            account.init(InitOptions::default()).unwrap();
            account.set_prefer_encrypt(AccountPreference::Yes).unwrap();
            account.config().uuid.clone()
        };

        let reopened = account(&dir);
        assert_eq!(reopened.config().uuid, uuid);
        assert_eq!(reopened.config().prefer_encrypt, AccountPreference::Yes);
    }

    #[test]
    fn make_header_reflects_preference() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = account(&dir);
        account.init(InitOptions::default()).unwrap();

        let plain = account.make_header("me@example.org").unwrap();
        assert!(plain.starts_with("addr=me@example.org; keydata=\n"));

        account.set_prefer_encrypt(AccountPreference::Yes).unwrap();
        let line = account.make_header_line("me@example.org").unwrap();
        assert!(
            line.starts_with("Autocrypt: addr=me@example.org; prefer-encrypt=mutual; keydata=")
        );
    }

    #[test]
    fn export_unknown_handle_is_keyring_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = account(&dir);
        account.init(InitOptions::default()).unwrap();
        assert!(matches!(
            account.export_public_key(Some(&KeyHandle::new("NOPE"))),
            Err(Error::Keyring(KeyringError::NotFound(_)))
        ));
        assert!(account.export_public_key(None).is_ok());
    }

    #[test]
    fn remove_resets_account() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = account(&dir);
        account.init(InitOptions::default()).unwrap();
        assert!(account.dir().exists());

        account.remove().unwrap();
        assert!(!account.exists());
        assert!(!account.dir().exists());
        account.init(InitOptions::default()).unwrap();
        assert!(account.exists());
    }

    #[test]
    fn default_dir_is_namespaced() {
        if let Ok(dir) = default_account_dir("work") {
            assert!(dir.ends_with("acledger/work"));
        }
    }

    #[test]
    fn process_raw_parses_and_updates() {
        let dir = tempfile::tempdir().unwrap();
        let mut sender = Account::open(dir.path().join("sender"), MemoryKeyring::new()).unwrap();
        sender.init(InitOptions::default()).unwrap();
        let mut account = account(&dir);
        account.init(InitOptions::default()).unwrap();

        let line = sender.make_header_line("peer@example.org").unwrap();
        let raw = raw_mail("peer@example.org", "Sun, 02 Feb 2020 10:00:00 +0000", Some(&line));
        let outcome = account.process_raw(raw.as_bytes()).unwrap();

        assert!(matches!(outcome, ProcessOutcome::Updated(_)));
        assert!(account.peer_state("peer@example.org").is_some());
    }

    #[test]
    fn process_raw_rejects_headerless_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = account(&dir);
        account.init(InitOptions::default()).unwrap();

        assert!(matches!(account.process_raw(b"  \n"), Err(Error::Mime(_))));
        assert!(matches!(account.process_raw(b"no header here\n\nbody"), Err(Error::Mime(_))));
    }

    #[test]
    fn make_header_rejects_injected_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut account = account(&dir);
        account.init(InitOptions::default()).unwrap();

        assert!(matches!(
            account.make_header_line("me@example.org\r\nBcc: evil@example.org"),
            Err(Error::InvalidValue(_))
        ));
    }

    #[test]
    fn failed_key_import_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut sender = account(&dir);
        sender.init(InitOptions::default()).unwrap();
        let line = sender.make_header_line("peer@example.org").unwrap();

        let mut account =
            Account::open(dir.path().join("rejecting"), RejectingKeyring::default()).unwrap();
        account.init(InitOptions::default()).unwrap();
        let before = account.config().clone();

        let raw = raw_mail("peer@example.org", "Sun, 02 Feb 2020 10:00:00 +0000", Some(&line));
        let outcome = account.process_raw(raw.as_bytes()).unwrap();

        assert!(matches!(
            outcome,
            ProcessOutcome::Ignored(IgnoreReason::KeyImport(KeyringError::InvalidKey(_)))
        ));
        assert!(account.peer_state("peer@example.org").is_none());
        assert_eq!(account.config(), &before);
    }
}

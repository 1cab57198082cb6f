//! Persisted account configuration and peer state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use acledger_mime::encoding::{decode_base64_lenient, encode_base64};

use crate::error::Error;
use crate::header::{AutocryptHeader, HeaderError, PreferEncrypt};
use crate::keyring::KeyHandle;

/// The account's own encrypt-by-default stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountPreference {
    /// Encrypt whenever every recipient agrees.
    #[serde(rename = "yes")]
    Yes,
    /// Do not advertise a preference for encryption.
    #[serde(rename = "no")]
    No,
    /// Never configured.
    #[default]
    #[serde(rename = "notset")]
    NotSet,
}

impl AccountPreference {
    /// Persisted string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::NotSet => "notset",
        }
    }

    /// The preference advertised in our outgoing Autocrypt header.
    #[must_use]
    pub const fn advertised(&self) -> PreferEncrypt {
        match self {
            Self::Yes => PreferEncrypt::Mutual,
            Self::No | Self::NotSet => PreferEncrypt::NoPreference,
        }
    }
}

impl FromStr for AccountPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "notset" => Ok(Self::NotSet),
            other => Err(Error::InvalidValue(format!(
                "prefer_encrypt can only be one of \"yes\", \"no\", \"notset\", got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for AccountPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the account's keys live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpgMode {
    /// A key the user already had in their system keyring.
    System,
    /// A key generated for this account in its own keyring.
    Own,
}

/// Stored trust state for one peer address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PeerRecord", into = "PeerRecord")]
pub struct PeerState {
    /// Date header of the message that last updated this state.
    pub last_seen_date: String,
    /// Most recently accepted header; `None` once the peer stopped sending one.
    pub last_header: Option<AutocryptHeader>,
    /// Keyring handle of the imported `keydata`.
    pub key_handle: Option<KeyHandle>,
}

impl PeerState {
    /// State for a freshly accepted header.
    #[must_use]
    pub fn new(header: AutocryptHeader, key_handle: KeyHandle, date: impl Into<String>) -> Self {
        Self {
            last_seen_date: date.into(),
            last_header: Some(header),
            key_handle: Some(key_handle),
        }
    }

    /// Key handle usable for encryption: only while a header is stored.
    #[must_use]
    pub fn usable_key(&self) -> Option<&KeyHandle> {
        self.last_header.as_ref().and(self.key_handle.as_ref())
    }

    /// Advertised preference, if a header is stored.
    #[must_use]
    pub fn prefer_encrypt(&self) -> Option<PreferEncrypt> {
        self.last_header.as_ref().map(|h| h.prefer_encrypt)
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyhandle = self.key_handle.as_ref().map_or("-", KeyHandle::as_str);
        let Some(header) = &self.last_header else {
            return write!(f, "(no header): key {keyhandle} from date={}", self.last_seen_date);
        };

        let mut attrs = vec![format!("prefer_encrypt={}", header.prefer_encrypt)];
        attrs.extend(header.extra_attrs.iter().map(|(k, v)| format!("{k}={v}")));
        write!(
            f,
            "{}: key {keyhandle} [{} bytes] {} from date={}",
            header.addr,
            header.keydata.len(),
            attrs.join("; "),
            self.last_seen_date
        )
    }
}

/// On-disk shape of a peer entry.
///
/// Header attributes sit at the top level next to the `*date` and
/// `*keyhandle` bookkeeping fields; `_`-prefixed extras are flattened in.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PeerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keydata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefer_encrypt: Option<String>,
    #[serde(rename = "*date", default)]
    date: String,
    #[serde(rename = "*keyhandle", default, skip_serializing_if = "Option::is_none")]
    keyhandle: Option<KeyHandle>,
    #[serde(flatten)]
    extra: BTreeMap<String, String>,
}

impl TryFrom<PeerRecord> for PeerState {
    type Error = HeaderError;

    fn try_from(record: PeerRecord) -> Result<Self, Self::Error> {
        if let Some(name) = record.extra.keys().find(|k| !k.starts_with('_')) {
            return Err(HeaderError::UnknownCriticalAttr(name.clone()));
        }

        let last_header = match (record.addr, record.keydata) {
            (None, None) => None,
            (Some(_), None) => return Err(HeaderError::MissingCriticalAttr("keydata")),
            (None, Some(_)) => return Err(HeaderError::MissingCriticalAttr("addr")),
            (Some(addr), Some(keydata)) => {
                let keydata =
                    decode_base64_lenient(&keydata).map_err(|_| HeaderError::InvalidKeydata)?;
                let prefer_encrypt = match record.prefer_encrypt {
                    None => PreferEncrypt::default(),
                    Some(value) => PreferEncrypt::parse(&value)
                        .ok_or(HeaderError::UnknownPreferEncrypt(value))?,
                };
                Some(AutocryptHeader {
                    addr,
                    keydata,
                    prefer_encrypt,
                    extra_attrs: record.extra,
                })
            }
        };

        Ok(Self {
            last_seen_date: record.date,
            last_header,
            key_handle: record.keyhandle,
        })
    }
}

impl From<PeerState> for PeerRecord {
    fn from(state: PeerState) -> Self {
        let mut record = Self {
            date: state.last_seen_date,
            keyhandle: state.key_handle,
            ..Self::default()
        };
        if let Some(header) = state.last_header {
            record.addr = Some(header.addr);
            record.keydata = Some(encode_base64(&header.keydata));
            record.prefer_encrypt = Some(header.prefer_encrypt.as_str().to_string());
            record.extra = header.extra_attrs;
        }
        record
    }
}

/// Everything persisted for one account.
///
/// Every field is optional on disk; a missing key reads as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Account uuid (hex); empty until initialized.
    pub uuid: String,
    /// Keyring mode chosen at init.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpgmode: Option<GpgMode>,
    /// Path or name of the gpg binary the keyring uses.
    pub gpgbin: String,
    /// Handle of our own secret key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_keyhandle: Option<KeyHandle>,
    /// Our own encryption preference.
    pub prefer_encrypt: AccountPreference,
    /// Peer states keyed by normalized address.
    pub peers: BTreeMap<String, PeerState>,
}

impl AccountConfig {
    /// True once `init` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.uuid.is_empty()
    }
}

/// Normalizes an address for use as a peer key.
#[must_use]
pub fn normalize_addr(addr: &str) -> String {
    addr.trim().to_lowercase()
}

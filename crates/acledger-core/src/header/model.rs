//! Autocrypt header data types.

use std::collections::BTreeMap;
use std::fmt;

/// Encryption preference a peer advertises in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PreferEncrypt {
    /// No stated preference (the default when the attribute is absent).
    #[default]
    NoPreference,
    /// The peer wants encryption whenever both sides agree.
    Mutual,
}

impl PreferEncrypt {
    /// Parse the wire representation. Only the two exact tokens are accepted.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nopreference" => Some(Self::NoPreference),
            "mutual" => Some(Self::Mutual),
            _ => None,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoPreference => "nopreference",
            Self::Mutual => "mutual",
        }
    }
}

impl fmt::Display for PreferEncrypt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully parsed Autocrypt header.
///
/// Both critical attributes are always present; a header missing either
/// never gets this far (see [`HeaderError`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocryptHeader {
    /// The `addr` attribute, verbatim.
    pub addr: String,
    /// Decoded `keydata` attribute.
    pub keydata: Vec<u8>,
    /// The `prefer-encrypt` attribute.
    pub prefer_encrypt: PreferEncrypt,
    /// Non-critical `_`-prefixed attributes, preserved but not interpreted.
    pub extra_attrs: BTreeMap<String, String>,
}

impl AutocryptHeader {
    /// Creates a header without extra attributes.
    #[must_use]
    pub fn new(addr: impl Into<String>, keydata: Vec<u8>, prefer_encrypt: PreferEncrypt) -> Self {
        Self {
            addr: addr.into(),
            keydata,
            prefer_encrypt,
            extra_attrs: BTreeMap::new(),
        }
    }

    /// Serializes this header to its wire value.
    ///
    /// Extra attributes are not emitted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidValue`] for an unencodable `addr` and
    /// [`crate::Error::EmptyKeyMaterial`] when `keydata` is empty.
    pub fn encode(&self) -> crate::Result<String> {
        super::codec::encode_header(&self.addr, &self.keydata, self.prefer_encrypt)
    }
}

/// Why a header value failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// Nothing but separators and whitespace.
    #[error("empty header")]
    Empty,

    /// A segment was not a `name=value` pair.
    #[error("malformed setting {0:?}")]
    MalformedSetting(String),

    /// `prefer-encrypt` carried an unsupported token.
    #[error("unknown prefer-encrypt setting '{0}'")]
    UnknownPreferEncrypt(String),

    /// `keydata` was not valid Base64.
    #[error("failed to decode keydata")]
    InvalidKeydata,

    /// `keydata` decoded to zero bytes.
    #[error("keydata is empty")]
    EmptyKeydata,

    /// An unrecognized attribute without a leading underscore.
    #[error("unknown critical attr '{0}'")]
    UnknownCriticalAttr(String),

    /// A critical attribute appeared more than once.
    #[error("duplicate critical attr '{0}'")]
    DuplicateAttr(String),

    /// `addr` or `keydata` was never supplied.
    #[error("critical attr '{0}' missing")]
    MissingCriticalAttr(&'static str),
}

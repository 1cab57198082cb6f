//! Encryption recommendation for a recipient set.

use std::collections::BTreeMap;
use std::fmt;

use crate::header::PreferEncrypt;
use crate::keyring::KeyHandle;
use crate::store::{AccountPreference, PeerState};

/// How strongly a mail client should offer encryption.
///
/// Variants are ordered by willingness to encrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UiRecommendation {
    /// Encryption cannot be offered.
    Disable,
    /// Encryption is possible but should not be suggested.
    Discourage,
    /// Encryption is possible.
    Available,
    /// Encrypt by default.
    Encrypt,
}

impl UiRecommendation {
    /// Lowercase name of the level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Discourage => "discourage",
            Self::Available => "available",
            Self::Encrypt => "encrypt",
        }
    }
}

impl fmt::Display for UiRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommendation computed from a snapshot of recipient peer states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    peers: BTreeMap<String, Option<PeerState>>,
    own_preference: AccountPreference,
    discouraged: bool,
}

impl Recommendation {
    /// Creates a recommendation for `peers` (recipient address to stored
    /// state, `None` if never seen).
    #[must_use]
    pub const fn new(
        peers: BTreeMap<String, Option<PeerState>>,
        own_preference: AccountPreference,
    ) -> Self {
        Self {
            peers,
            own_preference,
            discouraged: false,
        }
    }

    /// Caps the result at [`UiRecommendation::Discourage`], e.g. when a
    /// previously encrypted thread went back to cleartext.
    #[must_use]
    pub const fn discourage(mut self) -> Self {
        self.discouraged = true;
        self
    }

    /// The overall level for the recipient set.
    ///
    /// An empty recipient set yields [`UiRecommendation::Disable`].
    #[must_use]
    pub fn ui_recommendation(&self) -> UiRecommendation {
        if self.peers.is_empty() || self.peers.values().any(|p| usable(p.as_ref()).is_none()) {
            return UiRecommendation::Disable;
        }

        let all_mutual = self.peers.values().all(|p| {
            p.as_ref().and_then(PeerState::prefer_encrypt) == Some(PreferEncrypt::Mutual)
        });
        let level = if all_mutual && self.own_preference == AccountPreference::Yes {
            UiRecommendation::Encrypt
        } else {
            UiRecommendation::Available
        };

        if self.discouraged {
            level.min(UiRecommendation::Discourage)
        } else {
            level
        }
    }

    /// Key handle to encrypt to for each recipient, `None` where no key is known.
    #[must_use]
    pub fn target_keys(&self) -> BTreeMap<String, Option<KeyHandle>> {
        self.peers
            .iter()
            .map(|(addr, peer)| (addr.clone(), usable(peer.as_ref()).cloned()))
            .collect()
    }
}

fn usable(peer: Option<&PeerState>) -> Option<&KeyHandle> {
    peer.and_then(PeerState::usable_key)
}

//! Merging an inbound header into stored peer state.
//!
//! The decision is separated from its side effects (key import, commit) so
//! the rules can be checked without a keyring or a filesystem.

use acledger_mime::parse_rfc2822_date;

use crate::header::{AutocryptHeader, SelectionError};
use crate::keyring::KeyringError;
use crate::store::PeerState;

/// Result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The peer's state was replaced with the message's header.
    Updated(PeerState),
    /// The peer sent mail without a header; its stored header was dropped.
    Cleared,
    /// Nothing changed.
    Ignored(IgnoreReason),
}

/// Why a message left peer state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IgnoreReason {
    /// The From header held no usable address.
    #[error("message has no sender address")]
    MissingSender,

    /// No single trustworthy header could be selected.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The message is older than the stored state.
    #[error("message date {incoming:?} is older than stored {stored:?}")]
    Stale {
        /// Date of the inbound message.
        incoming: String,
        /// Date of the stored state.
        stored: String,
    },

    /// The keyring refused the key material.
    #[error("key import failed: {0}")]
    KeyImport(KeyringError),

    /// No header, and no stored header to clear.
    #[error("no Autocrypt header and no stored state to clear")]
    NothingToClear,
}

/// What to do with a peer's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Decision {
    Accept(AutocryptHeader),
    Clear,
    Ignore(IgnoreReason),
}

/// Decides how a selected header (or its absence) affects stored state.
pub(crate) fn decide(
    date: &str,
    selected: Result<AutocryptHeader, SelectionError>,
    stored: Option<&PeerState>,
) -> Decision {
    match selected {
        Ok(header) if is_not_older(date, stored) => Decision::Accept(header),
        Ok(_) => Decision::Ignore(IgnoreReason::Stale {
            incoming: date.to_string(),
            stored: stored.map(|s| s.last_seen_date.clone()).unwrap_or_default(),
        }),
        Err(SelectionError::NoneFound) => match stored {
            Some(state) if state.last_header.is_some() => Decision::Clear,
            _ => Decision::Ignore(IgnoreReason::NothingToClear),
        },
        Err(e) => Decision::Ignore(IgnoreReason::Selection(e)),
    }
}

/// Last-writer-wins date guard.
///
/// An incoming date equal to the stored one is accepted, so replaying a
/// message is idempotent. Dates compare as instants, not as text.
///
/// | stored state | stored date | incoming date | accepted         |
/// |--------------|-------------|---------------|------------------|
/// | none         | -           | any           | yes              |
/// | present      | unparsable  | any           | yes              |
/// | present      | parsable    | unparsable    | no               |
/// | present      | parsable    | parsable      | incoming >= stored |
pub fn is_not_older(incoming: &str, stored: Option<&PeerState>) -> bool {
    let Some(stored) = stored else {
        return true;
    };
    match (
        parse_rfc2822_date(incoming),
        parse_rfc2822_date(&stored.last_seen_date),
    ) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(incoming), Some(stored)) => incoming >= stored,
    }
}

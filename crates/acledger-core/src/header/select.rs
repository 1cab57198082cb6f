//! Choosing the Autocrypt header of an inbound message.

use super::HEADER_NAME;
use super::codec::parse_header;
use super::model::{AutocryptHeader, HeaderError};
use crate::envelope::MailEnvelope;

/// Why a message yielded no usable Autocrypt header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// `multipart/report` messages never carry trust material.
    #[error("Ignoring 'multipart/report' message.")]
    ReportMessage,

    /// The message has no Autocrypt header at all.
    #[error("no valid Autocrypt header found")]
    NoneFound,

    /// More than one valid header survived filtering.
    #[error("more than one valid Autocrypt header found")]
    Ambiguous,

    /// A valid header was found, but for an address not on the allow-list.
    #[error("Autocrypt header addr '{0}' does not match the sender")]
    AddressNotAllowed(String),

    /// The first header that failed to parse.
    #[error(transparent)]
    Invalid(#[from] HeaderError),
}

/// Selects the single Autocrypt header of a message.
///
/// Every `Autocrypt` header is parsed independently. When `allowed` is
/// given, valid headers whose `addr` is not in the list (compared
/// case-insensitively) are set aside. The outcome follows this ranking:
///
/// | surviving valid headers | rejected headers | result                      |
/// |-------------------------|------------------|-----------------------------|
/// | exactly one             | any              | that header                 |
/// | more than one           | any              | [`SelectionError::Ambiguous`] |
/// | none                    | at least one     | first rejection, in message order |
/// | none                    | none             | [`SelectionError::NoneFound`] |
///
/// A `multipart/report` message is rejected before any header is looked at.
///
/// # Errors
///
/// Returns a [`SelectionError`] when no single trustworthy header exists.
pub fn select_header<E, S>(
    message: &E,
    allowed: Option<&[S]>,
) -> Result<AutocryptHeader, SelectionError>
where
    E: MailEnvelope + ?Sized,
    S: AsRef<str>,
{
    if message.is_report() {
        return Err(SelectionError::ReportMessage);
    }

    let mut valid = Vec::new();
    let mut first_rejection = None;

    for value in message.all_headers(HEADER_NAME) {
        let rejection = match parse_header(&value) {
            Ok(header) if is_allowed(&header.addr, allowed) => {
                valid.push(header);
                continue;
            }
            Ok(header) => SelectionError::AddressNotAllowed(header.addr),
            Err(e) => SelectionError::Invalid(e),
        };
        first_rejection.get_or_insert(rejection);
    }

    match (valid.len(), first_rejection) {
        (1, _) => valid.pop().ok_or(SelectionError::NoneFound),
        (0, Some(rejection)) => Err(rejection),
        (0, None) => Err(SelectionError::NoneFound),
        _ => Err(SelectionError::Ambiguous),
    }
}

fn is_allowed<S: AsRef<str>>(addr: &str, allowed: Option<&[S]>) -> bool {
    allowed.is_none_or(|list| list.iter().any(|a| a.as_ref().eq_ignore_ascii_case(addr)))
}

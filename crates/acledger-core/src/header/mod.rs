//! Autocrypt header codec.
//!
//! Builds the `Autocrypt:` header value for our own key, parses header
//! values received from peers, and picks the single trustworthy header out
//! of an inbound message.
//!
//! Parsing is strict: an unknown attribute without a leading underscore
//! aborts the parse, and a message carrying more than one valid header is
//! rejected instead of picking one.
//!
//! # Example
//!
//! ```ignore
//! use acledger_core::header::{encode_header, parse_header, PreferEncrypt};
//!
//! let value = encode_header("alice@example.org", &key_bytes, PreferEncrypt::Mutual)?;
//! let header = parse_header(&value)?;
//! assert_eq!(header.addr, "alice@example.org");
//! ```

mod codec;
mod model;
mod select;

pub use codec::{KEYDATA_INDENT, KEYDATA_LINE_WIDTH, encode_header, parse_header};
pub use model::{AutocryptHeader, HeaderError, PreferEncrypt};
pub use select::{SelectionError, select_header};

/// Name of the mail header carrying Autocrypt data.
pub const HEADER_NAME: &str = "Autocrypt";

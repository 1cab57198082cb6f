//! # acledger-mime
//!
//! Mail envelope parsing for Autocrypt processing.
//!
//! ## Features
//!
//! - **Header parsing**: RFC 5322 header blocks with folded continuation lines
//! - **Repeated headers**: every occurrence kept, in message order
//! - **Content types**: `type/subtype; param=value` parsing
//! - **Addresses**: extract the routable address from `Name <addr>` fields
//! - **Encoding**: Base64 helpers and fixed-width line folding
//!
//! ## Quick Start
//!
//! ```ignore
//! use acledger_mime::Message;
//!
//! let raw = "From: Alice <alice@example.org>\r\n\
//!            To: bob@example.org\r\n\
//!            Date: Sun, 02 Feb 2020 10:00:00 +0000\r\n\
//!            Autocrypt: addr=alice@example.org; keydata=AAEC\r\n\
//!            \r\n\
//!            Hello, Bob!";
//!
//! let message = Message::parse(raw)?;
//! assert_eq!(message.from_address().as_deref(), Some("alice@example.org"));
//! assert_eq!(message.headers.get_all("Autocrypt").len(), 1);
//! ```
//!
//! ### Encoding
//!
//! ```ignore
//! use acledger_mime::encoding::{decode_base64_lenient, encode_base64, fold_lines};
//!
//! let encoded = encode_base64(b"key material");
//! let folded = fold_lines(&encoded, 78, "  ");
//! let decoded = decode_base64_lenient(&folded)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{parse_address_list, parse_email_addr};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, parse_rfc2822_date};

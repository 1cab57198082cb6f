//! Message envelope access.

use crate::address::{parse_address_list, parse_email_addr};
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// A mail message split into its header block and raw body.
///
/// The body is kept undecoded; this type exists to answer envelope
/// questions (sender, date, content type, repeated headers).
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Raw body text following the header block.
    pub body: String,
}

impl Message {
    /// Creates a message from headers and a body.
    #[must_use]
    pub fn new(headers: Headers, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Parses a raw message.
    ///
    /// The header block ends at the first empty line; everything after it
    /// is the body. A message without an empty line is all headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or holds no header.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::MalformedMessage("empty input".to_string()));
        }

        let (head, body) = split_head_body(raw);
        let headers = Headers::parse(head);
        if headers.is_empty() {
            return Err(Error::MalformedMessage("no headers".to_string()));
        }

        Ok(Self::new(headers, body))
    }

    /// Parses a raw message from bytes, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or holds no header.
    pub fn parse_bytes(raw: &[u8]) -> Result<Self> {
        Self::parse(&String::from_utf8_lossy(raw))
    }

    /// Gets the content type, defaulting to `text/plain` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the raw From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the routable sender address from the From header.
    #[must_use]
    pub fn from_address(&self) -> Option<String> {
        self.from().and_then(parse_email_addr)
    }

    /// Gets all recipient addresses from the To and Cc headers.
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        self.headers
            .get_all("to")
            .into_iter()
            .chain(self.headers.get_all("cc"))
            .flat_map(parse_address_list)
            .collect()
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Gets the raw Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// Gets the Date header parsed as RFC 2822, if present and valid.
    #[must_use]
    pub fn parsed_date(&self) -> Option<DateTime<FixedOffset>> {
        self.date().and_then(parse_rfc2822_date)
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("message-id")
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.headers, self.body)
    }
}

/// Parses an RFC 2822 date, tolerating surrounding whitespace.
#[must_use]
pub fn parse_rfc2822_date(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(value.trim()).ok()
}

fn split_head_body(raw: &str) -> (&str, &str) {
    ["\r\n\r\n", "\n\n"]
        .into_iter()
        .filter_map(|sep| raw.find(sep).map(|pos| (pos, sep.len())))
        .min_by_key(|&(pos, _)| pos)
        .map_or((raw, ""), |(pos, len)| (&raw[..pos], &raw[pos + len..]))
}

//! Read access to an inbound message's envelope.
//!
//! Autocrypt processing only needs a handful of header lookups. Anything
//! that can answer them (a parsed [`acledger_mime::Message`], a message
//! from another mail library, a test fixture) can be processed.

use acledger_mime::{ContentType, Message};

/// Envelope queries used by header selection and reconciliation.
pub trait MailEnvelope {
    /// First value of a header, if present.
    fn header(&self, name: &str) -> Option<String>;

    /// Every value of a header, in message order.
    fn all_headers(&self, name: &str) -> Vec<String>;

    /// Routable address from the From header.
    fn from_address(&self) -> Option<String>;

    /// Raw Date header text.
    fn date(&self) -> Option<String>;

    /// Lowercase `type/subtype` of the message.
    fn content_type(&self) -> String;

    /// True for `multipart/report` messages (bounces, receipts).
    fn is_report(&self) -> bool {
        ContentType::parse(&self.content_type()).is_ok_and(|ct| ct.is_report())
    }
}

impl MailEnvelope for Message {
    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).map(str::to_string)
    }

    fn all_headers(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn from_address(&self) -> Option<String> {
        Self::from_address(self)
    }

    fn date(&self) -> Option<String> {
        Self::date(self).map(str::to_string)
    }

    // An unparsable Content-Type falls back to the raw value so that a
    // garbled report header still never reads as text/plain.
    fn content_type(&self) -> String {
        match Self::content_type(self) {
            Ok(ct) => ct.essence(),
            Err(_) => self
                .headers
                .get("content-type")
                .unwrap_or_default()
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase(),
        }
    }
}

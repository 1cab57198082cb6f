//! Message header handling.

use std::fmt;

/// Ordered collection of message headers.
///
/// Header names compare case-insensitively, but occurrences keep the order
/// and spelling they had in the message. Repeated headers (such as several
/// `Autocrypt` lines) are all retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header occurrence.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Sets a header value, replacing any existing occurrences.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push((name, value.into()));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header, in message order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if at least one occurrence of the header exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes all occurrences of a header.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Number of header occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all header occurrences.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parses a header block.
    ///
    /// Parsing stops at the first empty line. Folded continuation lines
    /// (starting with a space or tab) are unfolded into the previous
    /// header's value, separated by a single space.
    ///
    /// A leading mbox `From ` separator is skipped. Lines that are neither
    /// a `Name: value` header nor a continuation of one are dropped, along
    /// with any continuation lines that follow them.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for (index, line) in text.lines().enumerate() {
            if line.is_empty() {
                break;
            }
            if index == 0 && line.starts_with("From ") {
                continue;
            }

            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = current.as_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value.trim_end());
            }

            current = line.split_once(':').and_then(|(name, value)| {
                let name = name.trim();
                let valid = !name.is_empty() && !name.contains(char::is_whitespace);
                valid.then(|| (name.to_string(), value.trim().to_string()))
            });
        }

        if let Some((name, value)) = current {
            headers.add(name, value.trim_end());
        }

        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_headers_repeated_keep_order() {
        let mut headers = Headers::new();
        headers.add("Autocrypt", "first");
        headers.add("Subject", "Hi");
        headers.add("autocrypt", "second");

        assert_eq!(headers.get_all("Autocrypt"), vec!["first", "second"]);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_headers_set_replaces() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.org");
        headers.add("To", "bob@example.org");
        headers.set("to", "carol@example.org");

        assert_eq!(headers.get_all("To"), vec!["carol@example.org"]);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        headers.remove("subject");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_parse_unfolds_continuations() {
        let text = concat!(
            "From: sender@example.org\r\n",
            "Autocrypt: addr=sender@example.org; keydata=\r\n",
            "  AAAA\r\n",
            "  BBBB\r\n",
            "Subject: Test Message\r\n",
            "\r\n",
            "Body: not a header\r\n",
        );

        let headers = Headers::parse(text);
        assert_eq!(headers.get("From"), Some("sender@example.org"));
        assert_eq!(
            headers.get("Autocrypt"),
            Some("addr=sender@example.org; keydata= AAAA BBBB")
        );
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert!(headers.get("Body").is_none());
    }

    #[test]
    fn test_headers_parse_skips_leading_continuation() {
        let headers = Headers::parse("  orphan\r\nFrom: a@b\r\n");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("From"), Some("a@b"));
    }

    #[test]
    fn test_headers_parse_skips_mbox_separator() {
        let headers = Headers::parse(concat!(
            "From alice@example.org Sun Feb  2 10:00:00 2020\n",
            "From: alice@example.org\n",
            "Subject: hi\n",
        ));
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("From"), Some("alice@example.org"));
    }

    #[test]
    fn test_headers_parse_drops_malformed_lines() {
        let headers = Headers::parse(concat!(
            "From: a@b\n",
            "this line has no colon\n",
            "  and a continuation\n",
            "Bad Name: value\n",
            "Subject: kept\n",
        ));
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("From"), Some("a@b"));
        assert_eq!(headers.get("Subject"), Some("kept"));
    }

    #[test]
    fn test_headers_display_keeps_order() {
        let mut headers = Headers::new();
        headers.add("To", "recipient@example.org");
        headers.add("From", "sender@example.org");

        assert_eq!(
            headers.to_string(),
            "To: recipient@example.org\nFrom: sender@example.org\n"
        );
    }
}

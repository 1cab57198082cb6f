//! Address field parsing.
//!
//! Only the routable `local@domain` part is extracted; display names and
//! comments are discarded. Group syntax and obsolete routes are not
//! supported.

/// Returns the routable address part of a single address field.
///
/// Accepts `addr@example.org`, `Name <addr@example.org>` and
/// `"Quoted, Name" <addr@example.org>`. A trailing `(comment)` is dropped.
/// Returns `None` when no address can be found.
#[must_use]
pub fn parse_email_addr(field: &str) -> Option<String> {
    let field = field.trim();

    let addr = if let Some(open) = find_unquoted(field, '<') {
        let rest = &field[open + 1..];
        let close = rest.find('>')?;
        &rest[..close]
    } else {
        field.split('(').next().unwrap_or_default()
    };

    let addr = addr.trim().trim_matches('"');
    if addr.is_empty() || addr.contains(char::is_whitespace) {
        return None;
    }
    Some(addr.to_string())
}

/// Splits an address list (`To`, `Cc`) and returns each routable address.
///
/// Entries without a usable address are skipped.
#[must_use]
pub fn parse_address_list(field: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_angle = false;

    for (i, c) in field.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                entries.push(&field[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&field[start..]);

    entries.into_iter().filter_map(parse_email_addr).collect()
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == needle && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

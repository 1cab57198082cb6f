//! Encoding helpers for header values.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Base64 data after removing all embedded whitespace.
///
/// Folded header values carry line breaks and indentation inside the
/// encoded text; those are not part of the payload.
///
/// # Errors
///
/// Returns an error if the remaining input is not valid Base64.
pub fn decode_base64_lenient(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    decode_base64(&cleaned)
}

/// Splits `value` into lines of at most `width` characters, each prefixed
/// with `indent` and terminated by a newline. Trailing whitespace of the
/// result (including the final newline) is stripped.
///
/// A `width` of zero is treated as one.
#[must_use]
pub fn fold_lines(value: &str, width: usize, indent: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut folded = String::with_capacity(value.len() * 2);

    for chunk in chars.chunks(width.max(1)) {
        folded.push_str(indent);
        folded.extend(chunk);
        folded.push('\n');
    }

    let trimmed_len = folded.trim_end().len();
    folded.truncate(trimmed_len);
    folded
}

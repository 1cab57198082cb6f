//! Error types for envelope parsing.

/// Result type alias for envelope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Envelope parsing error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// The raw message has no header block.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}

//! Error types for the codecs.

use thiserror::Error;

/// Errors raised while encoding or decoding keys and payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Empty keys and names have no mapping.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The key is not valid UTF-8 and cannot become a path.
    #[error("key is not valid UTF-8: {0}")]
    NonUtf8Key(String),

    /// A stored payload is not valid base64.
    #[error("payload decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Convenience type alias for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

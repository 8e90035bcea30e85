//! Error types for stagebox wire payloads.

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire payloads.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 field could not be decoded
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Entry id text was not 32 hex characters
    #[error("invalid entry id: {0:?}")]
    InvalidEntryId(String),

    /// Zero id is reserved and never names an entry
    #[error("entry id must not be zero")]
    ZeroEntryId,

    /// Signature has the wrong number of bytes
    #[error("invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Copy request carried no content
    #[error("content must not be empty")]
    EmptyContent,

    /// Unknown operation name
    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),
}

//! Error types for stage-relay.

use stage_core::CryptoError;
use stage_types::{EntryId, WireError};

use crate::dispatcher::Status;

/// Main error type for stage-relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Content must be non-empty.
    #[error("entry content is empty")]
    EmptyContent,

    /// Entry not found.
    #[error("entry not found: {id}")]
    NotFound {
        /// The entry ID that was not found.
        id: EntryId,
    },

    /// The OS random source could not seed the id generator.
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// Every 128-bit id has been issued.
    #[error("entry id space exhausted")]
    IdSpaceExhausted,

    /// The generator issued an id that does not follow the last one.
    #[error("non-monotonic entry id: {next} after {last}")]
    NonMonotonicId {
        /// Last id accepted by the store.
        last: EntryId,
        /// Id the generator just returned.
        next: EntryId,
    },
}

/// Dispatcher errors.
///
/// Only [`DispatchError::NotFound`] is visible to the caller as such. The
/// validation failures all collapse into [`Status::BadRequest`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The request body could not be opened with the shared key.
    #[error("decryption failed: {0}")]
    Decryption(#[source] CryptoError),

    /// The opened payload is not a valid request for the operation.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] WireError),

    /// The request signature does not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// The target entry does not exist (or the store is empty).
    #[error("entry not found")]
    NotFound,

    /// The store failed.
    #[error("storage error: {0}")]
    Storage(#[source] StorageError),

    /// Any other server-side fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// The caller-visible classification of this error.
    pub fn status(&self) -> Status {
        match self {
            DispatchError::Decryption(_)
            | DispatchError::MalformedPayload(_)
            | DispatchError::InvalidSignature => Status::BadRequest,
            DispatchError::NotFound => Status::NotFound,
            DispatchError::Storage(_) | DispatchError::Internal(_) => Status::InternalError,
        }
    }
}

impl From<StorageError> for DispatchError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => DispatchError::NotFound,
            StorageError::EmptyContent => DispatchError::MalformedPayload(WireError::EmptyContent),
            other => DispatchError::Storage(other),
        }
    }
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type alias for dispatcher operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

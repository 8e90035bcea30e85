//! Sealing requests and opening replies.
//!
//! [`RequestBuilder`] does all the cryptography a client needs and no I/O,
//! so it can be used with any transport.

use crate::client::ClientError;
use stage_core::{PrivateKey, SharedKey};
use stage_types::{
    CopyRequest, EntryId, ListRequest, ListResponse, MoveRequest, PasteRequest, Target,
    WireError, WireMessage, LIST_SIGNED_BYTES, NOT_FOUND_MARKER,
};

/// Builds sealed, signed request bodies and opens reply bodies.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    shared_key: SharedKey,
    private_key: PrivateKey,
}

impl RequestBuilder {
    /// Create a builder from the shared key and this client's signing key.
    pub fn new(shared_key: SharedKey, private_key: PrivateKey) -> Self {
        Self {
            shared_key,
            private_key,
        }
    }

    fn seal<M: WireMessage>(&self, message: &M) -> Result<Vec<u8>, ClientError> {
        let plaintext = message.to_bytes()?;
        Ok(self.shared_key.seal(&plaintext)?)
    }

    /// Sealed body of a copy request.
    pub fn copy(&self, content: &[u8]) -> Result<Vec<u8>, ClientError> {
        if content.is_empty() {
            return Err(WireError::EmptyContent.into());
        }
        self.seal(&CopyRequest {
            content: content.to_vec(),
            signature: self.private_key.sign(content),
        })
    }

    /// Sealed body of a move request.
    pub fn move_entry(&self, target: Target) -> Result<Vec<u8>, ClientError> {
        self.seal(&MoveRequest {
            target,
            signature: self.private_key.sign(&target.signed_bytes()),
        })
    }

    /// Sealed body of a paste request.
    pub fn paste(&self, target: Target) -> Result<Vec<u8>, ClientError> {
        self.seal(&PasteRequest {
            target,
            signature: self.private_key.sign(&target.signed_bytes()),
        })
    }

    /// Sealed body of a list request.
    pub fn list(&self) -> Result<Vec<u8>, ClientError> {
        self.seal(&ListRequest {
            signature: self.private_key.sign(LIST_SIGNED_BYTES),
        })
    }

    /// Open a sealed reply body.
    pub fn open(&self, body: &[u8]) -> Result<Vec<u8>, ClientError> {
        Ok(self.shared_key.open(body)?)
    }

    /// Open the reply to a copy request.
    pub fn open_id(&self, body: &[u8]) -> Result<EntryId, ClientError> {
        let bytes = self.open(body)?;
        EntryId::from_bytes(&bytes).ok_or_else(|| {
            ClientError::InvalidResponse(format!("expected 16-byte id, got {} bytes", bytes.len()))
        })
    }

    /// Open the reply to a list request.
    pub fn open_list(&self, body: &[u8]) -> Result<Vec<EntryId>, ClientError> {
        let bytes = self.open(body)?;
        Ok(ListResponse::from_bytes(&bytes)?.entries)
    }

    /// Check that a not-found reply really came from the relay.
    pub fn open_not_found(&self, body: &[u8]) -> Result<(), ClientError> {
        if self.open(body)? == NOT_FOUND_MARKER {
            Ok(())
        } else {
            Err(ClientError::InvalidResponse(
                "not-found reply without marker".to_string(),
            ))
        }
    }
}

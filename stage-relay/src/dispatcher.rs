//! Request dispatch.
//!
//! Every request goes through the same steps, in order:
//!
//! 1. Open the body with the shared key
//! 2. Decode the operation's payload
//! 3. Verify the payload signature
//! 4. Run the store operation
//! 5. Seal the result
//!
//! Nothing reaches the store until steps 1-3 have passed.

use crate::error::{DispatchError, DispatchResult};
use crate::storage::EntryStore;
use stage_core::{PublicKey, SharedKey};
use stage_types::{
    CopyRequest, ListRequest, ListResponse, MoveRequest, Operation, PasteRequest, Signature,
    Target, WireMessage,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub use stage_types::NOT_FOUND_MARKER;

/// Caller-visible outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The operation ran.
    Success,
    /// The body could not be opened, decoded, or verified.
    BadRequest,
    /// The target entry does not exist.
    NotFound,
    /// The relay failed.
    InternalError,
}

/// Status and (possibly sealed) body of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Outcome classification.
    pub status: Status,
    /// Sealed payload for `Success` and `NotFound`, empty otherwise.
    pub body: Vec<u8>,
}

impl Reply {
    fn empty(status: Status) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Maps sealed requests onto an [`EntryStore`].
pub struct Dispatcher {
    shared_key: SharedKey,
    public_key: PublicKey,
    store: Arc<dyn EntryStore>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("public_key", &self.public_key)
            .field("entries", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(shared_key: SharedKey, public_key: PublicKey, store: Arc<dyn EntryStore>) -> Self {
        Self {
            shared_key,
            public_key,
            store,
        }
    }

    /// The store requests are dispatched to.
    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    /// Handle one sealed request body.
    ///
    /// Never panics and never leaks which validation step failed: bad-request
    /// and internal-error replies carry an empty body.
    pub fn dispatch(&self, op: Operation, body: &[u8]) -> Reply {
        let (status, plaintext) = match self.handle(op, body) {
            Ok(plaintext) => (Status::Success, plaintext),
            Err(DispatchError::NotFound) => {
                debug!(%op, "entry not found");
                (Status::NotFound, NOT_FOUND_MARKER.to_vec())
            }
            Err(e) => {
                let status = e.status();
                if status == Status::InternalError {
                    error!(%op, error = %e, "request failed");
                } else {
                    warn!(%op, error = %e, "request rejected");
                }
                return Reply::empty(status);
            }
        };

        match self.shared_key.seal(&plaintext) {
            Ok(body) => Reply { status, body },
            Err(e) => {
                error!(%op, error = %e, "failed to seal reply");
                Reply::empty(Status::InternalError)
            }
        }
    }

    fn handle(&self, op: Operation, body: &[u8]) -> DispatchResult<Vec<u8>> {
        let plaintext = self
            .shared_key
            .open(body)
            .map_err(DispatchError::Decryption)?;

        match op {
            Operation::Copy => self.copy(&plaintext),
            Operation::Move => self.move_entry(&plaintext),
            Operation::Paste => self.paste(&plaintext),
            Operation::List => self.list(&plaintext),
        }
    }

    fn verify(&self, message: &[u8], signature: &Signature) -> DispatchResult<()> {
        if self.public_key.verify(message, signature) {
            Ok(())
        } else {
            Err(DispatchError::InvalidSignature)
        }
    }

    fn copy(&self, plaintext: &[u8]) -> DispatchResult<Vec<u8>> {
        let request = CopyRequest::from_bytes(plaintext)?;
        self.verify(request.signed_bytes(), &request.signature)?;

        let size = request.content.len();
        let id = self.store.add(request.content)?;
        debug!(%id, size, "staged entry");
        Ok(id.to_bytes().to_vec())
    }

    fn move_entry(&self, plaintext: &[u8]) -> DispatchResult<Vec<u8>> {
        let request = MoveRequest::from_bytes(plaintext)?;
        self.verify(&request.target.signed_bytes(), &request.signature)?;

        let content = match request.target {
            Target::Oldest => self.store.remove_first()?.ok_or(DispatchError::NotFound)?,
            Target::Specific(id) => self.store.remove(id)?,
        };
        debug!(entry = %request.target, size = content.len(), "moved entry");
        Ok(content)
    }

    fn paste(&self, plaintext: &[u8]) -> DispatchResult<Vec<u8>> {
        let request = PasteRequest::from_bytes(plaintext)?;
        self.verify(&request.target.signed_bytes(), &request.signature)?;

        let content = match request.target {
            Target::Oldest => self.store.copy_first()?.ok_or(DispatchError::NotFound)?,
            Target::Specific(id) => self.store.copy(id)?,
        };
        debug!(entry = %request.target, size = content.len(), "pasted entry");
        Ok(content)
    }

    fn list(&self, plaintext: &[u8]) -> DispatchResult<Vec<u8>> {
        let request = ListRequest::from_bytes(plaintext)?;
        self.verify(request.signed_bytes(), &request.signature)?;

        let entries = self.store.list_all()?;
        debug!(count = entries.len(), "listed entries");
        ListResponse { entries }
            .to_bytes()
            .map_err(|e| DispatchError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SequentialIdGenerator};
    use stage_core::{generate_key_pair, PrivateKey};
    use stage_types::{EntryId, LIST_SIGNED_BYTES};

    struct Fixture {
        dispatcher: Dispatcher,
        shared_key: SharedKey,
        private_key: PrivateKey,
    }

    fn fixture() -> Fixture {
        let shared_key = SharedKey::generate().unwrap();
        let (public_key, private_key) = generate_key_pair();
        let store = Arc::new(MemoryStore::new(SequentialIdGenerator::new()));
        Fixture {
            dispatcher: Dispatcher::new(shared_key.clone(), public_key, store),
            shared_key,
            private_key,
        }
    }

    impl Fixture {
        fn seal<M: WireMessage>(&self, message: &M) -> Vec<u8> {
            self.shared_key.seal(&message.to_bytes().unwrap()).unwrap()
        }

        fn copy_body(&self, content: &[u8]) -> Vec<u8> {
            self.seal(&CopyRequest {
                content: content.to_vec(),
                signature: self.private_key.sign(content),
            })
        }

        fn target_signature(&self, target: Target) -> Signature {
            self.private_key.sign(&target.signed_bytes())
        }

        fn move_body(&self, target: Target) -> Vec<u8> {
            self.seal(&MoveRequest {
                target,
                signature: self.target_signature(target),
            })
        }

        fn paste_body(&self, target: Target) -> Vec<u8> {
            self.seal(&PasteRequest {
                target,
                signature: self.target_signature(target),
            })
        }

        fn list_body(&self) -> Vec<u8> {
            self.seal(&ListRequest {
                signature: self.private_key.sign(LIST_SIGNED_BYTES),
            })
        }

        fn open(&self, reply: &Reply) -> Vec<u8> {
            self.shared_key.open(&reply.body).unwrap()
        }

        fn stage(&self, content: &[u8]) -> EntryId {
            let reply = self
                .dispatcher
                .dispatch(Operation::Copy, &self.copy_body(content));
            assert_eq!(reply.status, Status::Success);
            EntryId::from_bytes(&self.open(&reply)).unwrap()
        }
    }

    // ===========================================
    // Copy Tests
    // ===========================================

    #[test]
    fn copy_returns_sealed_id() {
        let f = fixture();
        let reply = f.dispatcher.dispatch(Operation::Copy, &f.copy_body(b"x"));

        assert_eq!(reply.status, Status::Success);
        let id = EntryId::from_bytes(&f.open(&reply)).unwrap();
        assert_eq!(f.dispatcher.store().list_all().unwrap(), vec![id]);
    }

    #[test]
    fn flipped_signature_byte_is_rejected_without_mutation() {
        let f = fixture();
        let mut signature = *f.private_key.sign(b"x").as_bytes();
        signature[0] ^= 0x01;
        let body = f.seal(&CopyRequest {
            content: b"x".to_vec(),
            signature: Signature::from_array(signature),
        });

        let reply = f.dispatcher.dispatch(Operation::Copy, &body);
        assert_eq!(reply.status, Status::BadRequest);
        assert!(reply.body.is_empty());
        assert!(f.dispatcher.store().is_empty());
    }

    #[test]
    fn copy_rejects_empty_content() {
        let f = fixture();
        let reply = f.dispatcher.dispatch(Operation::Copy, &f.copy_body(b""));
        assert_eq!(reply.status, Status::BadRequest);
        assert!(f.dispatcher.store().is_empty());
    }

    // ===========================================
    // Envelope Tests
    // ===========================================

    #[test]
    fn unsealed_bodies_are_bad_requests() {
        let f = fixture();
        for op in [
            Operation::Copy,
            Operation::Move,
            Operation::Paste,
            Operation::List,
        ] {
            for body in [&b""[..], &b"short"[..], &[0u8; 128][..]] {
                let reply = f.dispatcher.dispatch(op, body);
                assert_eq!(reply, Reply::empty(Status::BadRequest), "{} {:?}", op, body);
            }
        }
    }

    #[test]
    fn wrong_shared_key_is_rejected() {
        let f = fixture();
        let other = SharedKey::generate().unwrap();
        let body = other
            .seal(
                &CopyRequest {
                    content: b"x".to_vec(),
                    signature: f.private_key.sign(b"x"),
                }
                .to_bytes()
                .unwrap(),
            )
            .unwrap();

        let reply = f.dispatcher.dispatch(Operation::Copy, &body);
        assert_eq!(reply.status, Status::BadRequest);
        assert!(f.dispatcher.store().is_empty());
    }

    #[test]
    fn payload_for_other_operation_is_malformed() {
        let f = fixture();
        let reply = f.dispatcher.dispatch(Operation::Move, &f.copy_body(b"x"));
        assert_eq!(reply.status, Status::BadRequest);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let f = fixture();
        let signature = f.private_key.sign(LIST_SIGNED_BYTES);
        let json = format!(
            r#"{{"signature":{},"extra":1}}"#,
            serde_json::to_string(&signature).unwrap()
        );
        let body = f.shared_key.seal(json.as_bytes()).unwrap();

        let reply = f.dispatcher.dispatch(Operation::List, &body);
        assert_eq!(reply.status, Status::BadRequest);
    }

    #[test]
    fn foreign_signing_key_is_rejected() {
        let f = fixture();
        let (_, stranger) = generate_key_pair();
        let body = f.seal(&ListRequest {
            signature: stranger.sign(LIST_SIGNED_BYTES),
        });

        let reply = f.dispatcher.dispatch(Operation::List, &body);
        assert_eq!(reply.status, Status::BadRequest);
    }

    // ===========================================
    // Move / Paste Tests
    // ===========================================

    #[test]
    fn paste_leaves_entry_and_move_takes_it() {
        let f = fixture();
        let id = f.stage(b"hello");

        let reply = f
            .dispatcher
            .dispatch(Operation::Paste, &f.paste_body(Target::Specific(id)));
        assert_eq!(reply.status, Status::Success);
        assert_eq!(f.open(&reply), b"hello");
        assert_eq!(f.dispatcher.store().len(), 1);

        let reply = f
            .dispatcher
            .dispatch(Operation::Move, &f.move_body(Target::Specific(id)));
        assert_eq!(reply.status, Status::Success);
        assert_eq!(f.open(&reply), b"hello");
        assert!(f.dispatcher.store().is_empty());
    }

    #[test]
    fn oldest_target_uses_smallest_id() {
        let f = fixture();
        f.stage(b"first");
        f.stage(b"second");

        let reply = f
            .dispatcher
            .dispatch(Operation::Paste, &f.paste_body(Target::Oldest));
        assert_eq!(f.open(&reply), b"first");

        let reply = f
            .dispatcher
            .dispatch(Operation::Move, &f.move_body(Target::Oldest));
        assert_eq!(f.open(&reply), b"first");

        let reply = f
            .dispatcher
            .dispatch(Operation::Move, &f.move_body(Target::Oldest));
        assert_eq!(f.open(&reply), b"second");
    }

    #[test]
    fn empty_store_is_not_found() {
        let f = fixture();
        for (op, body) in [
            (Operation::Move, f.move_body(Target::Oldest)),
            (Operation::Paste, f.paste_body(Target::Oldest)),
        ] {
            let reply = f.dispatcher.dispatch(op, &body);
            assert_eq!(reply.status, Status::NotFound);
            assert_eq!(f.open(&reply), NOT_FOUND_MARKER);
        }
    }

    #[test]
    fn missing_id_is_not_found() {
        let f = fixture();
        let id = f.stage(b"x");
        f.dispatcher
            .dispatch(Operation::Move, &f.move_body(Target::Specific(id)));

        let reply = f
            .dispatcher
            .dispatch(Operation::Move, &f.move_body(Target::Specific(id)));
        assert_eq!(reply.status, Status::NotFound);
    }

    #[test]
    fn signature_is_bound_to_target() {
        let f = fixture();
        let a = f.stage(b"a");
        let b = f.stage(b"b");

        let body = f.seal(&MoveRequest {
            target: Target::Specific(b),
            signature: f.target_signature(Target::Specific(a)),
        });
        let reply = f.dispatcher.dispatch(Operation::Move, &body);
        assert_eq!(reply.status, Status::BadRequest);
        assert_eq!(f.dispatcher.store().len(), 2);
    }

    // ===========================================
    // List Tests
    // ===========================================

    #[test]
    fn list_returns_ids_in_order() {
        let f = fixture();
        let a = f.stage(b"a");
        let b = f.stage(b"b");

        let reply = f.dispatcher.dispatch(Operation::List, &f.list_body());
        assert_eq!(reply.status, Status::Success);
        let response = ListResponse::from_bytes(&f.open(&reply)).unwrap();
        assert_eq!(response.entries, vec![a, b]);
    }

    #[test]
    fn list_on_empty_store_succeeds() {
        let f = fixture();
        let reply = f.dispatcher.dispatch(Operation::List, &f.list_body());
        assert_eq!(reply.status, Status::Success);
        let response = ListResponse::from_bytes(&f.open(&reply)).unwrap();
        assert!(response.entries.is_empty());
    }
}

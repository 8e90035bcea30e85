//! # stage-core
//!
//! Cryptographic envelope for stagebox (no I/O, instant tests).
//!
//! Every request and response body is sealed with the pre-shared
//! [`SharedKey`], and every request payload is signed with the client's
//! [`PrivateKey`]. The relay only ever holds the matching [`PublicKey`].
//!
//! ## Wire unit
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────┐
//! │ nonce (24 B) │ XChaCha20-Poly1305 ciphertext + tag  │
//! └──────────────┴──────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crypto;

pub use crypto::{
    generate_key_pair, CryptoError, PrivateKey, PublicKey, SharedKey, KEY_SIZE, NONCE_SIZE,
    PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, TAG_SIZE,
};

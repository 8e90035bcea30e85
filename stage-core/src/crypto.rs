//! Cryptographic primitives for stagebox.
//!
//! This module provides:
//! - XChaCha20-Poly1305 sealing of request/response bodies under a shared key
//! - Ed25519 signing and verification of request payloads
//! - Base64 text encoding of all key material, with exact length checks
//!
//! # Security Notes
//!
//! - XChaCha20 uses 192-bit nonces (24 bytes), safe for random generation
//! - Nonces come from the OS CSPRNG on every seal and are never reused
//! - Signatures are verified in strict mode (no malleable encodings)

use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use stage_types::Signature;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Nonce size for XChaCha20-Poly1305 (192 bits = 24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Key size for XChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Ed25519 public key size.
pub const PUBLIC_KEY_SIZE: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

/// Ed25519 private key size (seed followed by public key).
pub const PRIVATE_KEY_SIZE: usize = ed25519_dalek::KEYPAIR_LENGTH;

/// Crypto errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (authentication error).
    #[error("decryption failed: authentication error")]
    DecryptionFailed,

    /// Sealed box is too short to hold a nonce and tag.
    #[error("sealed box too short: {actual} bytes (minimum {minimum})")]
    TooShort {
        /// Actual length.
        actual: usize,
        /// Minimum length.
        minimum: usize,
    },

    /// Invalid key length.
    #[error("invalid {kind} length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Which key was being decoded.
        kind: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Key text was not valid base64.
    #[error("invalid key encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// Key bytes had the right length but were rejected.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The OS random source failed.
    #[error("random source failure: {0}")]
    RandomSource(String),
}

fn decode_fixed<const N: usize>(kind: &'static str, text: &str) -> Result<[u8; N], CryptoError> {
    let mut bytes = STANDARD.decode(text.trim())?;
    let result = fixed_bytes(kind, &bytes);
    bytes.zeroize();
    result
}

fn fixed_bytes<const N: usize>(kind: &'static str, bytes: &[u8]) -> Result<[u8; N], CryptoError> {
    bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        kind,
        expected: N,
        actual: bytes.len(),
    })
}

/// The key shared between the relay and every client.
///
/// Used only to seal and open wire envelopes. It does not authenticate who
/// sent a request; that is the job of the signing key pair.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; KEY_SIZE]);

impl SharedKey {
    /// Generate a new random shared key.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::RandomSource(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Create a SharedKey from raw bytes, checking the length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        fixed_bytes("shared key", bytes).map(Self)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    fn cipher(&self) -> Result<XChaCha20Poly1305, CryptoError> {
        XChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    /// Seal `plaintext` into `nonce || ciphertext`.
    ///
    /// A fresh random 192-bit nonce is drawn for every call.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::RandomSource(e.to_string()))?;

        let ciphertext = self
            .cipher()?
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed("aead encrypt failed".into()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a `nonce || ciphertext` box sealed with this key.
    ///
    /// Returns the plaintext only if authentication succeeds. Inputs too short
    /// to hold a nonce and tag are rejected before any decryption is attempted.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let minimum = NONCE_SIZE + TAG_SIZE;
        if sealed.len() < minimum {
            return Err(CryptoError::TooShort {
                actual: sealed.len(),
                minimum,
            });
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        self.cipher()?
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl fmt::Display for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(self.0))
    }
}

// Don't leak secret in debug output
impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedKey([REDACTED])")
    }
}

impl FromStr for SharedKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed("shared key", s).map(Self)
    }
}

/// Public half of a signing key pair. The relay verifies requests with it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Create a PublicKey from raw bytes, checking length and point validity.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; PUBLIC_KEY_SIZE] = fixed_bytes("public key", bytes)?;
        VerifyingKey::from_bytes(&arr)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Get the raw bytes.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Verify `signature` over `message`.
    ///
    /// Any change to the message, the signature, or the key makes this false.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        self.0.verify_strict(message, &sig).is_ok()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(self.0.as_bytes()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = decode_fixed("public key", s)?;
        Self::from_bytes(&bytes)
    }
}

/// Private half of a signing key pair. Held only by clients.
///
/// Encoded as 64 bytes: the 32-byte seed followed by the public key.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Create a PrivateKey from its 64-byte form.
    ///
    /// Fails if the embedded public key does not match the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut arr: [u8; PRIVATE_KEY_SIZE] = fixed_bytes("private key", bytes)?;
        let result = SigningKey::from_keypair_bytes(&arr)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()));
        arr.zeroize();
        result
    }

    /// Get the 64-byte form (seed || public key).
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_keypair_bytes()
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Sign `message` (deterministic, no RNG needed).
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_array(self.0.sign(message).to_bytes())
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.to_bytes();
        let result = f.write_str(&STANDARD.encode(bytes));
        bytes.zeroize();
        result
    }
}

// Don't leak secret in debug output
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

impl FromStr for PrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes: [u8; PRIVATE_KEY_SIZE] = decode_fixed("private key", s)?;
        let result = Self::from_bytes(&bytes);
        bytes.zeroize();
        result
    }
}

/// Generate a new Ed25519 key pair.
pub fn generate_key_pair() -> (PublicKey, PrivateKey) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public = PublicKey(signing_key.verifying_key());
    (public, PrivateKey(signing_key))
}

macro_rules! text_serde {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    )*};
}

text_serde!(SharedKey, PublicKey, PrivateKey);

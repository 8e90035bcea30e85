//! Request and response payloads carried inside the sealed envelope.
//!
//! Every payload is JSON. Byte fields travel as standard base64.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{EntryId, WireError, ENTRY_ID_SIZE};

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Bytes signed by a list request.
///
/// A list request has no payload of its own, so it signs this domain-separated
/// constant instead.
pub const LIST_SIGNED_BYTES: &[u8] = b"stagebox/v1/list";

/// Sealed body of a not-found reply to a move or paste.
pub const NOT_FOUND_MARKER: &[u8] = b"stagebox/v1/not-found";

/// The four operations the relay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Stage new content.
    Copy,
    /// Take an entry out of the staging area.
    Move,
    /// Read an entry, leaving it staged.
    Paste,
    /// List staged entry ids.
    List,
}

impl Operation {
    /// Lowercase operation name, as used in request paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Copy => "copy",
            Operation::Move => "move",
            Operation::Paste => "paste",
            Operation::List => "list",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" => Ok(Operation::Copy),
            "move" => Ok(Operation::Move),
            "paste" => Ok(Operation::Paste),
            "list" => Ok(Operation::List),
            other => Err(WireError::UnknownOperation(other.to_string())),
        }
    }
}

/// A detached Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Create a Signature from a fixed-size array.
    pub fn from_array(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a Signature from a slice, checking its length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let arr: [u8; SIGNATURE_SIZE] =
            bytes.try_into().map_err(|_| WireError::InvalidSignatureLength {
                expected: SIGNATURE_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(s).map_err(serde::de::Error::custom)?;
        Signature::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Which entry a move or paste applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TargetRepr", into = "TargetRepr")]
pub enum Target {
    /// The entry with the smallest id.
    Oldest,
    /// The entry with this id.
    Specific(EntryId),
}

impl Target {
    /// Bytes covered by the request signature.
    ///
    /// `Oldest` signs the all-zero id, which no entry can ever have.
    pub fn signed_bytes(&self) -> [u8; ENTRY_ID_SIZE] {
        match self {
            Target::Oldest => EntryId::ZERO.to_bytes(),
            Target::Specific(id) => id.to_bytes(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Oldest => f.write_str("oldest"),
            Target::Specific(id) => write!(f, "{}", id),
        }
    }
}

// `Oldest` is a struct variant so `deny_unknown_fields` applies to it too.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum TargetRepr {
    Oldest {},
    Specific { id: EntryId },
}

impl TryFrom<TargetRepr> for Target {
    type Error = WireError;

    fn try_from(repr: TargetRepr) -> Result<Self, Self::Error> {
        match repr {
            TargetRepr::Oldest {} => Ok(Target::Oldest),
            TargetRepr::Specific { id } if id.is_zero() => Err(WireError::ZeroEntryId),
            TargetRepr::Specific { id } => Ok(Target::Specific(id)),
        }
    }
}

impl From<Target> for TargetRepr {
    fn from(target: Target) -> Self {
        match target {
            Target::Oldest => TargetRepr::Oldest {},
            Target::Specific(id) => TargetRepr::Specific { id },
        }
    }
}

/// JSON encoding shared by every payload type.
pub trait WireMessage: Serialize + DeserializeOwned {
    /// Check invariants serde cannot express.
    fn validate(&self) -> Result<(), WireError> {
        Ok(())
    }

    /// Serialize to JSON bytes.
    fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from JSON bytes and validate.
    fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let message: Self = serde_json::from_slice(bytes)?;
        message.validate()?;
        Ok(message)
    }
}

/// Stage new content. Signed over the content bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyRequest {
    /// Opaque content to stage.
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    /// Signature over `content`.
    pub signature: Signature,
}

impl CopyRequest {
    /// Bytes covered by the signature.
    pub fn signed_bytes(&self) -> &[u8] {
        &self.content
    }
}

impl WireMessage for CopyRequest {
    fn validate(&self) -> Result<(), WireError> {
        if self.content.is_empty() {
            return Err(WireError::EmptyContent);
        }
        Ok(())
    }
}

/// Remove an entry and return its content. Signed over the target id bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveRequest {
    /// Entry to move.
    pub target: Target,
    /// Signature over `target.signed_bytes()`.
    pub signature: Signature,
}

impl WireMessage for MoveRequest {}

/// Read an entry without removing it. Signed like [`MoveRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasteRequest {
    /// Entry to paste.
    pub target: Target,
    /// Signature over `target.signed_bytes()`.
    pub signature: Signature,
}

impl WireMessage for PasteRequest {}

/// List staged entry ids. Signed over [`LIST_SIGNED_BYTES`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListRequest {
    /// Signature over [`LIST_SIGNED_BYTES`].
    pub signature: Signature,
}

impl ListRequest {
    /// Bytes covered by the signature.
    pub fn signed_bytes(&self) -> &'static [u8] {
        LIST_SIGNED_BYTES
    }
}

impl WireMessage for ListRequest {}

/// Response to a list request, ids in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Staged entry ids, oldest first.
    pub entries: Vec<EntryId>,
}

impl WireMessage for ListResponse {}

mod base64_bytes {
    use super::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

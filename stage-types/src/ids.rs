//! Identity and ordering types for stagebox.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::WireError;

/// Size of an EntryId in bytes (128 bits).
pub const ENTRY_ID_SIZE: usize = 16;

/// Largest millisecond timestamp an EntryId can carry (48 bits).
pub const TIMESTAMP_MAX: u64 = (1 << 48) - 1;

/// Bits below the timestamp that hold the tiebreaker.
const TIEBREAK_BITS: u32 = 80;

const TIEBREAK_MASK: u128 = (1 << TIEBREAK_BITS) - 1;

/// A unique, time-sortable identifier for a staged entry.
///
/// Upper 48 bits are milliseconds since the Unix epoch, lower 80 bits are a
/// random tiebreaker. Ordering is the numeric order of the 128-bit value, so
/// ids issued later always compare greater.
///
/// Displayed as 32 lowercase hex characters. The fixed width makes the text
/// form sort the same way as the numeric form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntryId(u128);

impl EntryId {
    /// The reserved all-zero id. Never assigned to an entry.
    pub const ZERO: Self = Self(0);

    /// Create an EntryId from a millisecond timestamp and a tiebreaker.
    ///
    /// Timestamps above [`TIMESTAMP_MAX`] are clamped; only the low 80 bits of
    /// the tiebreaker are kept.
    pub fn from_parts(timestamp_ms: u64, tiebreak: u128) -> Self {
        let ts = timestamp_ms.min(TIMESTAMP_MAX) as u128;
        Self((ts << TIEBREAK_BITS) | (tiebreak & TIEBREAK_MASK))
    }

    /// Create an EntryId from its raw 128-bit value.
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Create an EntryId from 16 big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; ENTRY_ID_SIZE] = bytes.try_into().ok()?;
        Some(Self(u128::from_be_bytes(arr)))
    }

    /// Get the raw 128-bit value.
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Get the big-endian byte form, which is also the signed form.
    pub fn to_bytes(&self) -> [u8; ENTRY_ID_SIZE] {
        self.0.to_be_bytes()
    }

    /// Milliseconds since the Unix epoch encoded in this id.
    pub fn timestamp_ms(&self) -> u64 {
        (self.0 >> TIEBREAK_BITS) as u64
    }

    /// The tiebreaker component.
    pub fn tiebreak(&self) -> u128 {
        self.0 & TIEBREAK_MASK
    }

    /// Whether this is the reserved zero id.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The smallest id strictly greater than this one, if any.
    pub fn successor(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self)
    }
}

impl FromStr for EntryId {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Lowercase only, so every id has exactly one text form.
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(WireError::InvalidEntryId(s.to_string()));
        }
        let mut bytes = [0u8; ENTRY_ID_SIZE];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| WireError::InvalidEntryId(s.to_string()))?;
        Ok(Self(u128::from_be_bytes(bytes)))
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

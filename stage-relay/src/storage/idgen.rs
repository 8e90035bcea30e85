//! Entry id generation.

use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use stage_types::{EntryId, TIMESTAMP_MAX};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of entry ids.
///
/// Implementations must return strictly increasing ids, including under
/// concurrent calls, and must never return [`EntryId::ZERO`].
pub trait IdGenerator: Send + Sync {
    /// Issue the next id.
    fn next_id(&self) -> StorageResult<EntryId>;
}

/// Wall-clock id generator with a random tiebreaker.
///
/// Within one millisecond (or when the clock steps backwards) it falls back to
/// incrementing the last id, so monotonicity never depends on the clock.
#[derive(Debug)]
pub struct MonotonicIdGenerator {
    state: Mutex<GeneratorState>,
}

#[derive(Debug)]
struct GeneratorState {
    rng: StdRng,
    last: EntryId,
}

impl MonotonicIdGenerator {
    /// Create a generator seeded from the OS random source.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::RandomSource`] if the OS source is unavailable.
    pub fn new() -> StorageResult<Self> {
        let rng = StdRng::from_rng(OsRng).map_err(|e| StorageError::RandomSource(e.to_string()))?;
        Ok(Self {
            state: Mutex::new(GeneratorState {
                rng,
                last: EntryId::ZERO,
            }),
        })
    }

    fn next_id_at(&self, now_ms: u64) -> StorageResult<EntryId> {
        let now_ms = now_ms.min(TIMESTAMP_MAX);
        let mut state = self.state.lock();

        let next = if now_ms > state.last.timestamp_ms() {
            let tiebreak: u128 = state.rng.gen();
            EntryId::from_parts(now_ms, tiebreak)
        } else {
            state.last.successor().ok_or(StorageError::IdSpaceExhausted)?
        };

        state.last = next;
        Ok(next)
    }
}

impl IdGenerator for MonotonicIdGenerator {
    fn next_id(&self) -> StorageResult<EntryId> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.next_id_at(now_ms)
    }
}

/// Deterministic counter starting at 1. For tests and fakes.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Create a counter whose first id is 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> StorageResult<EntryId> {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        if value == 0 {
            return Err(StorageError::IdSpaceExhausted);
        }
        Ok(EntryId::from_u128(value as u128))
    }
}

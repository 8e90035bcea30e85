//! Storage layer for stage-relay.
//!
//! Provides an ordered entry store keyed by time-sortable [`EntryId`]s.

mod idgen;
mod memory;

pub use idgen::{IdGenerator, MonotonicIdGenerator, SequentialIdGenerator};
pub use memory::MemoryStore;

use crate::error::StorageResult;
use stage_types::EntryId;

/// Trait for entry storage backends.
///
/// Every operation is total: an empty store or an absent id is reported as a
/// value, never a panic. Each call is atomic with respect to every other call.
pub trait EntryStore: Send + Sync {
    /// Stage `content` under a newly generated id.
    ///
    /// The id is strictly greater than every id this store has issued.
    fn add(&self, content: Vec<u8>) -> StorageResult<EntryId>;

    /// Remove and return the oldest entry's content.
    ///
    /// Returns `None` if the store is empty.
    fn remove_first(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Remove and return the content staged under `id`.
    fn remove(&self, id: EntryId) -> StorageResult<Vec<u8>>;

    /// Return a copy of the oldest entry's content.
    ///
    /// Returns `None` if the store is empty.
    fn copy_first(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Return a copy of the content staged under `id`.
    fn copy(&self, id: EntryId) -> StorageResult<Vec<u8>>;

    /// Snapshot of every staged id, ascending.
    fn list_all(&self) -> StorageResult<Vec<EntryId>>;

    /// Number of staged entries.
    fn len(&self) -> usize;

    /// Whether nothing is staged.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! In-memory entry store.

use super::{EntryStore, IdGenerator};
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use stage_types::EntryId;
use std::collections::BTreeMap;

/// Entry store backed by a `BTreeMap` behind one coarse lock.
///
/// Ids are generated while the lock is held, so the order ids are issued in
/// is the order entries are inserted in.
pub struct MemoryStore<G> {
    inner: Mutex<Inner>,
    generator: G,
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<EntryId, Vec<u8>>,
    last_issued: EntryId,
}

impl<G: IdGenerator> MemoryStore<G> {
    /// Create an empty store that draws ids from `generator`.
    pub fn new(generator: G) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            generator,
        }
    }
}

impl<G> std::fmt::Debug for MemoryStore<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.inner.lock().entries.len())
            .finish_non_exhaustive()
    }
}

impl<G: IdGenerator> EntryStore for MemoryStore<G> {
    fn add(&self, content: Vec<u8>) -> StorageResult<EntryId> {
        if content.is_empty() {
            return Err(StorageError::EmptyContent);
        }

        let mut inner = self.inner.lock();
        let id = self.generator.next_id()?;
        if id <= inner.last_issued {
            return Err(StorageError::NonMonotonicId {
                last: inner.last_issued,
                next: id,
            });
        }

        inner.last_issued = id;
        inner.entries.insert(id, content);
        Ok(id)
    }

    fn remove_first(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .inner
            .lock()
            .entries
            .pop_first()
            .map(|(_, content)| content))
    }

    fn remove(&self, id: EntryId) -> StorageResult<Vec<u8>> {
        self.inner
            .lock()
            .entries
            .remove(&id)
            .ok_or(StorageError::NotFound { id })
    }

    fn copy_first(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .inner
            .lock()
            .entries
            .first_key_value()
            .map(|(_, content)| content.clone()))
    }

    fn copy(&self, id: EntryId) -> StorageResult<Vec<u8>> {
        self.inner
            .lock()
            .entries
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound { id })
    }

    fn list_all(&self) -> StorageResult<Vec<EntryId>> {
        Ok(self.inner.lock().entries.keys().copied().collect())
    }

    fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

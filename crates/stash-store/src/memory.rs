use std::collections::HashMap;
use std::sync::RwLock;

use stash_types::ContentId;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` for
/// safe concurrent access and cloned on read.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<ContentId, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    /// Drop a blob behind the index's back. Only useful for simulating
    /// corruption in tests.
    pub fn remove(&self, id: &ContentId) -> bool {
        self.blobs.write().expect("lock poisoned").remove(id).is_some()
    }

    /// Return a sorted list of all blob IDs in the store.
    pub fn all_ids(&self) -> Vec<ContentId> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut ids: Vec<ContentId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn write(&self, id: &ContentId, data: &[u8]) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(*id, data.to_vec());
        Ok(())
    }

    fn read(&self, id: &ContentId) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> ContentId {
        ContentId::from_digest([byte; 32])
    }

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryBlobStore::new();
        store.write(&id(1), b"hello world").unwrap();
        assert_eq!(store.read(&id(1)).unwrap(), b"hello world");
    }

    #[test]
    fn read_missing_blob_is_not_found() {
        let store = InMemoryBlobStore::new();
        assert!(matches!(store.read(&id(9)), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryBlobStore::new();
        store.write(&id(1), b"same").unwrap();
        store.write(&id(1), b"same").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_simulates_lost_blob() {
        let store = InMemoryBlobStore::new();
        store.write(&id(1), b"x").unwrap();
        assert!(store.remove(&id(1)));
        assert!(!store.remove(&id(1)));
        assert!(matches!(store.read(&id(1)), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn len_total_bytes_and_ids() {
        let store = InMemoryBlobStore::default();
        assert!(store.is_empty());
        store.write(&id(3), b"12345").unwrap();
        store.write(&id(1), b"123456789").unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_bytes(), 14);
        assert_eq!(store.all_ids(), vec![id(1), id(3)]);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryBlobStore::new());
        store.write(&id(7), b"shared data").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    assert_eq!(store.read(&id(7)).unwrap(), b"shared data");
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBlobStore::new();
        store.write(&id(1), b"x").unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBlobStore"));
        assert!(debug.contains("blob_count"));
    }
}

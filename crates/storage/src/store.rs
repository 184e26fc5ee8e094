//! Store traits and the in-memory implementation used by tests and genesis.
//!
//! The host runtime owns the real merkle-trie store; actions only see these
//! traits. All reads and writes are fallible so that an injected
//! cancellation can abort a transaction mid-flight.

use std::collections::BTreeMap;

use crate::error::StoreError;

/// Read-only view of the key/value state.
pub trait StateRead {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Mutable view of the key/value state.
pub trait StateMut: StateRead {
    fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError>;
    fn remove(&mut self, key: &[u8]) -> Result<(), StoreError>;
}

/// Deterministic in-memory store backed by a `BTreeMap`.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }
}

impl StateRead for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }
}

impl StateMut for MemStore {
    fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut store = MemStore::new();
        assert_eq!(store.get(b"k").unwrap(), None);

        store.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));

        store.remove(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        assert!(store.is_empty());
    }
}

//! In-memory key/value store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::storage::KeyValueStore;

/// Store backed by a `HashMap`, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    name: String,
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::default(),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries().get(key).cloned()
    }

    fn put(&self, key: &str, value: Vec<u8>) {
        self.entries().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.entries().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = MemoryStore::new("terminal_keys");
        assert!(store.is_empty());

        store.put("private", vec![1, 2, 3]);
        assert_eq!(store.get("private"), Some(vec![1, 2, 3]));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove("private"), Some(vec![1, 2, 3]));
        assert_eq!(store.get("private"), None);
        assert_eq!(store.name(), "terminal_keys");
    }
}

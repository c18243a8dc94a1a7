//! Storage handles passed to the command layer.
//!
//! The bridge never reads or writes these stores itself; it opens them through
//! the host platform at initialization and hands them over unchanged.

use std::fmt;
use std::sync::Arc;

/// Byte-oriented key/value store provided by the host.
pub trait KeyValueStore: Send + Sync {
    /// Name the store was opened under.
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn put(&self, key: &str, value: Vec<u8>);

    fn remove(&self, key: &str) -> Option<Vec<u8>>;
}

/// Stores opened for one reader session.
#[derive(Clone)]
pub struct StorageHandles {
    /// Persisted card values.
    pub card_values: Arc<dyn KeyValueStore>,

    /// Terminal keys used to skip security delays.
    pub terminal_keys: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for StorageHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageHandles")
            .field("card_values", &self.card_values.name())
            .field("terminal_keys", &self.terminal_keys.name())
            .finish()
    }
}

//! In-memory store

use std::collections::HashMap;

use async_trait::async_trait;
use dynmod_loader::CacheStore;
use parking_lot::RwLock;

/// Process-local compilation cache store.
///
/// Useful for sharing compiled artifacts between loader sessions in one process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Check if an entry exists
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.entries.write().insert(key.to_string(), value);
    }
}

//! Content-addressed compilation cache
//!
//! Wraps an external [`CacheStore`] with a get-or-compute operation keyed by a
//! digest of the inputs. Entries are never invalidated by time: any change to
//! the key parts (source text, path, engine version) produces a new key.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::hash::digest;

/// Persistent key/value storage for compilation results.
///
/// Implementations must tolerate concurrent `get`/`set` calls; concurrent writes
/// to the same key always carry equivalent values. Backend failures are the
/// store's concern: `get` reports them as a miss and `set` drops the value.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up an encoded entry
    async fn get(&self, key: &str) -> Option<String>;

    /// Store an encoded entry
    async fn set(&self, key: &str, value: String);
}

/// Handed to a producer so it can opt out of persisting its result.
#[derive(Debug, Clone, Default)]
pub struct PersistControl(Arc<AtomicBool>);

impl PersistControl {
    /// Do not store the result of the current computation.
    pub fn prevent_persist(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether [`prevent_persist`](Self::prevent_persist) was called
    pub fn is_prevented(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Content-addressed cache in front of an optional [`CacheStore`].
pub struct CompilationCache {
    store: Option<Arc<dyn CacheStore>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    stores: AtomicUsize,
}

impl CompilationCache {
    /// Create a cache backed by `store`; `None` disables caching.
    pub fn new(store: Option<Arc<dyn CacheStore>>) -> Self {
        Self {
            store,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            stores: AtomicUsize::new(0),
        }
    }

    /// Create a cache that always runs the producer
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Whether a backing store is configured
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Key under which a result for `parts` is stored.
    pub fn key<S: AsRef<str>>(parts: &[S]) -> String {
        digest(parts)
    }

    /// Return the cached result for `key_parts`, or run `producer` and cache its result.
    ///
    /// The producer receives a [`PersistControl`]; if it calls `prevent_persist()`
    /// the result is returned but not stored. Producer errors are never cached.
    /// An entry that fails to decode is treated as a miss and overwritten.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key_parts: &[&str],
        producer: F,
    ) -> Result<T, LoadError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(PersistControl) -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        let Some(store) = &self.store else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return producer(PersistControl::default()).await;
        };

        let key = digest(key_parts);
        if let Some(encoded) = store.get(&key).await {
            match serde_json::from_str::<T>(&encoded) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(target: "dynmod::cache", %key, "compilation cache hit");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(target: "dynmod::cache", %key, error = %err, "discarding undecodable cache entry");
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(target: "dynmod::cache", %key, "compilation cache miss");

        let control = PersistControl::default();
        let value = producer(control.clone()).await?;

        if control.is_prevented() {
            debug!(target: "dynmod::cache", %key, "producer prevented persisting result");
            return Ok(value);
        }

        match serde_json::to_string(&value) {
            Ok(encoded) => {
                store.set(&key, encoded).await;
                self.stores.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                warn!(target: "dynmod::cache", %key, error = %err, "failed to encode compilation result");
            }
        }
        Ok(value)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }
}

impl Default for CompilationCache {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of results served from the store
    pub hits: usize,
    /// Number of producer invocations
    pub misses: usize,
    /// Number of results written to the store
    pub stores: usize,
}

impl CacheStats {
    /// Get cache hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

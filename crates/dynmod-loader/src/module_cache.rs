//! Session module cache
//!
//! Maps module identities to their load state. An identity moves from
//! `Pending` to `Resolved` or `Failed` exactly once and never changes again;
//! there is no eviction. Claiming a vacant identity installs the `Pending`
//! entry under the same lock that observed it vacant, so concurrent loads of
//! one identity always share a single load body.

use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::error::LoadError;
use crate::identity::ModuleId;
use crate::value::Value;

/// Outcome of loading a module, delivered to every waiter.
pub type LoadResult = Result<Value, LoadError>;

/// A load body shared between all waiters of one identity.
pub(crate) type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

enum Entry {
    Pending(SharedLoad),
    Resolved(Value),
    Failed(LoadError),
}

/// Public view of a cache entry.
#[derive(Debug, Clone)]
pub enum ModuleState {
    /// A load is in flight
    Pending,
    /// The module loaded; holds its exports
    Resolved(Value),
    /// The module failed; the error is retained and never retried
    Failed(LoadError),
}

impl ModuleState {
    /// Check if the load is still in flight
    pub fn is_pending(&self) -> bool {
        matches!(self, ModuleState::Pending)
    }
}

/// Result of claiming an identity.
pub(crate) enum Claim {
    /// The identity already settled
    Settled(LoadResult),
    /// A load is in flight; `installed` is true if this claim started it
    InFlight { load: SharedLoad, installed: bool },
}

/// Identity → load state table for one loading session.
#[derive(Default)]
pub struct ModuleCache {
    entries: Mutex<HashMap<ModuleId, Entry>>,
}

impl ModuleCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `id`, or install a pending entry running the body built by `start`.
    ///
    /// `start` runs while the table is locked; it must only construct the future.
    pub(crate) fn claim<F>(&self, id: &ModuleId, start: F) -> Claim
    where
        F: FnOnce() -> BoxFuture<'static, LoadResult>,
    {
        let mut entries = self.entries.lock();
        match entries.get(id) {
            Some(Entry::Resolved(value)) => return Claim::Settled(Ok(value.clone())),
            Some(Entry::Failed(err)) => return Claim::Settled(Err(err.clone())),
            Some(Entry::Pending(load)) => {
                return Claim::InFlight {
                    load: load.clone(),
                    installed: false,
                }
            }
            None => {}
        }

        let load = start().shared();
        entries.insert(id.clone(), Entry::Pending(load.clone()));
        Claim::InFlight {
            load,
            installed: true,
        }
    }

    /// Record the outcome of a pending load. Settled entries are left untouched.
    pub(crate) fn settle(&self, id: &ModuleId, outcome: &LoadResult) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(id) {
            if matches!(entry, Entry::Pending(_)) {
                *entry = match outcome {
                    Ok(value) => Entry::Resolved(value.clone()),
                    Err(err) => Entry::Failed(err.clone()),
                };
            }
        }
    }

    /// Insert an already-resolved module, unless the identity is already known.
    ///
    /// Returns false if an entry existed.
    pub fn preload(&self, id: ModuleId, value: Value) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(id, Entry::Resolved(value));
        true
    }

    /// Exports of a resolved module
    pub fn resolved(&self, id: &ModuleId) -> Option<Value> {
        match self.entries.lock().get(id) {
            Some(Entry::Resolved(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Current state of an identity
    pub fn state(&self, id: &ModuleId) -> Option<ModuleState> {
        self.entries.lock().get(id).map(|entry| match entry {
            Entry::Pending(_) => ModuleState::Pending,
            Entry::Resolved(value) => ModuleState::Resolved(value.clone()),
            Entry::Failed(err) => ModuleState::Failed(err.clone()),
        })
    }

    /// All known identities, sorted
    pub fn ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.entries.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of known identities
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

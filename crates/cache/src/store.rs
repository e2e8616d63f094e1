//! Thread-safe, context-scoped in-memory store

use crate::{CacheContext, CacheKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};

/// A stored value and the context it was computed under.
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    context: CacheContext,
}

/// Process-lifetime cache mapping a [`CacheKey`] to a value tagged with a [`CacheContext`].
///
/// There is no TTL, no size bound and no persistence. Every operation is a
/// single map access under an [`RwLock`], so concurrent `set` and `get` on the
/// same key never observe a partially written entry; with concurrent writers
/// the last one wins.
#[derive(Debug)]
pub struct ContextCache<V> {
    entries: RwLock<HashMap<CacheKey, Entry<V>>>,
}

impl<V: Clone> ContextCache<V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store `value` under `key`, tagged with `context`.
    ///
    /// Replaces any prior entry at `key`, whatever its context.
    pub fn set(&self, key: CacheKey, value: V, context: CacheContext) {
        trace!(key = %key, context = %context, "Cache write");
        self.entries.write().insert(key, Entry { value, context });
    }

    /// Look up `key` under `context`.
    ///
    /// Returns the value only if an entry exists and its context equals
    /// `context` exactly. A mismatched entry is left in place.
    #[must_use]
    pub fn get(&self, key: &CacheKey, context: &CacheContext) -> Option<V> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if entry.context == *context => Some(entry.value.clone()),
            Some(_) => {
                debug!(key = %key, "Cache entry has a stale context");
                None
            }
            None => None,
        }
    }

    /// Remove the entry at `key`. Returns whether an entry was removed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Remove every entry tagged with `context`. Returns the number removed.
    pub fn invalidate_context(&self, context: &CacheContext) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.context != *context);
        let removed = before - entries.len();
        debug!(context = %context, removed, "Invalidated cache context");
        removed
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<V: Clone> Default for ContextCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

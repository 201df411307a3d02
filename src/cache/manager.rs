//! In-memory response cache
//!
//! Provides a `ResponseCache` that stores values alongside the timestamp they were
//! computed at. Reads never judge freshness themselves: callers ask the returned
//! `CachedData` whether it falls inside their own window.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Wrapper struct for a cached value
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// The cached data
    data: V,
    /// When the data was cached
    cached_at: DateTime<Utc>,
}

/// Result of reading from cache, including when the value was computed
#[derive(Debug, Clone)]
pub struct CachedData<V> {
    /// The cached data
    pub data: V,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
}

impl<V> CachedData<V> {
    /// Time elapsed since the value was cached
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.cached_at
    }

    /// Whether the value may be reused under the given freshness window
    ///
    /// An entry is fresh while `0 <= now - cached_at < window`, so a zero window
    /// never matches. A negative age (wall clock stepped backwards) counts as stale.
    pub fn is_fresh(&self, window: Duration) -> bool {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        let age = self.age();
        age >= TimeDelta::zero() && age < window
    }
}

/// Process-wide cache of computed values
///
/// Clones share the same storage, so a client and its clones see each other's
/// entries. Entries are overwritten on write and otherwise kept until `clear`,
/// including after they go stale.
#[derive(Debug)]
pub struct ResponseCache<K, V> {
    entries: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
}

impl<K, V> Clone for ResponseCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> Default for ResponseCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash, V: Clone> ResponseCache<K, V> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the entry map, recovering the data if another holder panicked
    fn entries(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `data` under `key`, replacing any previous entry
    ///
    /// Returns the timestamp recorded for the entry.
    pub fn write(&self, key: K, data: V) -> DateTime<Utc> {
        let cached_at = Utc::now();
        self.entries().insert(key, CacheEntry { data, cached_at });
        cached_at
    }

    /// Reads the entry for `key`
    ///
    /// Stale entries are returned as well; use `CachedData::is_fresh` to decide
    /// whether the value can be reused.
    pub fn read(&self, key: &K) -> Option<CachedData<V>> {
        self.entries().get(key).map(|entry| CachedData {
            data: entry.data.clone(),
            cached_at: entry.cached_at,
        })
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of stored entries, fresh or stale
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

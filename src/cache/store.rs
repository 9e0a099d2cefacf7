//! In-memory TTL store for upstream responses
//!
//! Provides a `TtlCache` that maps opaque string keys to immutable values with
//! an expiry instant. Entries past their expiry are never handed back to a caller:
//! `get` evicts them lazily and `purge_expired` sweeps them in bulk.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Upper bound applied when `now + ttl` would overflow the clock
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A stored value together with its freshness window
struct CacheEntry {
    /// The cached value, shared and never mutated after insertion
    value: Arc<dyn Any + Send + Sync>,
    /// When the value was stored
    cached_at: Instant,
    /// First instant at which the entry is no longer fresh
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-wide store of transient upstream data
///
/// Cloning a `TtlCache` is cheap and every clone shares the same entries, so one
/// store is created at startup and handed to whatever needs it. Values are keyed by
/// string and retrieved by type; asking for a key with the wrong type behaves like
/// a miss.
///
/// Timestamps come from `tokio::time::Instant`, which lets tests drive expiry with a
/// paused runtime clock.
#[derive(Clone, Default)]
pub struct TtlCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl TtlCache {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key` if it is still fresh
    ///
    /// An expired entry is removed on the spot and reported as absent. A fresh entry
    /// holding a different type than `T` is left in place and reported as absent.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let entry = entries.get(key)?;
        if !entry.is_fresh(now) {
            entries.remove(key);
            debug!(key, "evicted expired cache entry");
            return None;
        }

        let value = entry.value.downcast_ref::<T>().cloned();
        if value.is_none() {
            debug!(
                key,
                expected = std::any::type_name::<T>(),
                "cache entry holds a different type"
            );
        }
        value
    }

    /// Stores `value` under `key`, replacing any previous entry
    ///
    /// The entry is fresh until `now + ttl`. A zero TTL stores an entry that is
    /// already expired.
    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + MAX_TTL);

        debug!(key = %key, ttl_secs = ttl.as_secs(), "stored cache entry");
        self.entries.lock().insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                cached_at: now,
                expires_at,
            },
        );
    }

    /// Time left before the entry under `key` expires, if it is present and fresh
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.expires_at - now)
    }

    /// How long ago the entry under `key` was stored, if it is present and fresh
    pub fn age(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| now - entry.cached_at)
    }

    /// Removes every expired entry and returns how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

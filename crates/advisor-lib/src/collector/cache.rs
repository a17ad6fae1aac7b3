//! TTL cache for collected signals
//!
//! Entries are write-once per key per TTL window: once a value is stored it
//! is never replaced until it expires or the cache is cleared, so readers
//! never observe a half-updated record.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default time-to-live for cached signals (20 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(20 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Concurrent map with per-entry expiry
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a live entry, dropping it if it has expired
    pub fn get(&self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries
                .remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
        }
        None
    }

    /// Store a value unless a live entry already exists. Returns the value now cached.
    pub fn insert(&self, key: K, value: V) -> V {
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().stored_at.elapsed() < self.ttl {
                    occupied.get().value.clone()
                } else {
                    occupied.insert(CacheEntry {
                        value: value.clone(),
                        stored_at: Instant::now(),
                    });
                    value
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    value: value.clone(),
                    stored_at: Instant::now(),
                });
                value
            }
        }
    }

    /// Drop one key regardless of age
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Reset hook for tests and operator-triggered flushes
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! In-memory response cache keyed by content hash, shared by every
//! network-bound provider so re-encoding or re-enriching identical text
//! never issues a second HTTP call within a process lifetime.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct CacheEntry<T> {
    value: T,
    cached_at: Instant,
}

/// A TTL'd cache from a text hash to a provider response. One instance is
/// shared across calls to the same provider; entries older than `ttl` are
/// treated as absent and recomputed.
pub struct ResponseCache<T: Clone> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.cached_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn insert(&self, key: String, value: T) {
        self.entries.insert(key, CacheEntry { value, cached_at: Instant::now() });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry older than `ttl`.
    pub fn evict_expired(&self) {
        self.entries.retain(|_, entry| entry.cached_at.elapsed() <= self.ttl);
    }
}

impl<T: Clone> Default for ResponseCache<T> {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

//! TTL-keyed store of previously computed forecast responses.
//!
//! Entries expire a fixed TTL after `set` and are evicted lazily: on the
//! next `get` that touches them, on `stats()`, or when the store hits its
//! size bound. `get` returns an independent clone so a caller stamping a
//! new request id cannot corrupt the stored entry.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use crate::api_types::ForecastResponse;

struct CacheEntry {
    response: ForecastResponse,
    expires_at: Instant,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Cache statistics, reported after purging expired entries.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub ttl_secs: u64,
    pub entries: usize,
}

/// In-memory TTL response cache.
///
/// Single-process only: no cross-process coherence is provided. Reads and
/// writes on distinct keys do not contend beyond DashMap shard granularity.
pub struct ForecastCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl ForecastCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Look up a cached response. Expired entries are evicted and reported
    /// as absent. The returned response is an independent copy.
    pub fn get(&self, key: &str) -> Option<ForecastResponse> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                tracing::debug!(cache_key = %key, "forecast cache hit");
                Some(entry.response.clone())
            }
            Some(entry) => {
                drop(entry);
                self.entries.remove(key);
                tracing::debug!(cache_key = %key, "forecast cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Store a response under the given key, replacing any previous entry.
    pub fn set(&self, key: &str, response: &ForecastResponse) {
        self.evict_if_needed();
        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                response: response.clone(),
                expires_at: now + self.ttl,
                inserted_at: now,
            },
        );
        tracing::debug!(
            cache_key = %key,
            ttl_secs = self.ttl.as_secs(),
            "forecast response cached"
        );
    }

    /// Drop every entry. Returns the number removed.
    pub fn clear(&self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    /// Purge expired entries, then report TTL and live entry count.
    pub fn stats(&self) -> CacheStats {
        self.purge_expired();
        CacheStats {
            ttl_secs: self.ttl.as_secs(),
            entries: self.entries.len(),
        }
    }

    fn purge_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    fn evict_if_needed(&self) {
        if self.entries.len() < self.max_entries {
            return;
        }

        // Expired entries go first; if that is not enough, drop the oldest
        // inserted entries until there is room for one more.
        self.purge_expired();
        let over = (self.entries.len() + 1).saturating_sub(self.max_entries);
        if over == 0 {
            return;
        }

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.inserted_at))
            .collect();
        by_age.sort_by_key(|(_, inserted_at)| *inserted_at);

        for (key, _) in by_age.into_iter().take(over) {
            self.entries.remove(&key);
        }
    }
}

//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, evictions and expirations.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads that returned a value
    pub hits: u64,
    /// Reads that returned nothing (absent or stale)
    pub misses: u64,
    /// Entries removed to satisfy max or max_size
    pub evictions: u64,
    /// Stale entries removed lazily or by a sweep
    pub expirations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current sum of entry sizes
    pub calculated_size: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }
}

//! Cache Entry Module
//!
//! Defines the node stored for every cached key, including the recency links
//! and the TTL bookkeeping used by the staleness checks.

use std::time::{Duration, Instant};

// == Slot Handle ==
/// Stable handle of an entry inside the list arena.
pub type SlotId = usize;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Links are arena handles rather than pointers: the arena owns every entry,
/// `next` runs from the MRU end towards the LRU end and `prev` is only used to
/// unlink a node in O(1).
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// The key, never changed after creation
    pub key: K,
    /// The stored value, replaced in place on update
    pub value: V,
    /// Last computed size of the value
    pub size: usize,
    /// Instant the TTL window started (insertion or last age refresh)
    pub start: Instant,
    /// Time to live, None = never expires
    pub ttl: Option<Duration>,
    /// Handle of the more recently used neighbour
    pub(crate) prev: Option<SlotId>,
    /// Handle of the less recently used neighbour
    pub(crate) next: Option<SlotId>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates an unlinked entry whose TTL window starts at `now`.
    pub fn new(key: K, value: V, size: usize, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            key,
            value,
            size,
            start: now,
            ttl,
            prev: None,
            next: None,
        }
    }

    // == Is Stale ==
    /// Checks whether the entry has outlived its TTL at `now`.
    ///
    /// An age exactly equal to the TTL is not stale yet; entries without a TTL
    /// are never stale.
    pub fn is_stale_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.start) > ttl,
            None => false,
        }
    }

    // == Remaining TTL ==
    /// Returns the time left before the entry goes stale, clamped at zero.
    pub fn remaining_ttl_at(&self, now: Instant) -> Option<Duration> {
        self.ttl
            .map(|ttl| ttl.saturating_sub(now.saturating_duration_since(self.start)))
    }

    // == Expires At ==
    /// Absolute expiration instant, None when the entry never expires.
    pub fn expires_at(&self) -> Option<Instant> {
        self.ttl.and_then(|ttl| self.start.checked_add(ttl))
    }

    /// Restarts the TTL window.
    pub fn refresh_age(&mut self, now: Instant) {
        self.start = now;
    }
}

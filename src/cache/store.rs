//! Cache Store Module
//!
//! Single-threaded cache engine: a hash index over an arena-backed recency
//! list, with count and size bounded eviction and lazy TTL expiration.

use std::borrow::Borrow;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::entry::{CacheEntry, SlotId};
use crate::cache::lru::LruList;
use crate::cache::options::{
    CacheConfig, CacheOptions, DisposeReason, GetOptions, HasOptions, SetOptions,
};
use crate::cache::stats::CacheStats;
use crate::error::ConfigError;

// == Clock ==
/// Monotonic clock that reuses its last reading for `resolution`.
#[derive(Debug)]
struct Clock {
    resolution: Duration,
    cached: Cell<Option<Instant>>,
}

impl Clock {
    fn new(resolution: Duration) -> Self {
        Self {
            resolution,
            cached: Cell::new(None),
        }
    }

    fn now(&self) -> Instant {
        let real = Instant::now();
        match self.cached.get() {
            Some(cached) if real.saturating_duration_since(cached) < self.resolution => cached,
            _ => {
                self.cached.set(Some(real));
                real
            }
        }
    }
}

// == Entry Info ==
/// Metadata of a live entry, read without touching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    /// Time left before the entry goes stale, None if it never expires
    pub remaining_ttl: Option<Duration>,
    /// Last computed size
    pub size: usize,
}

// == Cache Store ==
/// Cache engine with LRU eviction and TTL support.
///
/// Every entry is owned by the list arena; the index only maps keys to arena
/// handles, so each value exists exactly once.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key to arena handle
    index: HashMap<K, SlotId>,
    /// Entries in recency order
    list: LruList<K, V>,
    /// Sum of all entry sizes
    total_size: usize,
    stats: CacheStats,
    config: CacheConfig<K, V>,
    clock: Clock,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty store enforcing `config`.
    pub fn new(config: CacheConfig<K, V>) -> Self {
        Self {
            index: HashMap::new(),
            list: LruList::new(),
            total_size: 0,
            stats: CacheStats::new(),
            clock: Clock::new(config.ttl_resolution),
            config,
        }
    }

    /// Validates `options` and creates an empty store.
    pub fn from_options(options: CacheOptions<K, V>) -> Result<Self, ConfigError> {
        Ok(Self::new(options.build()?))
    }

    pub fn config(&self) -> &CacheConfig<K, V> {
        &self.config
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_with(key, GetOptions::default())
    }

    /// [`get`](Self::get) with per-call overrides.
    ///
    /// A stale entry is removed (reason `Expire`) unless
    /// `no_delete_on_stale_get` is set, and its value is only returned when
    /// `allow_stale` is set.
    pub fn get_with<Q>(&mut self, key: &Q, options: GetOptions) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };
        let now = self.clock.now();

        if self.is_stale(id, now) {
            let allow_stale = options.allow_stale.unwrap_or(self.config.allow_stale);
            let no_delete = options
                .no_delete_on_stale_get
                .unwrap_or(self.config.no_delete_on_stale_get);

            let value = if no_delete {
                self.list
                    .get(id)
                    .filter(|_| allow_stale)
                    .map(|entry| entry.value.clone())
            } else {
                self.expire(id, allow_stale)
            };

            match value {
                Some(_) => self.stats.record_hit(),
                None => self.stats.record_miss(),
            }
            return value;
        }

        let update_age = options
            .update_age_on_get
            .unwrap_or(self.config.update_age_on_get);
        if let Some(entry) = self.list.get_mut(id) {
            if update_age && entry.ttl.is_some() {
                entry.refresh_age(now);
            }
        }

        self.list.move_to_front(id);
        self.stats.record_hit();
        self.list.get(id).map(|entry| entry.value.clone())
    }

    // == Has ==
    /// Checks whether `key` holds a fresh entry, without changing recency.
    pub fn has<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.has_with(key, HasOptions::default())
    }

    /// [`has`](Self::has) with per-call overrides.
    pub fn has_with<Q>(&mut self, key: &Q, options: HasOptions) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        let now = self.clock.now();

        if self.is_stale(id, now) {
            if !self.config.no_delete_on_stale_get {
                self.expire(id, false);
            }
            return false;
        }

        let update_age = options
            .update_age_on_has
            .unwrap_or(self.config.update_age_on_has);
        if let Some(entry) = self.list.get_mut(id) {
            if update_age && entry.ttl.is_some() {
                entry.refresh_age(now);
            }
        }
        true
    }

    // == Peek ==
    /// Returns the stored value without promoting it, refreshing its age or
    /// removing it when stale.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores a value under the default TTL.
    pub fn set(&mut self, key: K, value: V) {
        self.set_with(key, value, SetOptions::default());
    }

    /// Stores a value, evicting least recently used entries as needed.
    ///
    /// Values larger than `max_entry_size` are dropped silently.
    pub fn set_with(&mut self, key: K, value: V, options: SetOptions) {
        if self.config.ttl_autopurge {
            self.purge_stale();
        }

        let size = self.config.size_of(&value, &key);
        if let Some(limit) = self.config.max_entry_size {
            if size > limit {
                trace!(size, limit, "rejected oversized entry");
                return;
            }
        }

        let now = self.clock.now();
        let ttl = match options.ttl {
            Some(ttl) if ttl.is_zero() => None,
            Some(ttl) => Some(ttl),
            None => self.config.ttl,
        };

        // Overwrite case
        if let Some(&id) = self.index.get(&key) {
            let no_update_ttl = options.no_update_ttl.unwrap_or(self.config.no_update_ttl);
            if let Some(entry) = self.list.get_mut(id) {
                self.total_size = self.total_size - entry.size + size;
                entry.value = value;
                entry.size = size;
                if !no_update_ttl || entry.ttl.is_none() {
                    entry.ttl = ttl;
                    entry.start = now;
                }
            }
            self.list.move_to_front(id);

            // A grown value can push the total past max_size
            if let Some(max_size) = self.config.max_size {
                while self.total_size > max_size && self.list.tail() != Some(id) {
                    if !self.evict_tail() {
                        break;
                    }
                }
            }
            return;
        }

        if let Some(max_size) = self.config.max_size {
            while self.total_size + size > max_size && !self.list.is_empty() {
                self.evict_tail();
            }
        }

        let id = self
            .list
            .push_front(CacheEntry::new(key.clone(), value, size, ttl, now));
        self.index.insert(key, id);
        self.total_size += size;

        if let Some(max) = self.config.max {
            if self.list.len() > max {
                self.evict_tail();
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns false if the key was absent.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        match self.detach(id) {
            Some(entry) => {
                self.config
                    .dispose(entry.value, entry.key, DisposeReason::Delete);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry, disposing each with reason `Delete`.
    pub fn clear(&mut self) {
        let drained = self.list.drain();
        self.index.clear();
        self.total_size = 0;

        for entry in drained {
            self.config
                .dispose(entry.value, entry.key, DisposeReason::Delete);
        }
    }

    // == Pop ==
    /// Removes and returns the least recently used entry.
    pub fn pop(&mut self) -> Option<(K, V)> {
        let tail = self.list.tail()?;
        let entry = self.detach(tail)?;
        self.stats.record_eviction();

        if self.config.dispose.is_some() {
            self.config.dispose(
                entry.value.clone(),
                entry.key.clone(),
                DisposeReason::Evict,
            );
        }
        Some((entry.key, entry.value))
    }

    // == Purge Stale ==
    /// Removes every stale entry. Returns the number removed.
    pub fn purge_stale(&mut self) -> usize {
        let now = self.clock.now();
        let victims: Vec<SlotId> = self
            .list
            .iter()
            .filter(|(_, entry)| entry.is_stale_at(now))
            .map(|(id, _)| id)
            .collect();

        let removed: Vec<CacheEntry<K, V>> =
            victims.into_iter().filter_map(|id| self.detach(id)).collect();
        let count = removed.len();

        if count > 0 {
            debug!(count, "purged stale entries");
        }
        for entry in removed {
            self.stats.record_expiration();
            self.config
                .dispose(entry.value, entry.key, DisposeReason::Expire);
        }
        count
    }

    // == Remaining TTL ==
    /// Time left before `key` goes stale, clamped at zero. None if the key is
    /// absent or never expires.
    pub fn remaining_ttl<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        let now = self.clock.now();
        self.list.get(id)?.remaining_ttl_at(now)
    }

    /// Remaining TTL and size of `key`, without touching it.
    pub fn entry_info<Q>(&self, key: &Q) -> Option<EntryInfo>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        let entry = self.list.get(id)?;
        Some(EntryInfo {
            remaining_ttl: entry.remaining_ttl_at(self.clock.now()),
            size: entry.size,
        })
    }

    // == Enumeration ==
    /// Visits entries from most to least recently used.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (_, entry) in self.list.iter() {
            f(&entry.key, &entry.value);
        }
    }

    /// Visits entries from most to least recently used, stopping at the first
    /// error returned by `f`.
    pub fn try_for_each<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&K, &V) -> Result<(), E>,
    {
        for (_, entry) in self.list.iter() {
            f(&entry.key, &entry.value)?;
        }
        Ok(())
    }

    /// Key/value pairs, most recently used first.
    pub fn entries(&self) -> Vec<(K, V)> {
        self.list
            .iter()
            .map(|(_, entry)| (entry.key.clone(), entry.value.clone()))
            .collect()
    }

    pub fn keys(&self) -> Vec<K> {
        self.list.iter().map(|(_, entry)| entry.key.clone()).collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.list
            .iter()
            .map(|(_, entry)| entry.value.clone())
            .collect()
    }

    /// Keys, least recently used first.
    pub fn rkeys(&self) -> Vec<K> {
        self.list
            .iter_rev()
            .map(|(_, entry)| entry.key.clone())
            .collect()
    }

    // == Introspection ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sum of the sizes of all entries.
    pub fn calculated_size(&self) -> usize {
        self.total_size
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.index.len();
        stats.calculated_size = self.total_size;
        stats
    }

    // == Internals ==
    fn is_stale(&self, id: SlotId, now: Instant) -> bool {
        self.list
            .get(id)
            .map_or(false, |entry| entry.is_stale_at(now))
    }

    /// Unlinks an entry from the list and index and releases its size.
    fn detach(&mut self, id: SlotId) -> Option<CacheEntry<K, V>> {
        let entry = self.list.remove(id)?;
        self.index.remove(&entry.key);
        self.total_size -= entry.size;
        Some(entry)
    }

    /// Removes a stale entry and disposes it, returning a copy of the value
    /// when `keep_value` is set.
    fn expire(&mut self, id: SlotId, keep_value: bool) -> Option<V> {
        let entry = self.detach(id)?;
        self.stats.record_expiration();
        let value = keep_value.then(|| entry.value.clone());
        self.config
            .dispose(entry.value, entry.key, DisposeReason::Expire);
        value
    }

    /// Evicts the least recently used entry. Returns false on an empty cache.
    fn evict_tail(&mut self) -> bool {
        let Some(tail) = self.list.tail() else {
            return false;
        };
        let Some(entry) = self.detach(tail) else {
            return false;
        };
        self.stats.record_eviction();
        debug!(size = entry.size, total_size = self.total_size, "evicted least recently used entry");
        self.config
            .dispose(entry.value, entry.key, DisposeReason::Evict);
        true
    }

    /// Panics if the index, the list and the size total disagree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let linked: Vec<(SlotId, &K)> = self.list.iter().map(|(id, e)| (id, &e.key)).collect();
        assert_eq!(linked.len(), self.index.len(), "index/list length mismatch");
        assert_eq!(linked.len(), self.list.len(), "list length counter mismatch");
        for (id, key) in &linked {
            assert_eq!(self.index.get(*key), Some(id), "index points elsewhere");
        }
        assert_eq!(
            self.list.iter_rev().count(),
            linked.len(),
            "backward links disagree with forward links"
        );
        let sum: usize = self.list.iter().map(|(_, e)| e.size).sum();
        assert_eq!(sum, self.total_size, "size accounting drifted");
    }
}

// == Dump ==
impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    /// Human-readable snapshot, most recently used entry first. The format is
    /// for diagnostics only.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "size: {}, max: {}, calculated_size: {}, max_size: {}",
            self.len(),
            display_limit(self.config.max),
            self.total_size,
            display_limit(self.config.max_size),
        );

        let now = self.clock.now();
        for (_, entry) in self.list.iter() {
            let ttl = match entry.remaining_ttl_at(now) {
                Some(remaining) => format!("{}ms", remaining.as_millis()),
                None => "none".to_string(),
            };
            let _ = writeln!(
                out,
                "  {:?} => {:?} (ttl: {}, size: {})",
                entry.key, entry.value, ttl, entry.size
            );
        }
        out
    }
}

fn display_limit(limit: Option<usize>) -> String {
    limit.map_or_else(|| "none".to_string(), |l| l.to_string())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread::sleep;

    type Log = Arc<Mutex<Vec<(String, u32, DisposeReason)>>>;

    fn store(max: usize) -> CacheStore<String, u32> {
        CacheStore::from_options(CacheOptions::new().max(max)).unwrap()
    }

    fn logged(options: CacheOptions<String, u32>) -> (CacheStore<String, u32>, Log) {
        let log: Log = Arc::default();
        let sink = log.clone();
        let store = CacheStore::from_options(options.dispose(move |v, k, reason| {
            sink.lock().unwrap().push((k, v, reason));
        }))
        .unwrap();
        (store, log)
    }

    #[test]
    fn test_store_new() {
        let store = store(10);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.calculated_size(), 0);
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(10);
        store.set("key1".to_string(), 1);

        assert_eq!(store.get("key1"), Some(1));
        assert_eq!(store.len(), 1);
        store.assert_consistent();
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(10);
        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_overwrite_keeps_single_entry() {
        let mut store = store(10);
        store.set("key1".to_string(), 1);
        store.set("key1".to_string(), 2);

        assert_eq!(store.get("key1"), Some(2));
        assert_eq!(store.len(), 1);
        store.assert_consistent();
    }

    #[test]
    fn test_store_lru_eviction() {
        let (mut store, log) = logged(CacheOptions::new().max(3));
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            store.set(key.to_string(), i as u32);
        }

        assert_eq!(store.len(), 3);
        assert_eq!(store.keys(), vec!["d", "c", "b"]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![("a".to_string(), 0, DisposeReason::Evict)]
        );
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = store(3);
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);
        store.set("c".to_string(), 3);

        store.get("a");
        store.set("d".to_string(), 4);

        assert_eq!(store.keys(), vec!["d", "a", "c"]);
        assert_eq!(store.peek("b"), None);
    }

    #[test]
    fn test_has_and_peek_do_not_promote() {
        let mut store = store(3);
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);

        assert!(store.has("a"));
        assert_eq!(store.peek("a"), Some(1));
        assert_eq!(store.keys(), vec!["b", "a"]);
        assert!(!store.has("zzz"));
    }

    #[test]
    fn test_delete() {
        let (mut store, log) = logged(CacheOptions::new().max(3));
        store.set("a".to_string(), 1);

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert!(store.is_empty());
        assert_eq!(
            *log.lock().unwrap(),
            vec![("a".to_string(), 1, DisposeReason::Delete)]
        );
        store.assert_consistent();
    }

    #[test]
    fn test_delete_absent_leaves_state_alone() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new()
                .max_size(100)
                .size_calculation(|v, _| *v as usize),
        )
        .unwrap();
        store.set("a".to_string(), 7);

        assert!(!store.delete("missing"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.calculated_size(), 7);
    }

    #[test]
    fn test_clear_disposes_everything() {
        let (mut store, log) = logged(CacheOptions::new().max(5));
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.calculated_size(), 0);
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|(_, _, r)| *r == DisposeReason::Delete));
        store.assert_consistent();
    }

    #[test]
    fn test_pop_returns_lru() {
        let (mut store, log) = logged(CacheOptions::new().max(5));
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);

        assert_eq!(store.pop(), Some(("a".to_string(), 1)));
        assert_eq!(store.pop(), Some(("b".to_string(), 2)));
        assert_eq!(store.pop(), None);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_size_eviction() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, String>::new()
                .max_size(10)
                .size_calculation(|v, _| v.len()),
        )
        .unwrap();
        store.set("a".to_string(), "xxxx".to_string());
        store.set("b".to_string(), "xxxx".to_string());
        store.set("c".to_string(), "xxxx".to_string());

        assert_eq!(store.keys(), vec!["c", "b"]);
        assert_eq!(store.calculated_size(), 8);
        store.assert_consistent();
    }

    #[test]
    fn test_oversized_entry_is_dropped() {
        let (mut store, log) = logged(
            CacheOptions::new()
                .max_size(10)
                .size_calculation(|v, _| *v as usize),
        );
        store.set("a".to_string(), 4);
        store.set("huge".to_string(), 11);

        assert_eq!(store.keys(), vec!["a"]);
        assert_eq!(store.calculated_size(), 4);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_explicit_max_entry_size() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new()
                .max(10)
                .max_entry_size(5)
                .size_calculation(|v, _| *v as usize),
        )
        .unwrap();
        store.set("ok".to_string(), 5);
        store.set("big".to_string(), 6);

        assert!(store.peek("ok").is_some());
        assert!(store.peek("big").is_none());
    }

    #[test]
    fn test_growing_update_evicts_by_size() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new()
                .max_size(10)
                .size_calculation(|v, _| *v as usize),
        )
        .unwrap();
        store.set("a".to_string(), 3);
        store.set("b".to_string(), 3);
        store.set("c".to_string(), 3);

        // c grows from 3 to 7: a and b no longer fit alongside it
        store.set("c".to_string(), 7);

        assert_eq!(store.keys(), vec!["c", "b"]);
        assert_eq!(store.calculated_size(), 10);
        store.assert_consistent();
    }

    #[test]
    fn test_update_moves_to_front() {
        let mut store = store(3);
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);
        store.set("a".to_string(), 10);

        assert_eq!(store.keys(), vec!["a", "b"]);
        assert_eq!(store.rkeys(), vec!["b", "a"]);
    }

    #[test]
    fn test_ttl_expiration_on_get() {
        let (mut store, log) = logged(CacheOptions::new().ttl(Duration::from_millis(50)));
        store.set("a".to_string(), 1);
        assert_eq!(store.get("a"), Some(1));

        sleep(Duration::from_millis(80));

        assert_eq!(store.get("a"), None);
        assert!(store.is_empty());
        assert_eq!(
            *log.lock().unwrap(),
            vec![("a".to_string(), 1, DisposeReason::Expire)]
        );
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_allow_stale_returns_value_once() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new()
                .ttl(Duration::from_millis(50))
                .allow_stale(true),
        )
        .unwrap();
        store.set("a".to_string(), 1);
        sleep(Duration::from_millis(80));

        assert_eq!(store.get("a"), Some(1));
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_per_call_get_overrides() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new().ttl(Duration::from_millis(50)),
        )
        .unwrap();
        store.set("a".to_string(), 1);
        sleep(Duration::from_millis(80));

        let keep = GetOptions::default()
            .allow_stale(true)
            .no_delete_on_stale_get(true);
        assert_eq!(store.get_with("a", keep), Some(1));
        assert_eq!(store.len(), 1);

        assert_eq!(store.get("a"), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_has_expires_stale_entry() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new().ttl(Duration::from_millis(50)),
        )
        .unwrap();
        store.set("a".to_string(), 1);
        sleep(Duration::from_millis(80));

        assert!(!store.has("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_peek_returns_stale_value_without_removing() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new().ttl(Duration::from_millis(50)),
        )
        .unwrap();
        store.set("a".to_string(), 1);
        sleep(Duration::from_millis(80));

        assert_eq!(store.peek("a"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_age_on_get() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new()
                .ttl(Duration::from_millis(300))
                .update_age_on_get(true),
        )
        .unwrap();
        store.set("a".to_string(), 1);

        sleep(Duration::from_millis(200));
        assert_eq!(store.get("a"), Some(1));
        sleep(Duration::from_millis(200));

        // 400ms since insertion but only 200ms since the refreshing read
        assert_eq!(store.get("a"), Some(1));
    }

    #[test]
    fn test_update_age_on_has() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new().ttl(Duration::from_millis(300)),
        )
        .unwrap();
        store.set("a".to_string(), 1);

        sleep(Duration::from_millis(200));
        assert!(store.has_with("a", HasOptions::default().update_age_on_has(true)));
        sleep(Duration::from_millis(200));

        assert!(store.has("a"));
    }

    #[test]
    fn test_no_update_ttl_keeps_original_window() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new()
                .max(10)
                .no_update_ttl(true),
        )
        .unwrap();
        store.set_with("a".to_string(), 1, SetOptions::default().ttl(Duration::from_secs(10)));
        store.set_with("a".to_string(), 2, SetOptions::default().ttl(Duration::from_secs(1000)));

        let remaining = store.remaining_ttl("a").unwrap();
        assert!(remaining <= Duration::from_secs(10));
        assert_eq!(store.peek("a"), Some(2));

        // An entry without TTL picks one up even with no_update_ttl
        store.set("b".to_string(), 1);
        assert_eq!(store.remaining_ttl("b"), None);
        store.set_with("b".to_string(), 2, SetOptions::default().ttl(Duration::from_secs(5)));
        assert!(store.remaining_ttl("b").is_some());
    }

    #[test]
    fn test_set_resets_ttl_by_default() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new().ttl(Duration::from_secs(10)),
        )
        .unwrap();
        store.set_with("a".to_string(), 1, SetOptions::default().ttl(Duration::from_secs(1)));
        store.set("a".to_string(), 2);

        assert!(store.remaining_ttl("a").unwrap() > Duration::from_secs(1));
    }

    #[test]
    fn test_zero_ttl_override_never_expires() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new().ttl(Duration::from_millis(10)),
        )
        .unwrap();
        store.set_with("a".to_string(), 1, SetOptions::default().ttl(Duration::ZERO));
        sleep(Duration::from_millis(30));

        assert_eq!(store.get("a"), Some(1));
        assert_eq!(store.remaining_ttl("a"), None);
    }

    #[test]
    fn test_remaining_ttl() {
        let mut store = store(10);
        store.set_with("a".to_string(), 1, SetOptions::default().ttl(Duration::from_secs(5)));
        store.set("b".to_string(), 2);

        let remaining = store.remaining_ttl("a").unwrap();
        assert!(remaining > Duration::ZERO && remaining <= Duration::from_secs(5));
        assert_eq!(store.remaining_ttl("b"), None);
        assert_eq!(store.remaining_ttl("missing"), None);
    }

    #[test]
    fn test_purge_stale() {
        let (mut store, log) = logged(CacheOptions::new().max(10));
        store.set_with("short".to_string(), 1, SetOptions::default().ttl(Duration::from_millis(30)));
        store.set_with("long".to_string(), 2, SetOptions::default().ttl(Duration::from_secs(60)));
        store.set("forever".to_string(), 3);

        sleep(Duration::from_millis(60));

        assert_eq!(store.purge_stale(), 1);
        assert_eq!(store.keys(), vec!["forever", "long"]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![("short".to_string(), 1, DisposeReason::Expire)]
        );
        assert_eq!(store.purge_stale(), 0);
        store.assert_consistent();
    }

    #[test]
    fn test_ttl_autopurge_sweeps_on_set() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, u32>::new()
                .ttl(Duration::from_millis(30))
                .ttl_autopurge(true)
                .no_delete_on_stale_get(true),
        )
        .unwrap();
        store.set("a".to_string(), 1);
        sleep(Duration::from_millis(60));

        store.set("b".to_string(), 2);

        assert_eq!(store.keys(), vec!["b"]);
    }

    #[test]
    fn test_try_for_each_propagates_error() {
        let mut store = store(5);
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);
        store.set("c".to_string(), 3);

        let mut seen = Vec::new();
        let result: Result<(), String> = store.try_for_each(|k, _| {
            if k == "b" {
                return Err(format!("stopped at {k}"));
            }
            seen.push(k.clone());
            Ok(())
        });

        assert_eq!(result, Err("stopped at b".to_string()));
        assert_eq!(seen, vec!["c"]);
        assert_eq!(store.len(), 3);
        store.assert_consistent();
    }

    #[test]
    fn test_enumeration_order() {
        let mut store = store(5);
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);
        store.set("c".to_string(), 3);
        store.get("a");

        assert_eq!(store.keys(), vec!["a", "c", "b"]);
        assert_eq!(store.values(), vec![1, 3, 2]);
        assert_eq!(
            store.entries(),
            vec![
                ("a".to_string(), 1),
                ("c".to_string(), 3),
                ("b".to_string(), 2)
            ]
        );

        let mut visited = Vec::new();
        store.for_each(|k, v| visited.push((k.clone(), *v)));
        assert_eq!(visited, store.entries());
    }

    #[test]
    fn test_entry_info() {
        let mut store = CacheStore::from_options(
            CacheOptions::<String, String>::new()
                .max_size(100)
                .size_calculation(|v, _| v.len()),
        )
        .unwrap();
        store.set("a".to_string(), "hello".to_string());

        let info = store.entry_info("a").unwrap();
        assert_eq!(info.size, 5);
        assert_eq!(info.remaining_ttl, None);
        assert!(store.entry_info("missing").is_none());
    }

    #[test]
    fn test_dump() {
        let mut store = store(3);
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);

        let dump = store.dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("size: 2"));
        assert!(lines[0].contains("max: 3"));
        assert!(lines[0].contains("max_size: none"));
        assert!(lines[1].contains("\"b\" => 2"));
        assert!(lines[2].contains("\"a\" => 1"));
        assert!(lines[2].contains("ttl: none"));
    }

    #[test]
    fn test_store_stats() {
        let mut store = store(10);
        store.set("key1".to_string(), 1);
        store.get("key1");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.calculated_size, 1);
    }

    #[test]
    fn test_clock_resolution_reuses_reading() {
        let clock = Clock::new(Duration::from_secs(60));
        let first = clock.now();
        sleep(Duration::from_millis(5));
        assert_eq!(clock.now(), first);

        let clock = Clock::new(Duration::ZERO);
        let first = clock.now();
        sleep(Duration::from_millis(5));
        assert!(clock.now() > first);
    }
}

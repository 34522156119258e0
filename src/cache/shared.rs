//! Shared Cache Module
//!
//! Thread-safe cache handle. Every operation runs under one exclusive lock per
//! instance, so callers never observe a half-applied update.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::options::{CacheConfig, CacheOptions, GetOptions, HasOptions, SetOptions};
use crate::cache::stats::CacheStats;
use crate::cache::store::{CacheStore, EntryInfo};
use crate::error::ConfigError;

// == LRU Cache ==
/// LRU cache with TTL expiration, safe to share between threads.
///
/// The lock is held while `dispose` and `size_calculation` run. Those
/// callbacks must not call back into the same cache or they will deadlock.
///
/// # Example
/// ```
/// use lru_ttl_cache::{CacheOptions, LruCache};
///
/// let cache = LruCache::with_options(CacheOptions::new().max(2)).unwrap();
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3);
///
/// assert_eq!(cache.get("a"), None);
/// assert_eq!(cache.keys(), vec!["c", "b"]);
/// ```
pub struct LruCache<K, V> {
    inner: Mutex<CacheStore<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    pub fn new(config: CacheConfig<K, V>) -> Self {
        Self {
            inner: Mutex::new(CacheStore::new(config)),
        }
    }

    /// Validates `options` and creates an empty cache.
    pub fn with_options(options: CacheOptions<K, V>) -> Result<Self, ConfigError> {
        Ok(Self::new(options.build()?))
    }

    // == Reads ==
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().get(key)
    }

    pub fn get_with<Q>(&self, key: &Q, options: GetOptions) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().get_with(key, options)
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().has(key)
    }

    pub fn has_with<Q>(&self, key: &Q, options: HasOptions) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().has_with(key, options)
    }

    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().peek(key)
    }

    pub fn remaining_ttl<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().remaining_ttl(key)
    }

    pub fn entry_info<Q>(&self, key: &Q) -> Option<EntryInfo>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().entry_info(key)
    }

    // == Writes ==
    pub fn set(&self, key: K, value: V) {
        self.inner.lock().set(key, value);
    }

    pub fn set_with(&self, key: K, value: V, options: SetOptions) {
        self.inner.lock().set_with(key, value, options);
    }

    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().delete(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn pop(&self) -> Option<(K, V)> {
        self.inner.lock().pop()
    }

    pub fn purge_stale(&self) -> usize {
        self.inner.lock().purge_stale()
    }

    // == Enumeration ==
    /// Visits entries from most to least recently used. `f` must not touch
    /// this cache.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        self.inner.lock().for_each(f);
    }

    /// Like [`for_each`](Self::for_each), aborting on the first error.
    pub fn try_for_each<E, F>(&self, f: F) -> Result<(), E>
    where
        F: FnMut(&K, &V) -> Result<(), E>,
    {
        self.inner.lock().try_for_each(f)
    }

    pub fn entries(&self) -> Vec<(K, V)> {
        self.inner.lock().entries()
    }

    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys()
    }

    pub fn values(&self) -> Vec<V> {
        self.inner.lock().values()
    }

    pub fn rkeys(&self) -> Vec<K> {
        self.inner.lock().rkeys()
    }

    // == Introspection ==
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn calculated_size(&self) -> usize {
        self.inner.lock().calculated_size()
    }

    pub fn max(&self) -> Option<usize> {
        self.inner.lock().config().max()
    }

    pub fn max_size(&self) -> Option<usize> {
        self.inner.lock().config().max_size()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    pub fn dump(&self) -> String {
        self.inner.lock().dump()
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.inner.lock();
        f.debug_struct("LruCache")
            .field("len", &store.len())
            .field("calculated_size", &store.calculated_size())
            .field("config", store.config())
            .finish()
    }
}

//! Cache Options Module
//!
//! Builder for the eviction and expiration policy, validated once into an
//! immutable [`CacheConfig`], plus the per-call override structs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

// == Callback Types ==
/// Computes the cost of a value. Must be deterministic.
pub type SizeCalculation<K, V> = Arc<dyn Fn(&V, &K) -> usize + Send + Sync>;

/// Invoked synchronously, with the cache lock held, whenever an entry leaves
/// the cache. Calling back into the same cache from here deadlocks.
pub type DisposeFn<K, V> = Arc<dyn Fn(V, K, DisposeReason) + Send + Sync>;

/// Default minimum interval between two clock reads used for staleness checks.
pub const DEFAULT_TTL_RESOLUTION: Duration = Duration::from_millis(1);

// == Dispose Reason ==
/// Why an entry was removed.
///
/// `Set` and `Fetch` are reserved; the engine only emits `Evict`, `Delete` and
/// `Expire`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisposeReason {
    Evict,
    Set,
    Delete,
    Expire,
    Fetch,
}

impl fmt::Display for DisposeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisposeReason::Evict => "evict",
            DisposeReason::Set => "set",
            DisposeReason::Delete => "delete",
            DisposeReason::Expire => "expire",
            DisposeReason::Fetch => "fetch",
        };
        f.write_str(name)
    }
}

// == Cache Options ==
/// Builder for [`CacheConfig`].
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lru_ttl_cache::CacheOptions;
///
/// let config = CacheOptions::<String, String>::new()
///     .max(500)
///     .ttl(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// assert_eq!(config.max(), Some(500));
/// ```
pub struct CacheOptions<K, V> {
    max: Option<usize>,
    max_size: Option<usize>,
    max_entry_size: Option<usize>,
    ttl: Option<Duration>,
    ttl_resolution: Duration,
    ttl_autopurge: bool,
    update_age_on_get: bool,
    update_age_on_has: bool,
    allow_stale: bool,
    no_delete_on_stale_get: bool,
    no_update_ttl: bool,
    size_calculation: Option<SizeCalculation<K, V>>,
    dispose: Option<DisposeFn<K, V>>,
}

impl<K, V> Default for CacheOptions<K, V> {
    fn default() -> Self {
        Self {
            max: None,
            max_size: None,
            max_entry_size: None,
            ttl: None,
            ttl_resolution: DEFAULT_TTL_RESOLUTION,
            ttl_autopurge: false,
            update_age_on_get: false,
            update_age_on_has: false,
            allow_stale: false,
            no_delete_on_stale_get: false,
            no_update_ttl: false,
            size_calculation: None,
            dispose: None,
        }
    }
}

impl<K, V> CacheOptions<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of entries.
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Maximum cumulative size of all entries.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Largest size a single entry may have. Defaults to `max_size`.
    pub fn max_entry_size(mut self, max_entry_size: usize) -> Self {
        self.max_entry_size = Some(max_entry_size);
        self
    }

    /// Default time to live for new entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttl_resolution(mut self, resolution: Duration) -> Self {
        self.ttl_resolution = resolution;
        self
    }

    /// Sweep stale entries before every `set`.
    pub fn ttl_autopurge(mut self, enabled: bool) -> Self {
        self.ttl_autopurge = enabled;
        self
    }

    pub fn update_age_on_get(mut self, enabled: bool) -> Self {
        self.update_age_on_get = enabled;
        self
    }

    pub fn update_age_on_has(mut self, enabled: bool) -> Self {
        self.update_age_on_has = enabled;
        self
    }

    pub fn allow_stale(mut self, enabled: bool) -> Self {
        self.allow_stale = enabled;
        self
    }

    pub fn no_delete_on_stale_get(mut self, enabled: bool) -> Self {
        self.no_delete_on_stale_get = enabled;
        self
    }

    pub fn no_update_ttl(mut self, enabled: bool) -> Self {
        self.no_update_ttl = enabled;
        self
    }

    pub fn size_calculation<F>(mut self, f: F) -> Self
    where
        F: Fn(&V, &K) -> usize + Send + Sync + 'static,
    {
        self.size_calculation = Some(Arc::new(f));
        self
    }

    pub fn dispose<F>(mut self, f: F) -> Self
    where
        F: Fn(V, K, DisposeReason) + Send + Sync + 'static,
    {
        self.dispose = Some(Arc::new(f));
        self
    }

    // == Build ==
    /// Validates the options into an immutable policy.
    ///
    /// At least one of `max`, `max_size` or `ttl` is required, and every
    /// supplied bound must be non-zero.
    pub fn build(self) -> Result<CacheConfig<K, V>, ConfigError> {
        if self.max.is_none() && self.max_size.is_none() && self.ttl.is_none() {
            return Err(ConfigError::NoConstraints);
        }
        if self.max == Some(0) {
            return Err(ConfigError::InvalidMax);
        }
        if self.max_size == Some(0) {
            return Err(ConfigError::InvalidMaxSize);
        }
        if self.ttl == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTtl);
        }
        if self.max_entry_size == Some(0) {
            return Err(ConfigError::InvalidMaxEntrySize);
        }

        Ok(CacheConfig {
            max: self.max,
            max_size: self.max_size,
            max_entry_size: self.max_entry_size.or(self.max_size),
            ttl: self.ttl,
            ttl_resolution: self.ttl_resolution,
            ttl_autopurge: self.ttl_autopurge,
            update_age_on_get: self.update_age_on_get,
            update_age_on_has: self.update_age_on_has,
            allow_stale: self.allow_stale,
            no_delete_on_stale_get: self.no_delete_on_stale_get,
            no_update_ttl: self.no_update_ttl,
            size_calculation: self.size_calculation,
            dispose: self.dispose,
        })
    }
}

// == Cache Config ==
/// Validated policy, captured by a cache at construction.
pub struct CacheConfig<K, V> {
    pub(crate) max: Option<usize>,
    pub(crate) max_size: Option<usize>,
    pub(crate) max_entry_size: Option<usize>,
    pub(crate) ttl: Option<Duration>,
    pub(crate) ttl_resolution: Duration,
    pub(crate) ttl_autopurge: bool,
    pub(crate) update_age_on_get: bool,
    pub(crate) update_age_on_has: bool,
    pub(crate) allow_stale: bool,
    pub(crate) no_delete_on_stale_get: bool,
    pub(crate) no_update_ttl: bool,
    pub(crate) size_calculation: Option<SizeCalculation<K, V>>,
    pub(crate) dispose: Option<DisposeFn<K, V>>,
}

impl<K, V> CacheConfig<K, V> {
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    pub fn max_entry_size(&self) -> Option<usize> {
        self.max_entry_size
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn ttl_resolution(&self) -> Duration {
        self.ttl_resolution
    }

    pub fn ttl_autopurge(&self) -> bool {
        self.ttl_autopurge
    }

    pub fn allow_stale(&self) -> bool {
        self.allow_stale
    }

    /// Size of a value under this policy; 1 when no size function is set.
    pub(crate) fn size_of(&self, value: &V, key: &K) -> usize {
        match &self.size_calculation {
            Some(f) => f(value, key),
            None => 1,
        }
    }

    pub(crate) fn dispose(&self, value: V, key: K, reason: DisposeReason) {
        if let Some(f) = &self.dispose {
            f(value, key, reason);
        }
    }
}

impl<K, V> Clone for CacheConfig<K, V> {
    fn clone(&self) -> Self {
        Self {
            max: self.max,
            max_size: self.max_size,
            max_entry_size: self.max_entry_size,
            ttl: self.ttl,
            ttl_resolution: self.ttl_resolution,
            ttl_autopurge: self.ttl_autopurge,
            update_age_on_get: self.update_age_on_get,
            update_age_on_has: self.update_age_on_has,
            allow_stale: self.allow_stale,
            no_delete_on_stale_get: self.no_delete_on_stale_get,
            no_update_ttl: self.no_update_ttl,
            size_calculation: self.size_calculation.clone(),
            dispose: self.dispose.clone(),
        }
    }
}

impl<K, V> fmt::Debug for CacheConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("max", &self.max)
            .field("max_size", &self.max_size)
            .field("max_entry_size", &self.max_entry_size)
            .field("ttl", &self.ttl)
            .field("ttl_resolution", &self.ttl_resolution)
            .field("ttl_autopurge", &self.ttl_autopurge)
            .field("update_age_on_get", &self.update_age_on_get)
            .field("update_age_on_has", &self.update_age_on_has)
            .field("allow_stale", &self.allow_stale)
            .field("no_delete_on_stale_get", &self.no_delete_on_stale_get)
            .field("no_update_ttl", &self.no_update_ttl)
            .field("size_calculation", &self.size_calculation.is_some())
            .field("dispose", &self.dispose.is_some())
            .finish()
    }
}

// == Per-call Overrides ==
/// Overrides for a single `get`. Unset fields fall back to the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    pub allow_stale: Option<bool>,
    pub update_age_on_get: Option<bool>,
    pub no_delete_on_stale_get: Option<bool>,
}

impl GetOptions {
    pub fn allow_stale(mut self, enabled: bool) -> Self {
        self.allow_stale = Some(enabled);
        self
    }

    pub fn update_age_on_get(mut self, enabled: bool) -> Self {
        self.update_age_on_get = Some(enabled);
        self
    }

    pub fn no_delete_on_stale_get(mut self, enabled: bool) -> Self {
        self.no_delete_on_stale_get = Some(enabled);
        self
    }
}

/// Overrides for a single `has`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasOptions {
    pub update_age_on_has: Option<bool>,
}

impl HasOptions {
    pub fn update_age_on_has(mut self, enabled: bool) -> Self {
        self.update_age_on_has = Some(enabled);
        self
    }
}

/// Overrides for a single `set`.
///
/// A zero `ttl` stores the entry without expiration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    pub ttl: Option<Duration>,
    pub no_update_ttl: Option<bool>,
}

impl SetOptions {
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn no_update_ttl(mut self, enabled: bool) -> Self {
        self.no_update_ttl = Some(enabled);
        self
    }
}

//! Cache Module
//!
//! In-memory LRU cache with TTL expiration and size-bounded eviction.

mod entry;
mod lru;
mod options;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, SlotId};
pub use lru::LruList;
pub use options::{
    CacheConfig, CacheOptions, DisposeFn, DisposeReason, GetOptions, HasOptions,
    SetOptions, SizeCalculation, DEFAULT_TTL_RESOLUTION,
};
pub use shared::LruCache;
pub use stats::CacheStats;
pub use store::{CacheStore, EntryInfo};

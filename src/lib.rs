//! LRU TTL Cache - An in-memory key-value cache
//!
//! Least-recently-used eviction bounded by entry count and cumulative size,
//! with lazy TTL expiration. Ships with a small HTTP front-end.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{
    CacheConfig, CacheOptions, CacheStats, DisposeReason, GetOptions, HasOptions, LruCache,
    SetOptions,
};
pub use config::Config;
pub use error::ConfigError;

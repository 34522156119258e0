//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::cache::{LruCache, SetOptions};
use crate::config::Config;
use crate::error::{ApiError, ConfigError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HasResponse, HealthResponse, KeysResponse,
    PopResponse, PurgeResponse, SetRequest, SetResponse, StatsResponse, TtlResponse,
};

/// The cache type served over HTTP.
pub type StringCache = LruCache<String, String>;

/// Application state shared across all handlers.
///
/// The cache serializes its own operations, so handlers share it through a
/// plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<StringCache>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: StringCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Builds the cache described by the configuration.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        let cache = LruCache::with_options(config.cache_options())?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair with an optional TTL in seconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let mut options = SetOptions::default();
    if let Some(ttl) = req.ttl {
        options = options.ttl(Duration::from_secs(ttl));
    }
    state.cache.set_with(req.key.clone(), req.value, options);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value and marks it most recently used.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for GET /peek/:key
///
/// Reads a value without touching its recency or age.
pub async fn peek_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.peek(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let exists = state.cache.has(&key);
    Json(HasResponse { key, exists })
}

/// Handler for GET /ttl/:key
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    let info = state
        .cache
        .entry_info(&key)
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    Ok(Json(TtlResponse {
        key,
        remaining_ms: info
            .remaining_ttl
            .map(|remaining| remaining.as_millis() as u64),
    }))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(ApiError::NotFound(key))
    }
}

/// Handler for POST /pop
///
/// Evicts the least recently used entry.
pub async fn pop_handler(State(state): State<AppState>) -> Json<PopResponse> {
    let (key, value) = match state.cache.pop() {
        Some((key, value)) => (Some(key), Some(value)),
        None => (None, None),
    };
    Json(PopResponse { key, value })
}

/// Handler for POST /purge
pub async fn purge_handler(State(state): State<AppState>) -> Json<PurgeResponse> {
    let removed = state.cache.purge_stale();
    debug!(removed, "purge requested");
    Json(PurgeResponse { removed })
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear();
    Json(ClearResponse::new())
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse {
        keys: state.cache.keys(),
    })
}

/// Handler for GET /dump
///
/// Plain-text diagnostic snapshot.
pub async fn dump_handler(State(state): State<AppState>) -> String {
    state.cache.dump()
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

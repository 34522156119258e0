//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for GET /get/:key and GET /peek/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for GET /has/:key
#[derive(Debug, Clone, Serialize)]
pub struct HasResponse {
    pub key: String,
    pub exists: bool,
}

/// Response body for GET /ttl/:key
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub key: String,
    /// Remaining time to live in milliseconds, null if the entry never expires
    pub remaining_ms: Option<u64>,
}

/// Response body for POST /pop
#[derive(Debug, Clone, Serialize)]
pub struct PopResponse {
    /// Evicted key, null on an empty cache
    pub key: Option<String>,
    pub value: Option<String>,
}

/// Response body for POST /purge
#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    /// Number of stale entries removed
    pub removed: usize,
}

/// Response body for POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for GET /keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    /// Keys from most to least recently used
    pub keys: Vec<String>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Number of stale entries removed
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Current sum of value sizes
    pub calculated_size: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            calculated_size: stats.calculated_size,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

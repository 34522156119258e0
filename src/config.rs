//! Configuration Module
//!
//! Handles loading the server configuration from environment variables and
//! turning it into a cache policy.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheOptions;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: Option<usize>,
    /// Maximum total value bytes the cache can hold
    pub max_size: Option<usize>,
    /// Default TTL in seconds, None = entries never expire by default
    pub default_ttl: Option<u64>,
    /// Sweep stale entries on every write
    pub ttl_autopurge: bool,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000, 0 disables)
    /// - `MAX_SIZE` - Maximum total value bytes (default: unset)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300, 0 disables)
    /// - `TTL_AUTOPURGE` - Sweep stale entries on write (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: match parse_var::<usize>("MAX_ENTRIES") {
                Some(0) => None,
                Some(max) => Some(max),
                None => defaults.max_entries,
            },
            max_size: parse_var::<usize>("MAX_SIZE").filter(|size| *size > 0),
            default_ttl: match parse_var::<u64>("DEFAULT_TTL") {
                Some(0) => None,
                Some(ttl) => Some(ttl),
                None => defaults.default_ttl,
            },
            ttl_autopurge: parse_var("TTL_AUTOPURGE").unwrap_or(defaults.ttl_autopurge),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Cache policy for the server: string values sized by their byte length.
    pub fn cache_options(&self) -> CacheOptions<String, String> {
        let mut options =
            CacheOptions::new().size_calculation(|value: &String, _key: &String| value.len());
        if let Some(max) = self.max_entries {
            options = options.max(max);
        }
        if let Some(max_size) = self.max_size {
            options = options.max_size(max_size);
        }
        if let Some(ttl) = self.default_ttl {
            options = options.ttl(Duration::from_secs(ttl));
        }
        options.ttl_autopurge(self.ttl_autopurge)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: Some(1000),
            max_size: None,
            default_ttl: Some(300),
            ttl_autopurge: false,
            server_port: 3000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /peek/:key` - Read a value without touching it
//! - `GET /has/:key` - Check whether a fresh entry exists
//! - `GET /ttl/:key` - Remaining time to live of an entry
//! - `DELETE /del/:key` - Delete a key
//! - `POST /pop` - Evict the least recently used entry
//! - `POST /purge` - Remove every stale entry
//! - `POST /clear` - Remove every entry
//! - `GET /keys` - Keys from most to least recently used
//! - `GET /dump` - Plain-text snapshot of the cache
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, dump_handler, get_handler, has_handler, health_handler,
    keys_handler, peek_handler, pop_handler, purge_handler, set_handler, stats_handler,
    ttl_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/peek/:key", get(peek_handler))
        .route("/has/:key", get(has_handler))
        .route("/ttl/:key", get(ttl_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/pop", post(pop_handler))
        .route("/purge", post(purge_handler))
        .route("/clear", post(clear_handler))
        .route("/keys", get(keys_handler))
        .route("/dump", get(dump_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

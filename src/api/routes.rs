//! API Routes
//!
//! Configures the Axum router with the cache administration endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, clear_pattern_handler, error_stats_handler, errors_handler, gc_handler,
    health_handler, invalidate_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache/stats` - Cache diagnostics
/// - `POST /cache/gc` - Force a GC sweep
/// - `DELETE /cache` - Clear the cache
/// - `DELETE /cache/keys/:key` - Invalidate one key
/// - `DELETE /cache/pattern/:pattern` - Invalidate keys containing a substring
/// - `GET /errors` - Recorded errors, optionally `?kind=`
/// - `GET /errors/stats` - Error counts
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", delete(clear_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/gc", post(gc_handler))
        .route("/cache/keys/:key", delete(invalidate_handler))
        .route("/cache/pattern/:pattern", delete(clear_pattern_handler))
        .route("/errors", get(errors_handler))
        .route("/errors/stats", get(error_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

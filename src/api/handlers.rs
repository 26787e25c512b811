//! API Handlers
//!
//! HTTP request handlers for the cache administration endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::{ApiCache, CacheStats, GcReport};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{ClearResponse, ErrorsQuery, HealthResponse, InvalidateResponse};
use crate::monitor::{ErrorEvent, ErrorLog, ErrorStats};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared API cache
    pub cache: ApiCache,
    /// Error log the fetch layer records into
    pub errors: Arc<ErrorLog>,
}

impl AppState {
    pub fn new(cache: ApiCache, errors: Arc<ErrorLog>) -> Self {
        Self { cache, errors }
    }

    /// Creates a new AppState from configuration with an isolated cache.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ApiCache::from_config(config), Arc::new(ErrorLog::default()))
    }
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// Handler for POST /cache/gc
///
/// Runs a forced GC sweep and reports what it removed.
pub async fn gc_handler(State(state): State<AppState>) -> Json<GcReport> {
    Json(state.cache.force_gc().await)
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.cache.clear().await;
    Json(ClearResponse::all(removed))
}

/// Handler for DELETE /cache/pattern/:pattern
pub async fn clear_pattern_handler(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> Result<Json<ClearResponse>> {
    if pattern.trim().is_empty() {
        return Err(CacheError::InvalidRequest(
            "Pattern cannot be empty".to_string(),
        ));
    }

    let removed = state.cache.clear_by_pattern(&pattern).await;
    Ok(Json(ClearResponse::pattern(&pattern, removed)))
}

/// Handler for DELETE /cache/keys/:key
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if state.cache.invalidate(&key).await {
        Ok(Json(InvalidateResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /errors
pub async fn errors_handler(
    State(state): State<AppState>,
    Query(query): Query<ErrorsQuery>,
) -> Json<Vec<ErrorEvent>> {
    Json(state.errors.errors(query.kind))
}

/// Handler for GET /errors/stats
pub async fn error_stats_handler(State(state): State<AppState>) -> Json<ErrorStats> {
    Json(state.errors.stats())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

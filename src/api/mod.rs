//! API Module
//!
//! HTTP handlers and routing for the cache administration API.
//!
//! # Endpoints
//! - `GET /cache/stats` - Cache diagnostics
//! - `POST /cache/gc` - Force a GC sweep
//! - `DELETE /cache` - Clear the cache
//! - `DELETE /cache/keys/:key` - Invalidate one key
//! - `DELETE /cache/pattern/:pattern` - Invalidate keys by substring
//! - `GET /errors`, `GET /errors/stats` - Recorded errors
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

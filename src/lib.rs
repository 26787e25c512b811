//! Portal Cache - client-side data layer for the ambassador portal
//!
//! API response cache with TTL freshness, memory accounting and garbage
//! collection, a cached-fetch state machine with stale-while-error
//! fallback, and pagination state with a debounced search input.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod models;
pub mod monitor;
pub mod pagination;
pub mod tasks;

pub use api::AppState;
pub use cache::{ApiCache, CacheClass};
pub use config::Config;
pub use fetch::CachedFetch;
pub use pagination::{PageSize, Pagination, PaginationOptions};
pub use tasks::GcScheduler;

//! Cache Module
//!
//! Provides the in-memory API response cache with TTL freshness, size
//! accounting and garbage collection.

mod class;
mod entry;
mod recency;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use class::CacheClass;
pub use entry::{estimate_size, try_estimate_size, CacheEntry, Payload};
pub use recency::WriteOrder;
pub use shared::ApiCache;
pub use stats::{CacheCounters, CacheStats, EntryStats};
pub use store::{CacheStore, CachedValue, GcReport};

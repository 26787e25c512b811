//! Cache Statistics Module
//!
//! Diagnostic snapshot of the cache plus running counters.

use serde::Serialize;

use crate::config::BYTES_PER_MB;

// == Cache Counters ==
/// Running counters kept by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    /// Fresh cache reads served without a fetch
    pub hits: u64,
    /// Reads that had to go to the network
    pub misses: u64,
    /// Fetch failures answered with stale data
    pub stale_served: u64,
    /// Entries evicted to get back under `max_entries`
    pub evictions: u64,
    /// Entries removed by the expired sweep
    pub expired_removed: u64,
}

impl CacheCounters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_stale_served(&mut self) {
        self.stale_served += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired_removed += count as u64;
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Entry Stats ==
/// Per-entry diagnostic row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryStats {
    pub key: String,
    pub age_seconds: u64,
    pub ttl_seconds: u64,
    pub size_mb: f64,
    pub is_expired: bool,
}

// == Cache Stats ==
/// Diagnostic view of the whole cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: usize,
    pub total_size_mb: f64,
    pub max_entries_limit: usize,
    pub max_memory_limit_mb: f64,
    pub counters: CacheCounters,
    pub hit_rate: f64,
    pub entries: Vec<EntryStats>,
}

/// Converts bytes to megabytes.
pub fn bytes_to_mb(bytes: usize) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

/// Integer seconds, rounded to nearest.
pub fn ms_to_seconds(ms: u64) -> u64 {
    ms.saturating_add(500) / 1000
}

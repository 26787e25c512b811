//! Cache Store Module
//!
//! Keyed store of time-boxed response snapshots with memory accounting and
//! a threshold-driven garbage collector.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::entry::{estimate_size, CacheEntry, Payload};
use crate::cache::recency::WriteOrder;
use crate::cache::stats::{bytes_to_mb, ms_to_seconds, CacheCounters, CacheStats, EntryStats};
use crate::clock::SharedClock;
use crate::config::GcLimits;

// == Cached Value ==
/// Typed view of a cache entry as seen by a reader at a given instant.
#[derive(Debug)]
pub struct CachedValue<T> {
    pub data: Arc<T>,
    pub timestamp: u64,
    pub ttl: u64,
    /// Whether the entry was within its TTL when read
    pub fresh: bool,
}

// == GC Report ==
/// Outcome of a garbage collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GcReport {
    /// Whether a sweep actually ran (forced or over threshold)
    pub triggered: bool,
    pub expired_removed: usize,
    pub evicted: usize,
    pub remaining_entries: usize,
    pub remaining_bytes: usize,
}

// == Cache Store ==
/// In-memory API response cache.
///
/// `total_size` always equals the sum of the live entries' `size`; every
/// insert and removal goes through `insert_entry` or `remove_entry`.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    order: WriteOrder,
    total_size: usize,
    limits: GcLimits,
    clock: SharedClock,
    counters: CacheCounters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store enforcing `limits`, timestamped by `clock`.
    pub fn new(limits: GcLimits, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            order: WriteOrder::new(),
            total_size: 0,
            limits,
            clock,
            counters: CacheCounters::default(),
        }
    }

    /// Current reading of the store's clock.
    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn limits(&self) -> GcLimits {
        self.limits
    }

    // == Get ==
    /// Returns the entry for `key` regardless of freshness.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Returns the entry for `key` as `T`, with its freshness at the current instant.
    ///
    /// An entry stored under a different payload type reads as absent.
    pub fn get_as<T: Send + Sync + 'static>(&self, key: &str) -> Option<CachedValue<T>> {
        let entry = self.entries.get(key)?;
        let data = entry.downcast::<T>()?;
        Some(CachedValue {
            data,
            timestamp: entry.timestamp,
            ttl: entry.ttl,
            fresh: entry.is_fresh_at(self.now()),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Put ==
    /// Stores `data` under `key` with a TTL in milliseconds, replacing any
    /// previous entry.
    pub fn put<T>(&mut self, key: impl Into<String>, data: T, ttl: u64)
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.put_shared(key, Arc::new(data), ttl);
    }

    /// Stores an already shared payload.
    pub fn put_shared<T>(&mut self, key: impl Into<String>, data: Arc<T>, ttl: u64)
    where
        T: Serialize + Send + Sync + 'static,
    {
        let key = key.into();
        let size = estimate_size(&*data);
        let payload: Payload = data;
        let entry = CacheEntry::new(payload, self.now(), ttl, size);

        debug!("Cache put {} ({} bytes, ttl {}ms)", key, size, ttl);
        self.insert_entry(key, entry);
    }

    // == Invalidate ==
    /// Removes the entry for `key`. Returns whether one was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Removes every entry whose key contains `pattern`. Returns the count removed.
    pub fn invalidate_by_pattern(&mut self, pattern: &str) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.contains(pattern))
            .cloned()
            .collect();

        for key in &matching {
            self.remove_entry(key);
        }

        debug!("Invalidated {} entries matching '{}'", matching.len(), pattern);
        matching.len()
    }

    // == Clear ==
    /// Removes all entries. Returns the count removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.total_size = 0;
        removed
    }

    /// Clears entries and counters.
    pub fn reset(&mut self) {
        self.clear();
        self.counters = CacheCounters::default();
    }

    // == Garbage Collection ==
    /// Returns true when either budget is above the force threshold.
    pub fn over_threshold(&self) -> bool {
        let threshold = self.limits.force_gc_threshold;
        let entry_budget = self.limits.max_entries as f64 * threshold;
        let memory_budget = self.limits.max_memory_bytes as f64 * threshold;

        self.entries.len() as f64 > entry_budget || self.total_size as f64 > memory_budget
    }

    /// Runs a GC pass when forced or over threshold.
    ///
    /// 1. Removes every entry whose age has reached its TTL.
    /// 2. If still above `max_entries`, evicts the oldest writes until the
    ///    count is back at the limit.
    pub fn run_gc(&mut self, force: bool) -> GcReport {
        if !force && !self.over_threshold() {
            return GcReport {
                triggered: false,
                expired_removed: 0,
                evicted: 0,
                remaining_entries: self.entries.len(),
                remaining_bytes: self.total_size,
            };
        }

        debug!(
            "GC start: {} entries, {:.2}MB (forced: {})",
            self.entries.len(),
            bytes_to_mb(self.total_size),
            force
        );

        let expired_removed = self.sweep_expired();
        let evicted = self.evict_oldest_over_limit();

        self.counters.record_expired(expired_removed);
        self.counters.record_evictions(evicted);

        if expired_removed > 0 || evicted > 0 {
            info!(
                "GC done: {} entries, {:.2}MB (removed {} expired, evicted {})",
                self.entries.len(),
                bytes_to_mb(self.total_size),
                expired_removed,
                evicted
            );
        }

        GcReport {
            triggered: true,
            expired_removed,
            evicted,
            remaining_entries: self.entries.len(),
            remaining_bytes: self.total_size,
        }
    }

    fn sweep_expired(&mut self) -> usize {
        let now = self.now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        expired.len()
    }

    fn evict_oldest_over_limit(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.limits.max_entries);
        if excess == 0 {
            return 0;
        }

        // Stable sort keeps write order among equal timestamps
        let mut candidates = self.order.oldest_first();
        candidates.sort_by_key(|key| self.entries.get(key).map_or(0, |e| e.timestamp));

        for key in candidates.iter().take(excess) {
            self.remove_entry(key);
        }
        excess
    }

    // == Bookkeeping ==
    fn insert_entry(&mut self, key: String, entry: CacheEntry) {
        self.total_size += entry.size;
        self.order.record_write(&key);
        if let Some(previous) = self.entries.insert(key, entry) {
            self.total_size -= previous.size;
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        self.total_size -= entry.size;
        Some(entry)
    }

    // == Counters ==
    pub fn record_hit(&mut self) {
        self.counters.record_hit();
    }

    pub fn record_miss(&mut self) {
        self.counters.record_miss();
    }

    pub fn record_stale_served(&mut self) {
        self.counters.record_stale_served();
    }

    pub fn counters(&self) -> CacheCounters {
        self.counters
    }

    // == Stats ==
    /// Returns the diagnostic view of the cache, entries sorted by key.
    pub fn stats(&self) -> CacheStats {
        let now = self.now();
        let mut entries: Vec<EntryStats> = self
            .entries
            .iter()
            .map(|(key, entry)| EntryStats {
                key: key.clone(),
                age_seconds: ms_to_seconds(entry.age_ms(now)),
                ttl_seconds: ms_to_seconds(entry.ttl),
                size_mb: bytes_to_mb(entry.size),
                is_expired: entry.is_expired_at(now),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            total_entries: self.entries.len(),
            total_size_bytes: self.total_size,
            total_size_mb: bytes_to_mb(self.total_size),
            max_entries_limit: self.limits.max_entries,
            max_memory_limit_mb: bytes_to_mb(self.limits.max_memory_bytes),
            counters: self.counters,
            hit_rate: self.counters.hit_rate(),
            entries,
        }
    }

    /// Running size total in bytes.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Sum of the live entries' sizes, recomputed.
    pub fn recomputed_size(&self) -> usize {
        self.entries.values().map(|entry| entry.size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

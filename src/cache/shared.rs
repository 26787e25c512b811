//! Shared cache service.
//!
//! Cloneable handle around a [`CacheStore`]. Each method takes the lock
//! once, so every call is a single atomic step with respect to other tasks.

use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::cache::stats::{CacheCounters, CacheStats};
use crate::cache::store::{CacheStore, CachedValue, GcReport};
use crate::clock::{SharedClock, SystemClock};
use crate::config::{Config, GcLimits, TtlTable};

static GLOBAL: OnceLock<ApiCache> = OnceLock::new();

/// Handle to a shared API cache.
#[derive(Debug, Clone)]
pub struct ApiCache {
    store: Arc<RwLock<CacheStore>>,
    clock: SharedClock,
    ttl: TtlTable,
}

impl ApiCache {
    /// Creates an isolated cache instance.
    pub fn new(limits: GcLimits, ttl: TtlTable, clock: SharedClock) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(limits, Arc::clone(&clock)))),
            clock,
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.gc_limits(), config.ttl, SystemClock::shared())
    }

    // == Process-wide Instance ==
    /// Initializes the process-wide cache from `config`.
    ///
    /// The first call wins; later calls return the existing instance.
    pub fn init(config: &Config) -> &'static ApiCache {
        GLOBAL.get_or_init(|| Self::from_config(config))
    }

    /// Returns the process-wide cache, initializing it with defaults if needed.
    pub fn global() -> &'static ApiCache {
        GLOBAL.get_or_init(|| Self::from_config(&Config::default()))
    }

    /// Drops every entry and counter.
    pub async fn reset(&self) {
        self.store.write().await.reset();
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn ttl_table(&self) -> TtlTable {
        self.ttl
    }

    // == Store Operations ==
    pub async fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<CachedValue<T>> {
        self.store.read().await.get_as::<T>(key)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.store.read().await.contains(key)
    }

    pub async fn put<T>(&self, key: impl Into<String>, data: T, ttl: u64)
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.store.write().await.put(key, data, ttl);
    }

    pub async fn put_shared<T>(&self, key: impl Into<String>, data: Arc<T>, ttl: u64)
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.store.write().await.put_shared(key, data, ttl);
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        self.store.write().await.invalidate(key)
    }

    pub async fn clear_by_pattern(&self, pattern: &str) -> usize {
        self.store.write().await.invalidate_by_pattern(pattern)
    }

    pub async fn clear(&self) -> usize {
        self.store.write().await.clear()
    }

    pub async fn run_gc(&self, force: bool) -> GcReport {
        self.store.write().await.run_gc(force)
    }

    pub async fn force_gc(&self) -> GcReport {
        self.run_gc(true).await
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn counters(&self) -> CacheCounters {
        self.store.read().await.counters()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub(crate) async fn record_hit(&self) {
        self.store.write().await.record_hit();
    }

    pub(crate) async fn record_miss(&self) {
        self.store.write().await.record_miss();
    }

    pub(crate) async fn record_stale_served(&self) {
        self.store.write().await.record_stale_served();
    }
}

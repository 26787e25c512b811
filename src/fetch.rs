//! Cached Fetch Module
//!
//! Serves a named resource from the API cache when fresh, otherwise calls
//! the network fetcher and repopulates the cache. A failed fetch falls back
//! to the last cached payload when there is one.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{ApiCache, CacheClass};
use crate::error::{CacheError, Result};
use crate::monitor::{ErrorKind, ErrorSink};

// == Fetch Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Where the current data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    /// Fresh from the fetcher
    Network,
    /// Cache entry within its TTL
    CacheFresh,
    /// Cache entry served because the fetcher failed
    CacheStale,
}

// == Fetch Snapshot ==
/// Observable state of a [`CachedFetch`].
#[derive(Debug)]
pub struct FetchSnapshot<T> {
    pub status: FetchStatus,
    pub data: Option<Arc<T>>,
    /// Message of the last failure, kept even when stale data was served
    pub error: Option<String>,
    /// Clock reading of the last successful network fetch
    pub last_fetch: Option<u64>,
    pub source: Option<FetchSource>,
}

impl<T> FetchSnapshot<T> {
    fn idle() -> Self {
        Self {
            status: FetchStatus::Idle,
            data: None,
            error: None,
            last_fetch: None,
            source: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn is_stale(&self) -> bool {
        self.source == Some(FetchSource::CacheStale)
    }
}

impl<T> Clone for FetchSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            last_fetch: self.last_fetch,
            source: self.source,
        }
    }
}

// == Cached Fetch ==
/// Cached fetch of one resource under one cache key.
///
/// Concurrent fetches of the same key are not de-duplicated; the last
/// completed fetch wins the cache slot.
pub struct CachedFetch<T, F> {
    cache: ApiCache,
    key: String,
    class: CacheClass,
    ttl: u64,
    fetcher: F,
    state: RwLock<FetchSnapshot<T>>,
    errors: Option<Arc<dyn ErrorSink>>,
}

impl<T, F, Fut> CachedFetch<T, F>
where
    T: Serialize + Send + Sync + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    /// Creates a fetch for `key`, with its TTL taken from the cache's table for `class`.
    pub fn new(cache: ApiCache, key: impl Into<String>, class: CacheClass, fetcher: F) -> Self {
        let ttl = cache.ttl_table().ttl_for(class);
        Self {
            cache,
            key: key.into(),
            class,
            ttl,
            fetcher,
            state: RwLock::new(FetchSnapshot::idle()),
            errors: None,
        }
    }

    /// Records fetch failures into `sink`.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.errors = Some(sink);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn class(&self) -> CacheClass {
        self.class
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    // == Fetch ==
    /// Returns cached data when fresh, otherwise fetches.
    pub async fn fetch(&self) -> Result<Arc<T>> {
        self.fetch_data(false).await
    }

    /// Fetches from the network regardless of cache freshness.
    pub async fn refresh(&self) -> Result<Arc<T>> {
        self.fetch_data(true).await
    }

    /// Drops the cached entry, then fetches from the network.
    pub async fn invalidate(&self) -> Result<Arc<T>> {
        self.cache.invalidate(&self.key).await;
        self.fetch_data(true).await
    }

    async fn fetch_data(&self, force: bool) -> Result<Arc<T>> {
        let cached = self.cache.get::<T>(&self.key).await;

        if !force {
            if let Some(hit) = cached.as_ref().filter(|c| c.fresh) {
                debug!("Cache hit for {}", self.key);
                self.cache.record_hit().await;
                self.update(|s| {
                    s.status = FetchStatus::Success;
                    s.data = Some(Arc::clone(&hit.data));
                    s.source = Some(FetchSource::CacheFresh);
                })
                .await;
                return Ok(Arc::clone(&hit.data));
            }
        }

        self.cache.record_miss().await;
        self.update(|s| {
            s.status = FetchStatus::Loading;
            s.error = None;
        })
        .await;

        debug!("Fetching {} from network", self.key);
        match (self.fetcher)().await {
            Ok(result) => {
                let data = Arc::new(result);
                self.cache
                    .put_shared(self.key.clone(), Arc::clone(&data), self.ttl)
                    .await;
                self.cache.run_gc(false).await;

                let fetched_at = self.cache.now();
                self.update(|s| {
                    s.status = FetchStatus::Success;
                    s.data = Some(Arc::clone(&data));
                    s.last_fetch = Some(fetched_at);
                    s.source = Some(FetchSource::Network);
                })
                .await;
                Ok(data)
            }
            Err(err) => {
                let failure = CacheError::fetch_failed(self.key.clone(), &err);
                let message = failure.to_string();
                if let Some(sink) = &self.errors {
                    sink.record(ErrorKind::Api, &message);
                }

                match cached {
                    Some(stale) => {
                        warn!("Fetch failed for {}, serving cached data: {:#}", self.key, err);
                        self.cache.record_stale_served().await;
                        self.update(|s| {
                            s.status = FetchStatus::Success;
                            s.data = Some(Arc::clone(&stale.data));
                            s.error = Some(message.clone());
                            s.source = Some(FetchSource::CacheStale);
                        })
                        .await;
                        Ok(stale.data)
                    }
                    None => {
                        warn!("Fetch failed for {} with nothing cached: {:#}", self.key, err);
                        self.update(|s| {
                            s.status = FetchStatus::Error;
                            s.error = Some(message.clone());
                        })
                        .await;
                        Err(failure)
                    }
                }
            }
        }
    }

    // == Observers ==
    pub async fn snapshot(&self) -> FetchSnapshot<T> {
        self.state.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading()
    }

    /// Whether the cache currently holds an entry for this key, fresh or not.
    pub async fn is_cached(&self) -> bool {
        self.cache.contains(&self.key).await
    }

    async fn update(&self, apply: impl FnOnce(&mut FetchSnapshot<T>)) {
        apply(&mut *self.state.write().await);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{GcLimits, TtlTable};
    use crate::monitor::ErrorLog;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn test_cache() -> (ApiCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ApiCache::new(GcLimits::default(), TtlTable::default(), clock.clone());
        (cache, clock)
    }

    /// Fetcher returning `[1, 2, 3]` and counting its calls, failing while `fail` is set.
    fn counting_fetcher(
        calls: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
    ) -> impl Fn() -> std::future::Ready<anyhow::Result<Vec<i32>>> {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if fail.load(Ordering::SeqCst) {
                std::future::ready(Err(anyhow::anyhow!("503 Service Unavailable")))
            } else {
                std::future::ready(Ok(vec![1, 2, 3]))
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_fetches_last_put_wins() {
        let (cache, _) = test_cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(tokio::sync::Notify::new());

        let slow = {
            let calls = calls.clone();
            let gate = gate.clone();
            CachedFetch::new(cache.clone(), "dashboard", CacheClass::Dashboard, move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    Ok::<_, anyhow::Error>("slow".to_string())
                }
            })
        };
        let quick = {
            let calls = calls.clone();
            CachedFetch::new(cache.clone(), "dashboard", CacheClass::Dashboard, move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, anyhow::Error>("quick".to_string()) }
            })
        };

        let (slow_result, quick_result) = tokio::join!(slow.fetch(), async {
            let result = quick.fetch().await;
            gate.notify_one();
            result
        });

        assert_eq!(*slow_result.unwrap(), "slow");
        assert_eq!(*quick_result.unwrap(), "quick");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let cached = cache.get::<String>("dashboard").await.unwrap();
        assert_eq!(*cached.data, "slow");
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let (cache, _) = test_cache();
        let fetch = CachedFetch::new(cache, "leads:p1", CacheClass::Leads, || async {
            Ok::<_, anyhow::Error>(1)
        });

        let snapshot = fetch.snapshot().await;
        assert_eq!(snapshot.status, FetchStatus::Idle);
        assert!(snapshot.data.is_none());
        assert!(!fetch.is_cached().await);
        assert_eq!(fetch.ttl(), 30_000);
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (cache, clock) = test_cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(false));
        let fetch = CachedFetch::new(
            cache.clone(),
            "leads:p1",
            CacheClass::Leads,
            counting_fetcher(calls.clone(), fail),
        );

        let first = fetch.fetch().await.unwrap();
        assert_eq!(*first, vec![1, 2, 3]);
        assert_eq!(fetch.snapshot().await.source, Some(FetchSource::Network));
        assert_eq!(fetch.snapshot().await.last_fetch, Some(0));

        clock.advance(10_000);
        let second = fetch.fetch().await.unwrap();
        assert_eq!(*second, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetch.snapshot().await.source, Some(FetchSource::CacheFresh));
        assert!(fetch.is_cached().await);

        let counters = cache.counters().await;
        assert_eq!(counters.hits, 1);
        assert_eq!(counters.misses, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_refetch() {
        let (cache, clock) = test_cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(false));

        cache.put("leads:p1", vec![1, 2, 3], 30_000).await;
        let fetch = CachedFetch::new(
            cache,
            "leads:p1",
            CacheClass::Leads,
            counting_fetcher(calls.clone(), fail),
        );

        fetch.fetch().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        clock.advance(31_000);
        fetch.fetch().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetch.snapshot().await.source, Some(FetchSource::Network));
    }

    #[tokio::test]
    async fn test_stale_served_on_failure() {
        let (cache, clock) = test_cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(false));
        let log = Arc::new(ErrorLog::default());
        let fetch = CachedFetch::new(
            cache.clone(),
            "commissions",
            CacheClass::Commissions,
            counting_fetcher(calls, fail.clone()),
        )
        .with_error_sink(log.clone());

        fetch.fetch().await.unwrap();
        clock.advance(120_000);
        fail.store(true, Ordering::SeqCst);

        let data = fetch.fetch().await.unwrap();
        assert_eq!(*data, vec![1, 2, 3]);

        let snapshot = fetch.snapshot().await;
        assert_eq!(snapshot.status, FetchStatus::Success);
        assert!(snapshot.is_stale());
        assert!(snapshot.error.unwrap().contains("503"));
        assert_eq!(snapshot.last_fetch, Some(0));

        assert_eq!(log.errors(Some(ErrorKind::Api)).len(), 1);
        assert_eq!(cache.counters().await.stale_served, 1);
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_error() {
        let (cache, _) = test_cache();
        let fetch = CachedFetch::new(cache, "dashboard", CacheClass::Dashboard, || async {
            Err::<Vec<i32>, _>(anyhow::anyhow!("network down"))
        });

        let result = fetch.fetch().await;
        assert!(matches!(result, Err(CacheError::FetchFailed { .. })));

        let snapshot = fetch.snapshot().await;
        assert_eq!(snapshot.status, FetchStatus::Error);
        assert!(snapshot.data.is_none());
        assert!(snapshot.error.unwrap().contains("network down"));
        assert!(!fetch.is_cached().await);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_fresh_cache() {
        let (cache, _) = test_cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(false));
        let fetch = CachedFetch::new(
            cache,
            "messages",
            CacheClass::Messages,
            counting_fetcher(calls.clone(), fail),
        );

        fetch.fetch().await.unwrap();
        fetch.refresh().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_has_no_stale_fallback() {
        let (cache, _) = test_cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(false));
        let fetch = CachedFetch::new(
            cache,
            "admin:users",
            CacheClass::Admin,
            counting_fetcher(calls.clone(), fail.clone()),
        );

        fetch.fetch().await.unwrap();
        fail.store(true, Ordering::SeqCst);

        let result = fetch.invalidate().await;
        assert!(result.is_err());
        assert!(!fetch.is_cached().await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loading_while_fetcher_pending() {
        let (cache, _) = test_cache();
        let (tx, rx) = tokio::sync::oneshot::channel::<i32>();
        let rx = tokio::sync::Mutex::new(Some(rx));
        let fetch = CachedFetch::new(cache, "dashboard", CacheClass::Dashboard, || async {
            let receiver = rx.lock().await.take();
            match receiver {
                Some(receiver) => receiver.await.map_err(anyhow::Error::from),
                None => Err(anyhow::anyhow!("already consumed")),
            }
        });

        let mut pending = tokio_test::task::spawn(fetch.fetch());
        tokio_test::assert_pending!(pending.poll());
        assert!(fetch.is_loading().await);

        tx.send(42).unwrap();
        let data = tokio_test::assert_ready!(pending.poll()).unwrap();
        assert_eq!(*data, 42);
        drop(pending);
        assert!(!fetch.is_loading().await);
    }
}

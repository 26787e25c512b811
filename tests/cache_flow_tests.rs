//! Integration Tests for the data flow
//!
//! Pagination produces query parameters, the cached fetch serves them
//! through the shared cache, and GC keeps the cache within budget.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use portal_cache::{
    cache::{ApiCache, CacheClass},
    clock::ManualClock,
    config::{GcLimits, TtlTable},
    error::CacheError,
    fetch::{CachedFetch, FetchSource, FetchStatus},
    monitor::{ErrorKind, ErrorLog},
    pagination::{PageSize, Pagination, PaginationOptions, QueryParams},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Lead {
    id: u32,
    name: String,
    status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct LeadPage {
    items: Vec<Lead>,
    total: u64,
}

/// Stand-in backend: serves pages of 45 leads and counts requests.
#[derive(Clone, Default)]
struct FakeBackend {
    requests: Arc<AtomicUsize>,
    down: Arc<AtomicBool>,
}

impl FakeBackend {
    async fn list_leads(&self, params: QueryParams) -> anyhow::Result<LeadPage> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!("502 Bad Gateway");
        }

        let total = 45u64;
        let start = (params.page - 1) * params.limit;
        let end = (start + params.limit).min(total as u32);
        let items = (start..end)
            .map(|id| Lead {
                id,
                name: format!("Prospect {}", id),
                status: "submitted".to_string(),
            })
            .collect();
        Ok(LeadPage { items, total })
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn test_cache(limits: GcLimits) -> (ApiCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let cache = ApiCache::new(limits, TtlTable::default(), clock.clone());
    (cache, clock)
}

#[tokio::test]
async fn test_leads_page_cached_then_refetched_after_ttl() {
    let (cache, clock) = test_cache(GcLimits::default());
    let backend = FakeBackend::default();
    let mut pagination = Pagination::new(PaginationOptions::default(), clock.clone());

    let params = pagination.query_params();
    let key = params.cache_key("leads");
    let fetch = {
        let backend = backend.clone();
        CachedFetch::new(cache.clone(), key, CacheClass::Leads, move || {
            let backend = backend.clone();
            let params = params.clone();
            async move { backend.list_leads(params).await }
        })
    };

    let page = fetch.fetch().await.unwrap();
    pagination.set_total(page.total);
    assert_eq!(page.items.len(), 20);
    assert_eq!(pagination.total_pages(), 3);
    assert!(fetch.is_cached().await);

    // Within the 30s leads TTL: served from cache
    clock.advance(10_000);
    fetch.fetch().await.unwrap();
    assert_eq!(backend.requests(), 1);
    assert_eq!(fetch.snapshot().await.source, Some(FetchSource::CacheFresh));

    // Past the TTL: a real fetch
    clock.advance(21_000);
    fetch.fetch().await.unwrap();
    assert_eq!(backend.requests(), 2);
    assert_eq!(fetch.snapshot().await.source, Some(FetchSource::Network));
}

#[tokio::test]
async fn test_each_page_gets_its_own_cache_entry() {
    let (cache, clock) = test_cache(GcLimits::default());
    let backend = FakeBackend::default();
    let mut pagination = Pagination::new(PaginationOptions::default(), clock.clone());

    for page in 1..=3 {
        pagination.set_page(page);
        let params = pagination.query_params();
        let backend = backend.clone();
        let fetch = CachedFetch::new(
            cache.clone(),
            params.cache_key("leads"),
            CacheClass::Leads,
            move || {
                let backend = backend.clone();
                let params = params.clone();
                async move { backend.list_leads(params).await }
            },
        );
        let data = fetch.fetch().await.unwrap();
        assert!(!data.items.is_empty());
    }

    assert_eq!(cache.len().await, 3);
    assert_eq!(backend.requests(), 3);

    // Changing the page size invalidates the page meaning and restarts at 1
    pagination.set_limit(PageSize::Fifty);
    assert_eq!(pagination.page(), 1);
    assert_eq!(pagination.query_params().limit, 50);
}

#[tokio::test]
async fn test_backend_outage_serves_stale_page() {
    let (cache, clock) = test_cache(GcLimits::default());
    let backend = FakeBackend::default();
    let errors = Arc::new(ErrorLog::default());
    let mut pagination = Pagination::new(PaginationOptions::default(), clock.clone());
    let params = pagination.query_params();

    let fetch = {
        let backend = backend.clone();
        CachedFetch::new(
            cache.clone(),
            params.cache_key("leads"),
            CacheClass::Leads,
            move || {
                let backend = backend.clone();
                let params = params.clone();
                async move { backend.list_leads(params).await }
            },
        )
        .with_error_sink(errors.clone())
    };

    let fresh = fetch.fetch().await.unwrap();
    backend.down.store(true, Ordering::SeqCst);
    clock.advance(60_000);

    let stale = fetch.fetch().await.unwrap();
    assert_eq!(stale, fresh);

    let snapshot = fetch.snapshot().await;
    assert_eq!(snapshot.status, FetchStatus::Success);
    assert!(snapshot.is_stale());
    assert!(snapshot.error.as_deref().unwrap().contains("502"));
    assert_eq!(errors.errors(Some(ErrorKind::Api)).len(), 1);

    // With the entry gone there is nothing to fall back on
    let result = fetch.invalidate().await;
    assert!(matches!(result, Err(CacheError::FetchFailed { .. })));
    assert_eq!(fetch.snapshot().await.status, FetchStatus::Error);
}

#[tokio::test]
async fn test_fetches_keep_cache_within_entry_budget() {
    let (cache, clock) = test_cache(GcLimits {
        max_entries: 10,
        max_memory_bytes: 20 * 1024 * 1024,
        force_gc_threshold: 0.8,
    });

    for i in 0..30u32 {
        let fetch = CachedFetch::new(
            cache.clone(),
            format!("admin:users:{}", i),
            CacheClass::Admin,
            move || async move { Ok::<_, anyhow::Error>(vec![i; 4]) },
        );
        fetch.fetch().await.unwrap();
        clock.advance(10);
        assert!(cache.len().await <= 10);
    }

    let stats = cache.stats().await;
    assert_eq!(stats.total_entries, 10);
    assert!(stats.counters.evictions >= 20);
    assert!(cache.contains("admin:users:29").await);
    assert!(!cache.contains("admin:users:0").await);
}

#[tokio::test]
async fn test_gc_scenario_sixty_entries() {
    let (cache, clock) = test_cache(GcLimits {
        max_entries: 50,
        max_memory_bytes: 20 * 1024 * 1024,
        force_gc_threshold: 0.8,
    });

    for i in 0..60 {
        cache.put(format!("dashboard:{}", i), i, 600_000).await;
        clock.advance(1);
    }

    let report = cache.force_gc().await;
    assert_eq!(report.evicted, 10);
    assert_eq!(cache.len().await, 50);
    for i in 0..10 {
        assert!(!cache.contains(&format!("dashboard:{}", i)).await);
    }
}

#[tokio::test]
async fn test_search_burst_produces_single_query() {
    let clock = Arc::new(ManualClock::new(0));
    let mut pagination = Pagination::new(PaginationOptions::default(), clock.clone());
    let mut seen_keys = Vec::new();

    for text in ["d", "du", "dup", "dupo", "dupon", "dupont"] {
        pagination.set_search(text);
        clock.advance(50);
        let key = pagination.query_params().cache_key("leads");
        if seen_keys.last() != Some(&key) {
            seen_keys.push(key);
        }
    }
    clock.advance(300);
    let key = pagination.query_params().cache_key("leads");
    if seen_keys.last() != Some(&key) {
        seen_keys.push(key);
    }

    assert_eq!(
        seen_keys,
        vec![
            "leads:page=1&limit=20".to_string(),
            "leads:page=1&limit=20&search=dupont".to_string(),
        ]
    );
}

use crate::cache::{CacheStats, RouteCache};
use crate::models::RouteResult;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Successfully routed results kept in process memory.
///
/// Entries expire after the TTL; beyond `max_entries` moka evicts the least
/// recently used route.
pub struct MemoryRouteCache {
    routes: Cache<String, Arc<RouteResult>>,
    lookups: Lookups,
}

#[derive(Default)]
struct Lookups {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Lookups {
    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn counts(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl MemoryRouteCache {
    pub fn new(ttl_seconds: u64, max_entries: u64) -> Self {
        MemoryRouteCache {
            routes: Cache::builder()
                .name("routes")
                .time_to_live(Duration::from_secs(ttl_seconds))
                .max_capacity(max_entries)
                .build(),
            lookups: Lookups::default(),
        }
    }
}

#[async_trait]
impl RouteCache for MemoryRouteCache {
    async fn get_cached_route(&self, key: &str) -> Option<RouteResult> {
        let cached = self.routes.get(key).await;
        self.lookups.record(cached.is_some());
        tracing::debug!(key = %key, hit = cached.is_some(), "Route cache lookup");
        cached.map(|route| RouteResult::clone(&route))
    }

    async fn cache_route(&self, key: &str, route: &RouteResult) {
        // Fallback geometry must never be served as a real route
        if !route.success {
            return;
        }
        self.routes
            .insert(key.to_string(), Arc::new(route.clone()))
            .await;
        tracing::debug!(key = %key, points = route.coordinates.len(), "Route cached");
    }

    async fn get_stats(&self) -> CacheStats {
        // Expired entries only leave entry_count once pending work runs
        self.routes.run_pending_tasks().await;
        let (hits, misses) = self.lookups.counts();
        CacheStats::new(hits, misses, self.routes.entry_count())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

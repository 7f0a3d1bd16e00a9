mod memory;

pub use memory::MemoryRouteCache;

use crate::constants::ROUTE_CACHE_KEY_PRECISION;
use crate::models::{GeoPoint, RouteResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Storage for successfully routed results, keyed by waypoint list.
#[async_trait]
pub trait RouteCache: Send + Sync {
    async fn get_cached_route(&self, key: &str) -> Option<RouteResult>;
    async fn cache_route(&self, key: &str, route: &RouteResult);
    async fn get_stats(&self) -> CacheStats;
    fn backend_name(&self) -> &'static str;
}

/// Generate a cache key for an ordered waypoint list.
/// Waypoints are rounded (~1 m) so GPS noise on the start point still hits.
pub fn route_cache_key(waypoints: &[GeoPoint]) -> String {
    let mut hasher = DefaultHasher::new();

    waypoints.len().hash(&mut hasher);
    for point in waypoints {
        let rounded = point.round(ROUTE_CACHE_KEY_PRECISION);
        let scale = 10_f64.powi(ROUTE_CACHE_KEY_PRECISION as i32);
        ((rounded.lat * scale).round() as i64).hash(&mut hasher);
        ((rounded.lng * scale).round() as i64).hash(&mut hasher);
    }

    format!("route:driving:{:x}", hasher.finish())
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entries: u64,
}

impl CacheStats {
    /// `hit_rate` is a percentage; zero before the first lookup.
    pub fn new(hits: u64, misses: u64, entries: u64) -> Self {
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 * 100.0 / lookups as f64
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_route_cache_key_consistency() {
        let waypoints = vec![p(32.40, 14.40), p(32.50, 14.50)];
        assert_eq!(route_cache_key(&waypoints), route_cache_key(&waypoints));
    }

    #[test]
    fn test_route_cache_key_ignores_sub_meter_noise() {
        let a = vec![p(32.400_001, 14.400_001), p(32.50, 14.50)];
        let b = vec![p(32.400_002, 14.400_002), p(32.50, 14.50)];
        assert_eq!(route_cache_key(&a), route_cache_key(&b));
    }

    #[test]
    fn test_route_cache_key_is_order_sensitive() {
        let a = vec![p(32.40, 14.40), p(32.50, 14.50)];
        let b = vec![p(32.50, 14.50), p(32.40, 14.40)];
        assert_ne!(route_cache_key(&a), route_cache_key(&b));
    }
}

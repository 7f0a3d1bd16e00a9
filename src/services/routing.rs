use crate::cache::{route_cache_key, RouteCache};
use crate::constants::{DEFAULT_ROUTING_BASE_URL, MAX_ROUTING_WAYPOINTS};
use crate::error::{AppError, Result};
use crate::models::{GeoPoint, LegSummary, RouteResult};
use crate::services::simplify::simplify;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A road-routing backend that turns ordered waypoints into road geometry.
#[async_trait]
pub trait DirectionsService: Send + Sync {
    async fn get_directions(&self, waypoints: &[GeoPoint]) -> Result<DirectionsResponse>;
    fn provider_name(&self) -> &'static str;
}

/// OSRM-compatible driving directions over HTTP.
#[derive(Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new() -> Self {
        OsrmClient {
            client: Client::new(),
            base_url: DEFAULT_ROUTING_BASE_URL.to_string(),
        }
    }

    pub fn with_config(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(OsrmClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Default for OsrmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectionsService for OsrmClient {
    /// Get driving directions through the waypoints, in order
    /// Returns the route with full geometry, distance, and duration
    async fn get_directions(&self, waypoints: &[GeoPoint]) -> Result<DirectionsResponse> {
        if waypoints.len() < 2 {
            return Err(AppError::InvalidRequest(
                "At least 2 waypoints required".to_string(),
            ));
        }

        if waypoints.len() > MAX_ROUTING_WAYPOINTS {
            return Err(AppError::InvalidRequest(format!(
                "Maximum {} waypoints allowed",
                MAX_ROUTING_WAYPOINTS
            )));
        }

        // Format coordinates as "lng,lat;lng,lat;..."
        let coordinates_str = waypoints
            .iter()
            .map(GeoPoint::to_lng_lat)
            .collect::<Vec<_>>()
            .join(";");

        let url = format!("{}/{}", self.base_url, coordinates_str);

        tracing::debug!(
            waypoints = waypoints.len(),
            "Routing request: {} waypoints",
            waypoints.len()
        );

        let response = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson"), ("steps", "false")])
            .send()
            .await
            .map_err(|e| AppError::Routing(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                waypoints = waypoints.len(),
                "Routing HTTP error {}: {}",
                status, error_text
            );
            return Err(AppError::Routing(format!("HTTP {}: {}", status, error_text)));
        }

        let directions: OsrmRouteApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Routing(format!("Failed to parse response: {}", e)))?;

        directions.into_directions()
    }

    fn provider_name(&self) -> &'static str {
        "osrm"
    }
}

/// Directions backend that is always unreachable. Used when the device is
/// offline so every route degrades to straight lines without a network call.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDirections;

#[async_trait]
impl DirectionsService for OfflineDirections {
    async fn get_directions(&self, _waypoints: &[GeoPoint]) -> Result<DirectionsResponse> {
        Err(AppError::Routing("Routing service unavailable (offline)".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "offline"
    }
}

// OSRM API response types

#[derive(Debug, Deserialize)]
struct OsrmRouteApiResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64, // meters
    duration: f64, // seconds
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>, // [lng, lat] pairs
}

impl OsrmRouteApiResponse {
    fn into_directions(self) -> Result<DirectionsResponse> {
        if self.code != "Ok" {
            let message = self.message.unwrap_or_else(|| self.code.clone());
            tracing::warn!(code = %self.code, "Routing service returned {}", message);
            return Err(AppError::Routing(format!("{}: {}", self.code, message)));
        }

        let Some(route) = self.routes.into_iter().next() else {
            tracing::warn!("Routing service returned 0 routes");
            return Err(AppError::Routing("No routes found".to_string()));
        };

        tracing::debug!(
            distance_km = %format!("{:.2}", route.distance / 1000.0),
            duration_min = %format!("{:.0}", route.duration / 60.0),
            path_points = route.geometry.coordinates.len(),
            "Routing response: {:.2}km, {:.0}min, {} path points",
            route.distance / 1000.0, route.duration / 60.0, route.geometry.coordinates.len()
        );

        Ok(DirectionsResponse {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            geometry: route.geometry.coordinates,
            legs: route
                .legs
                .into_iter()
                .map(|leg| LegSummary {
                    distance_meters: leg.distance,
                    duration_seconds: leg.duration,
                })
                .collect(),
        })
    }
}

/// Parse a raw OSRM JSON body. Exposed for replaying recorded responses.
pub fn parse_osrm_response(body: &str) -> Result<DirectionsResponse> {
    let parsed: OsrmRouteApiResponse = serde_json::from_str(body)?;
    parsed.into_directions()
}

// Our simplified response type

#[derive(Debug, Clone, Serialize)]
pub struct DirectionsResponse {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// GeoJSON coordinates as [lng, lat] pairs
    pub geometry: Vec<[f64; 2]>,
    pub legs: Vec<LegSummary>,
}

impl DirectionsResponse {
    /// Convert GeoJSON coordinates to points, dropping invalid pairs
    pub fn to_points(&self) -> Vec<GeoPoint> {
        self.geometry
            .iter()
            .filter_map(|coord| GeoPoint::new(coord[1], coord[0]).ok())
            .collect()
    }
}

/// Fetches road routes and never fails: unreachable services, bad statuses
/// and empty answers all degrade to the straight-line waypoints.
#[derive(Clone)]
pub struct RoutingClient {
    service: Arc<dyn DirectionsService>,
    cache: Option<Arc<dyn RouteCache>>,
    max_points: usize,
}

impl RoutingClient {
    pub fn new(service: Arc<dyn DirectionsService>, max_points: usize) -> Self {
        RoutingClient {
            service,
            cache: None,
            max_points,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn RouteCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.service.provider_name()
    }

    /// Route through `waypoints` in order. One attempt, no retries.
    pub async fn fetch_route(&self, waypoints: &[GeoPoint]) -> RouteResult {
        if waypoints.len() < 2 {
            return RouteResult::fallback(waypoints, "At least 2 waypoints required");
        }

        let cache_key = route_cache_key(waypoints);
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.get_cached_route(&cache_key).await {
                return cached;
            }
        }

        let directions = match self.service.get_directions(waypoints).await {
            Ok(directions) => directions,
            Err(e) => {
                tracing::warn!(
                    provider = self.service.provider_name(),
                    waypoints = waypoints.len(),
                    error = %e,
                    "Routing failed, falling back to straight lines"
                );
                return RouteResult::fallback(waypoints, e.to_string());
            }
        };

        let points = directions.to_points();
        if points.len() < 2 {
            tracing::warn!(
                provider = self.service.provider_name(),
                "Routing returned empty geometry, falling back to straight lines"
            );
            return RouteResult::fallback(waypoints, "Routing service returned no geometry");
        }

        let result = RouteResult::routed(
            simplify(&points, self.max_points),
            directions.distance_meters,
            directions.duration_seconds,
            directions.legs,
        );

        if let Some(ref cache) = self.cache {
            cache.cache_route(&cache_key, &result).await;
        }

        result
    }
}

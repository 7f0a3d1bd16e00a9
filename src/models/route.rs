use crate::models::GeoPoint;
use serde::{Deserialize, Serialize};

/// Outcome of one routing call.
///
/// `success == false` still carries drawable `coordinates`: the original
/// waypoints joined by straight lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteResult {
    pub coordinates: Vec<GeoPoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// Per-leg `(distance_m, duration_s)` as reported by the routing service
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legs: Vec<LegSummary>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LegSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RouteResult {
    pub fn routed(
        coordinates: Vec<GeoPoint>,
        distance_meters: f64,
        duration_seconds: f64,
        legs: Vec<LegSummary>,
    ) -> Self {
        RouteResult {
            coordinates,
            distance_meters,
            duration_seconds,
            legs,
            success: true,
            error: None,
        }
    }

    /// Straight-line passthrough of the requested waypoints.
    pub fn fallback(waypoints: &[GeoPoint], error: impl Into<String>) -> Self {
        RouteResult {
            coordinates: waypoints.to_vec(),
            distance_meters: 0.0,
            duration_seconds: 0.0,
            legs: Vec::new(),
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_minutes(&self) -> u32 {
        (self.duration_seconds / 60.0).round() as u32
    }
}

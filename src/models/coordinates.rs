use crate::constants::EARTH_RADIUS_M;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(format!("Non-finite coordinates: {}, {}", lat, lng));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                lat
            ));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                lng
            ));
        }
        Ok(GeoPoint { lat, lng })
    }

    /// Parse a `"lat,lng"` coordinate string as stored on inventory rows.
    ///
    /// Accepts comma, semicolon or whitespace separators. Returns `None` for
    /// anything that does not yield two finite in-range numbers.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|p| !p.is_empty());

        let lat: f64 = parts.next()?.parse().ok()?;
        let lng: f64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }

        GeoPoint::new(lat, lng).ok()
    }

    /// Calculate distance between two points using the Haversine formula
    /// Returns distance in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Round coordinates to specified decimal places for caching
    pub fn round(&self, decimal_places: u32) -> Self {
        let multiplier = 10_f64.powi(decimal_places as i32);
        GeoPoint {
            lat: (self.lat * multiplier).round() / multiplier,
            lng: (self.lng * multiplier).round() / multiplier,
        }
    }

    /// `lng,lat` pair as expected by OSRM-style routing URLs
    pub fn to_lng_lat(&self) -> String {
        format!("{},{}", self.lng, self.lat)
    }
}

impl From<GeoPoint> for ::geo::Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        ::geo::coord! { x: point.lng, y: point.lat }
    }
}

impl From<GeoPoint> for ::geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        ::geo::Point::new(point.lng, point.lat)
    }
}

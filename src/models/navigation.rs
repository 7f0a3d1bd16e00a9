use crate::models::{Billboard, GeoPoint};
use serde::{Deserialize, Serialize};

/// A billboard placed in a navigation plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationTarget {
    pub billboard: Billboard,
    pub position: GeoPoint,
    /// Leg length from the previous stop (or the start position)
    pub distance_from_previous_m: f64,
    pub estimated_duration_s: f64,
    pub instruction: String,
    /// Flips once, when the live position first comes within the arrival radius
    pub reached: bool,
}

impl NavigationTarget {
    /// Wrap a billboard with no leg data yet. Returns `None` for billboards
    /// without usable coordinates.
    pub fn from_billboard(billboard: &Billboard) -> Option<Self> {
        let position = billboard.position()?;
        Some(NavigationTarget {
            billboard: billboard.clone(),
            position,
            distance_from_previous_m: 0.0,
            estimated_duration_s: 0.0,
            instruction: String::new(),
            reached: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.billboard.id
    }
}

/// One device location fix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationFix {
    pub position: GeoPoint,
    /// Degrees clockwise from north
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Horizontal accuracy radius in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Unix epoch milliseconds
    #[serde(default)]
    pub timestamp_ms: i64,
}

impl LocationFix {
    pub fn at(position: GeoPoint) -> Self {
        LocationFix {
            position,
            heading: None,
            speed: None,
            accuracy: None,
            timestamp_ms: 0,
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// A recorded track element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
    /// Unix epoch milliseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl RoutePoint {
    pub fn position(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_requires_coordinates() {
        let ok = Billboard::new("1", "Ring Road", "32.5,14.5");
        let broken = Billboard::new("2", "Nowhere", "unknown");

        let target = NavigationTarget::from_billboard(&ok).unwrap();
        assert_eq!(target.id(), "1");
        assert_eq!(target.position.lat, 32.5);
        assert!(!target.reached);

        assert!(NavigationTarget::from_billboard(&broken).is_none());
    }

    #[test]
    fn test_fix_deserializes_without_optional_fields() {
        let fix: LocationFix =
            serde_json::from_str(r#"{"position":{"lat":32.5,"lng":14.5}}"#).unwrap();
        assert!(fix.heading.is_none());
        assert_eq!(fix.timestamp_ms, 0);
    }
}

use crate::models::GeoPoint;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Build a box from two opposite corners in any order.
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        BoundingBox {
            min_lat: a.lat.min(b.lat),
            max_lat: a.lat.max(b.lat),
            min_lng: a.lng.min(b.lng),
            max_lng: a.lng.max(b.lng),
        }
    }

    /// Compute a bounding box around a center point with a radius in meters.
    pub fn from_center_radius(center: &GeoPoint, radius_m: f64) -> Self {
        let lat_delta = radius_m / 111_000.0;
        let lng_delta = if center.lat.abs() > 85.0 {
            lat_delta
        } else {
            radius_m / (111_000.0 * center.lat.to_radians().cos())
        };

        BoundingBox {
            min_lat: center.lat - lat_delta,
            max_lat: center.lat + lat_delta,
            min_lng: center.lng - lng_delta,
            max_lng: center.lng + lng_delta,
        }
    }

    /// Smallest box enclosing every point, `None` for an empty slice.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox::from_corners(*first, *first);

        for point in &points[1..] {
            bbox.min_lat = bbox.min_lat.min(point.lat);
            bbox.max_lat = bbox.max_lat.max(point.lat);
            bbox.min_lng = bbox.min_lng.min(point.lng);
            bbox.max_lng = bbox.max_lng.max(point.lng);
        }

        Some(bbox)
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lng: (self.min_lng + self.max_lng) / 2.0,
        }
    }
}

//! Pure geospatial helpers: distances, bearings, direction buckets and
//! polygon containment. Everything here is stateless.

use crate::models::GeoPoint;
use geo::{Coord, Intersects, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Great-circle distance in meters. Symmetric, zero for identical points.
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    a.distance_to(b)
}

/// Total length of a polyline in meters
pub fn path_length(path: &[GeoPoint]) -> f64 {
    path.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Initial bearing from `from` to `to` in degrees [0, 360)
pub fn bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Map any angle into [0, 360)
fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Map any angle into (-180, 180]
fn signed_degrees(angle: f64) -> f64 {
    let a = normalize_degrees(angle);
    if a > 180.0 {
        a - 360.0
    } else {
        a
    }
}

/// Eight 45° compass octants, each centered on its nominal angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CompassDirection {
    const ORDER: [CompassDirection; 8] = [
        CompassDirection::North,
        CompassDirection::NorthEast,
        CompassDirection::East,
        CompassDirection::SouthEast,
        CompassDirection::South,
        CompassDirection::SouthWest,
        CompassDirection::West,
        CompassDirection::NorthWest,
    ];

    /// North covers [337.5, 22.5), NorthEast [22.5, 67.5), and so on.
    pub fn from_bearing(degrees: f64) -> Self {
        let index = ((normalize_degrees(degrees) + 22.5) / 45.0).floor() as usize % 8;
        Self::ORDER[index]
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            CompassDirection::North => "N",
            CompassDirection::NorthEast => "NE",
            CompassDirection::East => "E",
            CompassDirection::SouthEast => "SE",
            CompassDirection::South => "S",
            CompassDirection::SouthWest => "SW",
            CompassDirection::West => "W",
            CompassDirection::NorthWest => "NW",
        }
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompassDirection::North => "north",
            CompassDirection::NorthEast => "north-east",
            CompassDirection::East => "east",
            CompassDirection::SouthEast => "south-east",
            CompassDirection::South => "south",
            CompassDirection::SouthWest => "south-west",
            CompassDirection::West => "west",
            CompassDirection::NorthWest => "north-west",
        };
        write!(f, "{}", s)
    }
}

pub fn bearing_direction(from: &GeoPoint, to: &GeoPoint) -> CompassDirection {
    CompassDirection::from_bearing(bearing(from, to))
}

/// Where a target lies relative to the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeDirection {
    Ahead,
    Right,
    Left,
    Behind,
}

impl fmt::Display for RelativeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelativeDirection::Ahead => "ahead",
            RelativeDirection::Right => "to your right",
            RelativeDirection::Left => "to your left",
            RelativeDirection::Behind => "behind you",
        };
        write!(f, "{}", s)
    }
}

/// Bucket the target bearing, rotated by the current heading, into four
/// 90° quadrants. Boundaries: |angle| <= 45 is ahead, (45, 135] right,
/// [-135, -45) left, anything else behind.
pub fn relative_direction(current: &GeoPoint, target: &GeoPoint, heading: f64) -> RelativeDirection {
    let relative = signed_degrees(bearing(current, target) - heading);

    if relative.abs() <= 45.0 {
        RelativeDirection::Ahead
    } else if relative > 45.0 && relative <= 135.0 {
        RelativeDirection::Right
    } else if (-135.0..-45.0).contains(&relative) {
        RelativeDirection::Left
    } else {
        RelativeDirection::Behind
    }
}

/// Whether `point` lies inside the area drawn by `polygon` (lng as x, lat as
/// y). The ring is closed implicitly and may be non-convex; points on an
/// edge count as inside. Fewer than three vertices never contain anything.
pub fn point_in_polygon(point: &GeoPoint, polygon: &[GeoPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let ring: LineString<f64> = polygon.iter().map(|p| Coord::from(*p)).collect();
    Point::from(*point).intersects(&Polygon::new(ring, vec![]))
}

/// Turn categories for a change of heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
    SlightRight,
    Right,
    SharpRight,
    UTurn,
}

impl Turn {
    /// Classify a heading change in degrees (positive = clockwise / right).
    pub fn classify(delta: f64) -> Turn {
        let angle = signed_degrees(delta);
        let abs_angle = angle.abs();

        if abs_angle > 170.0 {
            Turn::UTurn
        } else if abs_angle > 120.0 {
            if angle > 0.0 { Turn::SharpRight } else { Turn::SharpLeft }
        } else if abs_angle > 60.0 {
            if angle > 0.0 { Turn::Right } else { Turn::Left }
        } else if abs_angle > 20.0 {
            if angle > 0.0 { Turn::SlightRight } else { Turn::SlightLeft }
        } else {
            Turn::Straight
        }
    }

    /// Turn needed to face `to` when currently heading `heading` at `from`.
    pub fn towards(from: &GeoPoint, to: &GeoPoint, heading: f64) -> Turn {
        Turn::classify(bearing(from, to) - heading)
    }

    pub fn text(&self) -> &'static str {
        match self {
            Turn::Straight => "Continue straight",
            Turn::SlightLeft => "Keep slightly left",
            Turn::Left => "Turn left",
            Turn::SharpLeft => "Turn sharp left",
            Turn::SlightRight => "Keep slightly right",
            Turn::Right => "Turn right",
            Turn::SharpRight => "Turn sharp right",
            Turn::UTurn => "Make a U-turn",
        }
    }
}

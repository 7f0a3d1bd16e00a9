use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Distance in meters
/// Display switches to kilometers from 1 km upward, the way drivers read it
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
pub struct DistanceMeters(pub f64);

impl DistanceMeters {
    pub fn new(meters: f64) -> Result<Self, String> {
        if meters < 0.0 {
            return Err("Distance cannot be negative".to_string());
        }
        if !meters.is_finite() {
            return Err("Distance must be a finite number".to_string());
        }
        Ok(DistanceMeters(meters))
    }

    pub fn as_meters(self) -> f64 {
        self.0
    }

    pub fn as_km(self) -> f64 {
        self.0 / 1000.0
    }
}

impl fmt::Display for DistanceMeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 1000.0 {
            write!(f, "{:.1} km", self.as_km())
        } else {
            // Sub-kilometer distances are rounded to 10 m steps
            write!(f, "{} m", ((self.0 / 10.0).round() as i64) * 10)
        }
    }
}

impl Add for DistanceMeters {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        DistanceMeters(self.0 + other.0)
    }
}

/// Travel time in seconds, displayed in whole minutes (minimum 1).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
pub struct DurationSeconds(pub f64);

impl DurationSeconds {
    pub fn minutes(self) -> u32 {
        (self.0 / 60.0).round().max(1.0) as u32
    }
}

impl fmt::Display for DurationSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.minutes();
        if minutes >= 60 {
            write!(f, "{} h {} min", minutes / 60, minutes % 60)
        } else {
            write!(f, "{} min", minutes)
        }
    }
}

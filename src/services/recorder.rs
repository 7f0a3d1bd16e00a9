use crate::models::{GeoPoint, RoutePoint};

/// Accumulates the live GPS track of one tracking session.
#[derive(Debug, Clone)]
pub struct RouteRecorder {
    min_movement_m: f64,
    track: Vec<RoutePoint>,
    total_distance_m: f64,
}

impl RouteRecorder {
    pub fn new(min_movement_m: f64) -> Self {
        RouteRecorder {
            min_movement_m,
            track: Vec::new(),
            total_distance_m: 0.0,
        }
    }

    /// Append a sample unless it is within `min_movement_m` of the last
    /// recorded point. Returns whether the sample was kept.
    pub fn add_sample(&mut self, position: GeoPoint, speed: Option<f64>, timestamp_ms: i64) -> bool {
        let moved = match self.track.last() {
            None => 0.0,
            Some(last) => {
                let moved = last.position().distance_to(&position);
                if moved < self.min_movement_m {
                    tracing::trace!(moved_m = moved, "Ignoring GPS jitter");
                    return false;
                }
                moved
            }
        };

        self.total_distance_m += moved;
        self.track.push(RoutePoint {
            lat: position.lat,
            lng: position.lng,
            timestamp: timestamp_ms,
            speed,
        });
        true
    }

    pub fn track(&self) -> &[RoutePoint] {
        &self.track
    }

    pub fn polyline(&self) -> Vec<GeoPoint> {
        self.track.iter().map(RoutePoint::position).collect()
    }

    pub fn total_distance_m(&self) -> f64 {
        self.total_distance_m
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    pub fn clear(&mut self) {
        self.track.clear();
        self.total_distance_m = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_always_recorded() {
        let mut recorder = RouteRecorder::new(5.0);
        assert!(recorder.add_sample(GeoPoint { lat: 32.0, lng: 13.0 }, None, 1));
        assert_eq!(recorder.track().len(), 1);
        assert_eq!(recorder.total_distance_m(), 0.0);
    }

    #[test]
    fn test_jitter_is_filtered() {
        let mut recorder = RouteRecorder::new(5.0);
        recorder.add_sample(GeoPoint { lat: 32.0, lng: 13.0 }, None, 1);
        // ~1.1 m north
        assert!(!recorder.add_sample(GeoPoint { lat: 32.00001, lng: 13.0 }, None, 2));
        // ~11 m north
        assert!(recorder.add_sample(GeoPoint { lat: 32.0001, lng: 13.0 }, Some(3.0), 3));

        assert_eq!(recorder.track().len(), 2);
        assert!((recorder.total_distance_m() - 11.1).abs() < 0.2);
        assert_eq!(recorder.track()[1].speed, Some(3.0));
    }

    #[test]
    fn test_distance_is_measured_from_last_accepted_point() {
        let mut recorder = RouteRecorder::new(5.0);
        recorder.add_sample(GeoPoint { lat: 32.0, lng: 13.0 }, None, 1);
        // 3 m steps: the second lands 6 m from the anchor, the third 3 m from it
        recorder.add_sample(GeoPoint { lat: 32.000027, lng: 13.0 }, None, 2);
        recorder.add_sample(GeoPoint { lat: 32.000054, lng: 13.0 }, None, 3);
        recorder.add_sample(GeoPoint { lat: 32.000081, lng: 13.0 }, None, 4);

        assert_eq!(recorder.track().len(), 2);
        assert_eq!(recorder.track()[1].timestamp, 3);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut recorder = RouteRecorder::new(5.0);
        recorder.add_sample(GeoPoint { lat: 32.0, lng: 13.0 }, None, 1);
        recorder.add_sample(GeoPoint { lat: 32.001, lng: 13.0 }, None, 2);
        recorder.clear();
        assert!(recorder.is_empty());
        assert_eq!(recorder.total_distance_m(), 0.0);
        assert!(recorder.polyline().is_empty());
    }
}

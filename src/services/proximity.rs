use crate::config::NavigationConfig;
use crate::constants::PROXIMITY_VIBRATION_PATTERN_MS;
use crate::geometry::{bearing_direction, relative_direction, CompassDirection, RelativeDirection};
use crate::models::{Billboard, DistanceMeters, GeoPoint, NavigationTarget};
use crate::services::alerts::AlertSink;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// A target inside the nearby radius, annotated for display.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NearbyBillboard {
    pub billboard_id: String,
    pub name: String,
    pub position: GeoPoint,
    pub distance_m: f64,
    pub direction: RelativeDirection,
    pub compass: CompassDirection,
    pub visited: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProximityUpdate {
    /// Ascending by distance, capped to the configured limit
    pub nearby: Vec<NearbyBillboard>,
    /// Targets that crossed the arrival radius for the first time this session
    pub newly_visited: Vec<Billboard>,
}

/// Per-session nearby/visited classification with one-shot alerts.
///
/// A billboard is announced at most once and vibrated at most once per
/// session, however often the user re-enters its radius. [`reset`] starts a
/// new session.
///
/// [`reset`]: ProximityTracker::reset
pub struct ProximityTracker {
    arrival_radius_m: f64,
    nearby_radius_m: f64,
    nearby_limit: usize,
    visited: HashSet<String>,
    announced: HashSet<String>,
    vibrated: HashSet<String>,
    sound_enabled: bool,
    alerts: Arc<dyn AlertSink>,
}

impl ProximityTracker {
    pub fn new(config: &NavigationConfig, alerts: Arc<dyn AlertSink>) -> Self {
        ProximityTracker {
            arrival_radius_m: config.arrival_radius_m,
            nearby_radius_m: config.nearby_radius_m,
            nearby_limit: config.nearby_limit,
            visited: HashSet::new(),
            announced: HashSet::new(),
            vibrated: HashSet::new(),
            sound_enabled: true,
            alerts,
        }
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn is_visited(&self, billboard_id: &str) -> bool {
        self.visited.contains(billboard_id)
    }

    /// Classify targets against the current position.
    ///
    /// `heading` is degrees clockwise from north; without one the map is
    /// assumed north-up.
    pub fn update(
        &mut self,
        position: &GeoPoint,
        heading: Option<f64>,
        targets: &[NavigationTarget],
    ) -> ProximityUpdate {
        let heading = heading.unwrap_or(0.0);
        let mut update = ProximityUpdate::default();

        for target in targets {
            let distance_m = position.distance_to(&target.position);
            if distance_m > self.nearby_radius_m {
                continue;
            }

            let direction = relative_direction(position, &target.position, heading);

            if distance_m <= self.arrival_radius_m {
                if self.visited.insert(target.id().to_string()) {
                    tracing::info!(
                        billboard_id = %target.id(),
                        distance_m = %format!("{:.0}", distance_m),
                        "Billboard visited"
                    );
                    update.newly_visited.push(target.billboard.clone());
                }
                self.alert(&target.billboard, distance_m, direction);
            }

            update.nearby.push(NearbyBillboard {
                billboard_id: target.id().to_string(),
                name: target.billboard.display_name().to_string(),
                position: target.position,
                distance_m,
                direction,
                compass: bearing_direction(position, &target.position),
                visited: self.visited.contains(target.id()),
            });
        }

        update
            .nearby
            .sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        update.nearby.truncate(self.nearby_limit);

        update
    }

    /// One-shot voice and haptic feedback, each deduplicated independently.
    fn alert(&mut self, billboard: &Billboard, distance_m: f64, direction: RelativeDirection) {
        if self.sound_enabled && self.announced.insert(billboard.id.clone()) {
            let text = format!(
                "{} is {} {}",
                billboard.display_name(),
                DistanceMeters(distance_m),
                direction
            );
            self.alerts.speak(&text);
        }

        if self.vibrated.insert(billboard.id.clone()) {
            self.alerts.vibrate(&PROXIMITY_VIBRATION_PATTERN_MS);
        }
    }

    /// Forget visits and alert guards so everything can fire again.
    pub fn reset(&mut self) {
        self.visited.clear();
        self.announced.clear();
        self.vibrated.clear();
    }
}

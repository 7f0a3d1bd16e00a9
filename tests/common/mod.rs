use async_trait::async_trait;
use billboard_nav::config::NavigationConfig;
use billboard_nav::error::{AppError, Result};
use billboard_nav::models::{Billboard, GeoPoint, LegSummary};
use billboard_nav::services::alerts::AlertSink;
use billboard_nav::services::navigation::NavigationEvent;
use billboard_nav::services::routing::{DirectionsResponse, DirectionsService, RoutingClient};
use billboard_nav::services::session::{MapObserver, TrackingSession};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a billboard at a position
#[allow(dead_code)]
pub fn billboard(id: &str, lat: f64, lng: f64) -> Billboard {
    Billboard::new(id, format!("Billboard {}", id), format!("{},{}", lat, lng))
}

#[allow(dead_code)]
pub fn point(lat: f64, lng: f64) -> GeoPoint {
    GeoPoint { lat, lng }
}

/// Two targets and a start point south-west of both
#[allow(dead_code)]
pub fn scenario_targets() -> (GeoPoint, Vec<Billboard>) {
    (
        point(32.40, 14.40),
        vec![billboard("far", 32.55, 14.55), billboard("near", 32.50, 14.50)],
    )
}

/// Spoken texts and vibration count
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingAlerts {
    pub spoken: Mutex<Vec<String>>,
    pub vibrations: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingAlerts {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn vibration_count(&self) -> usize {
        self.vibrations.load(Ordering::SeqCst)
    }
}

impl AlertSink for RecordingAlerts {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }

    fn vibrate(&self, _pattern_ms: &[u64]) {
        self.vibrations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything a session reported to the map
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingObserver {
    pub routes: Mutex<Vec<(Vec<GeoPoint>, usize)>>,
    pub locations: Mutex<Vec<GeoPoint>>,
    pub visited: Mutex<Vec<HashSet<String>>>,
    pub selected: Mutex<Vec<String>>,
    pub events: Mutex<Vec<NavigationEvent>>,
    pub advisories: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingObserver {
    pub fn last_route(&self) -> Option<(Vec<GeoPoint>, usize)> {
        self.routes.lock().unwrap().last().cloned()
    }

    pub fn arrivals(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, NavigationEvent::Arrived { .. }))
            .count()
    }
}

impl MapObserver for RecordingObserver {
    fn on_route_update(&self, coordinates: &[GeoPoint], current_index: usize) {
        self.routes
            .lock()
            .unwrap()
            .push((coordinates.to_vec(), current_index));
    }

    fn on_current_location_update(&self, position: &GeoPoint) {
        self.locations.lock().unwrap().push(*position);
    }

    fn on_visited_billboards_update(&self, visited: &HashSet<String>) {
        self.visited.lock().unwrap().push(visited.clone());
    }

    fn on_billboard_select(&self, billboard: &Billboard) {
        self.selected.lock().unwrap().push(billboard.id.clone());
    }

    fn on_navigation_event(&self, event: &NavigationEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn on_advisory(&self, message: &str) {
        self.advisories.lock().unwrap().push(message.to_string());
    }
}

/// Directions service that always fails like an unreachable network
#[allow(dead_code)]
#[derive(Default)]
pub struct FailingDirections {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DirectionsService for FailingDirections {
    async fn get_directions(&self, _waypoints: &[GeoPoint]) -> Result<DirectionsResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Routing("connection refused".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

/// Directions service returning a dense road geometry through the waypoints
#[allow(dead_code)]
pub struct DenseDirections {
    pub points_per_leg: usize,
}

#[async_trait]
impl DirectionsService for DenseDirections {
    async fn get_directions(&self, waypoints: &[GeoPoint]) -> Result<DirectionsResponse> {
        let mut geometry = Vec::new();
        let mut legs = Vec::new();

        for leg in waypoints.windows(2) {
            let (from, to) = (leg[0], leg[1]);
            for i in 0..self.points_per_leg {
                let t = i as f64 / self.points_per_leg as f64;
                geometry.push([
                    from.lng + (to.lng - from.lng) * t,
                    from.lat + (to.lat - from.lat) * t,
                ]);
            }
            let d = from.distance_to(&to) * 1.3;
            legs.push(LegSummary {
                distance_meters: d,
                duration_seconds: d / 10.0,
            });
        }
        if let Some(last) = waypoints.last() {
            geometry.push([last.lng, last.lat]);
        }

        Ok(DirectionsResponse {
            distance_meters: legs.iter().map(|l| l.distance_meters).sum(),
            duration_seconds: legs.iter().map(|l| l.duration_seconds).sum(),
            geometry,
            legs,
        })
    }

    fn provider_name(&self) -> &'static str {
        "dense"
    }
}

/// Session wired to the given routing service and recorders
#[allow(dead_code)]
pub fn session_with(
    directions: Arc<dyn DirectionsService>,
    alerts: Arc<RecordingAlerts>,
    observer: Arc<RecordingObserver>,
) -> TrackingSession {
    let config = NavigationConfig::default();
    let routing = RoutingClient::new(directions, config.route_max_points);
    TrackingSession::new(&config, routing, alerts, observer)
}

/// Check if we should skip tests that call the public routing service
#[allow(dead_code)]
pub fn should_skip_real_api_tests() -> bool {
    std::env::var("RUN_REAL_API_TESTS").is_err()
}

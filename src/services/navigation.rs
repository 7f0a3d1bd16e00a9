//! Multi-stop navigation planning and progress tracking.
//!
//! Stops are ordered with a greedy nearest-neighbor heuristic starting from
//! the user's position. This is a known approximation, not an optimal
//! tour: a stop skipped early can force a long detour at the end. The
//! output is deterministic for a given start and selection.

use crate::config::NavigationConfig;
use crate::constants::MIN_HEADING_MOVEMENT_M;
use crate::error::{AppError, Result};
use crate::geometry::{bearing, bearing_direction, Turn};
use crate::models::{
    Billboard, DistanceMeters, DurationSeconds, GeoPoint, LocationFix, NavigationTarget,
    RouteResult,
};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationState {
    Idle,
    Planning,
    Navigating,
    Completed,
    Cancelled,
}

impl NavigationState {
    /// Planning or navigating: the session still owns a plan.
    pub fn is_active(&self) -> bool {
        matches!(self, NavigationState::Planning | NavigationState::Navigating)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    Planned { targets: usize },
    Started,
    RouteUpdated { coordinates: Vec<GeoPoint>, current_index: usize },
    RouteAdvisory { message: String },
    Instruction { text: String },
    Arrived { index: usize, billboard_id: String, name: String },
    ActiveTargetChanged { index: usize },
    Completed,
    Cancelled,
}

/// Waypoints for one routing call, tagged with the plan generation that
/// issued it. Results from older generations are discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub generation: u64,
    pub waypoints: Vec<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub remaining_distance_m: f64,
    pub reached: usize,
    pub total: usize,
    pub current_index: usize,
    /// True once road distances replaced the straight-line estimates
    pub road_distances: bool,
}

/// Order billboards greedily: from the cursor, always go to the closest
/// remaining stop. Ties keep selection order. Billboards without usable
/// coordinates and repeated ids are dropped.
pub fn order_nearest_neighbor(start: Option<GeoPoint>, selection: &[Billboard]) -> Vec<NavigationTarget> {
    let mut seen = HashSet::new();
    let mut remaining: Vec<NavigationTarget> = selection
        .iter()
        .filter(|b| seen.insert(b.id.clone()))
        .filter_map(NavigationTarget::from_billboard)
        .collect();

    let Some(first) = remaining.first() else {
        return Vec::new();
    };
    let mut cursor = start.unwrap_or(first.position);
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for (i, candidate) in remaining.iter().enumerate() {
            let d = cursor.distance_to(&candidate.position);
            if d < best_distance {
                best_distance = d;
                best_index = i;
            }
        }

        let next = remaining.remove(best_index);
        cursor = next.position;
        ordered.push(next);
    }

    ordered
}

pub struct NavigationPlanner {
    config: NavigationConfig,
    state: NavigationState,
    start: Option<GeoPoint>,
    targets: Vec<NavigationTarget>,
    current_index: usize,
    route: Vec<GeoPoint>,
    route_generation: u64,
    road_distances: bool,
    advisory: Option<String>,
    last_position: Option<GeoPoint>,
    instruction: Option<String>,
}

impl NavigationPlanner {
    pub fn new(config: NavigationConfig) -> Self {
        NavigationPlanner {
            config,
            state: NavigationState::Idle,
            start: None,
            targets: Vec::new(),
            current_index: 0,
            route: Vec::new(),
            route_generation: 0,
            road_distances: false,
            advisory: None,
            last_position: None,
            instruction: None,
        }
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn targets(&self) -> &[NavigationTarget] {
        &self.targets
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_target(&self) -> Option<&NavigationTarget> {
        match self.state {
            NavigationState::Planning | NavigationState::Navigating => {
                self.targets.get(self.current_index)
            }
            _ => None,
        }
    }

    /// Polyline currently drawn for the plan (road or straight-line).
    pub fn route(&self) -> &[GeoPoint] {
        &self.route
    }

    /// Last non-blocking routing problem, if any
    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    pub fn start_position(&self) -> Option<GeoPoint> {
        self.start
    }

    /// Idle (or a finished session) to Planning.
    pub fn activate(
        &mut self,
        selection: &[Billboard],
        start: Option<GeoPoint>,
    ) -> Result<Vec<NavigationEvent>> {
        if self.state.is_active() {
            return self.update_plan(selection, start);
        }

        self.replan(selection, start)?;
        self.state = NavigationState::Planning;
        tracing::info!(
            targets = self.targets.len(),
            has_start = start.is_some(),
            "Navigation planned for {} billboards",
            self.targets.len()
        );

        Ok(vec![
            NavigationEvent::Planned {
                targets: self.targets.len(),
            },
            self.route_event(),
        ])
    }

    /// Recompute the ordering after the selection or the start changed.
    ///
    /// Progress (reached flags, active stop) starts over with the new plan.
    pub fn update_plan(
        &mut self,
        selection: &[Billboard],
        start: Option<GeoPoint>,
    ) -> Result<Vec<NavigationEvent>> {
        if !self.state.is_active() {
            return Err(AppError::InvalidRequest(
                "Navigation is not active".to_string(),
            ));
        }

        self.replan(selection, start)?;
        tracing::debug!(targets = self.targets.len(), "Navigation re-planned");

        Ok(vec![
            NavigationEvent::Planned {
                targets: self.targets.len(),
            },
            self.route_event(),
        ])
    }

    fn replan(&mut self, selection: &[Billboard], start: Option<GeoPoint>) -> Result<()> {
        let mut targets = order_nearest_neighbor(start, selection);
        if targets.is_empty() {
            return Err(AppError::InvalidRequest(
                "Select at least one billboard with a valid location".to_string(),
            ));
        }

        self.fill_straight_line_legs(&mut targets, start);

        self.start = start;
        self.targets = targets;
        self.current_index = 0;
        self.route = self.straight_line_route();
        // Any routing call still in flight belongs to the old plan
        self.route_generation += 1;
        self.road_distances = false;
        self.advisory = None;
        self.instruction = None;
        Ok(())
    }

    fn fill_straight_line_legs(&self, targets: &mut [NavigationTarget], start: Option<GeoPoint>) {
        let speed = self.config.average_speed_mps();
        let mut previous = start;

        for target in targets.iter_mut() {
            let distance = previous
                .map(|p| p.distance_to(&target.position))
                .unwrap_or(0.0);
            target.distance_from_previous_m = distance;
            target.estimated_duration_s = distance / speed;
            target.reached = false;
            target.instruction = leg_instruction(previous, target);
            previous = Some(target.position);
        }
    }

    fn straight_line_route(&self) -> Vec<GeoPoint> {
        self.start
            .into_iter()
            .chain(self.targets.iter().map(|t| t.position))
            .collect()
    }

    fn route_event(&self) -> NavigationEvent {
        NavigationEvent::RouteUpdated {
            coordinates: self.route.clone(),
            current_index: self.current_index,
        }
    }

    /// Waypoints to send to the routing service for the current plan.
    ///
    /// Each call starts a new generation, so only the newest request's
    /// answer is ever applied.
    pub fn route_request(&mut self) -> Option<RouteRequest> {
        if !self.state.is_active() {
            return None;
        }

        let waypoints = self.straight_line_route();
        if waypoints.len() < 2 {
            return None;
        }

        self.route_generation += 1;
        Some(RouteRequest {
            generation: self.route_generation,
            waypoints,
        })
    }

    /// Apply a routing answer. Stale generations and inactive plans are
    /// ignored. Failures keep the straight-line estimates and raise an
    /// advisory instead of blocking navigation.
    pub fn apply_route(&mut self, generation: u64, result: &RouteResult) -> Vec<NavigationEvent> {
        if generation != self.route_generation || !self.state.is_active() {
            tracing::debug!(
                generation = generation,
                current = self.route_generation,
                "Discarding stale route result"
            );
            return Vec::new();
        }

        let mut events = Vec::new();
        self.route = result.coordinates.clone();

        if result.success {
            self.apply_road_legs(result);
            self.road_distances = true;
            self.advisory = None;
        } else {
            let message = "Could not compute the optimal route, showing straight lines".to_string();
            tracing::warn!(
                error = ?result.error,
                "Keeping straight-line estimates"
            );
            self.advisory = Some(message.clone());
            events.push(NavigationEvent::RouteAdvisory { message });
        }

        events.push(self.route_event());
        events
    }

    fn apply_road_legs(&mut self, result: &RouteResult) {
        let n = self.targets.len();

        if result.legs.len() == n || (self.start.is_none() && result.legs.len() + 1 == n) {
            let offset = n - result.legs.len();
            for (target, leg) in self.targets[offset..].iter_mut().zip(&result.legs) {
                target.distance_from_previous_m = leg.distance_meters;
                target.estimated_duration_s = leg.duration_seconds;
            }
        } else {
            // No usable per-leg breakdown: spread the totals proportionally
            let straight: f64 = self.targets.iter().map(|t| t.distance_from_previous_m).sum();
            if straight > 0.0 {
                for target in &mut self.targets {
                    let share = target.distance_from_previous_m / straight;
                    target.distance_from_previous_m = result.distance_meters * share;
                    target.estimated_duration_s = result.duration_seconds * share;
                }
            }
        }

        let mut previous = self.start;
        for target in &mut self.targets {
            target.instruction = leg_instruction(previous, target);
            previous = Some(target.position);
        }
    }

    /// Planning to Navigating, once live tracking starts.
    pub fn start_navigation(&mut self) -> Result<Vec<NavigationEvent>> {
        match self.state {
            NavigationState::Planning => {
                self.state = NavigationState::Navigating;
                tracing::info!(targets = self.targets.len(), "Navigation started");
                Ok(vec![
                    NavigationEvent::Started,
                    NavigationEvent::ActiveTargetChanged {
                        index: self.current_index,
                    },
                ])
            }
            NavigationState::Navigating => Ok(Vec::new()),
            _ => Err(AppError::InvalidRequest(
                "Plan a route before starting navigation".to_string(),
            )),
        }
    }

    /// Advance the plan with one GPS fix.
    pub fn apply_fix(&mut self, fix: &LocationFix) -> Vec<NavigationEvent> {
        if self.state != NavigationState::Navigating {
            return Vec::new();
        }

        let position = fix.position;
        let heading = fix.heading.or_else(|| {
            self.last_position
                .filter(|last| last.distance_to(&position) >= MIN_HEADING_MOVEMENT_M)
                .map(|last| bearing(&last, &position))
        });
        self.last_position = Some(position);

        let Some(target) = self.targets.get_mut(self.current_index) else {
            return Vec::new();
        };

        let distance = position.distance_to(&target.position);
        let mut events = Vec::new();

        if distance <= self.config.arrival_radius_m {
            // A stop revisited after skipping back only advances the plan
            if !target.reached {
                target.reached = true;
                tracing::info!(
                    index = self.current_index,
                    billboard_id = %target.billboard.id,
                    distance_m = %format!("{:.0}", distance),
                    "Arrived at stop {}",
                    self.current_index + 1
                );
                events.push(NavigationEvent::Arrived {
                    index: self.current_index,
                    billboard_id: target.billboard.id.clone(),
                    name: target.billboard.display_name().to_string(),
                });
            }

            if self.current_index + 1 >= self.targets.len() {
                self.state = NavigationState::Completed;
                self.instruction = None;
                tracing::info!("Navigation completed");
                events.push(NavigationEvent::Completed);
            } else {
                self.current_index += 1;
                self.instruction = None;
                events.push(NavigationEvent::ActiveTargetChanged {
                    index: self.current_index,
                });
                events.push(self.route_event());
            }
            return events;
        }

        let text = live_instruction(&position, heading, target, distance);
        if self.instruction.as_deref() != Some(text.as_str()) {
            self.instruction = Some(text.clone());
            events.push(NavigationEvent::Instruction { text });
        }
        events
    }

    /// Make another stop the active one without re-planning.
    pub fn skip_to_target(&mut self, index: usize) -> Result<Vec<NavigationEvent>> {
        if !self.state.is_active() {
            return Err(AppError::InvalidRequest(
                "Navigation is not active".to_string(),
            ));
        }
        if index >= self.targets.len() {
            return Err(AppError::InvalidRequest(format!(
                "Stop {} does not exist ({} stops planned)",
                index + 1,
                self.targets.len()
            )));
        }

        self.current_index = index;
        self.instruction = None;
        tracing::debug!(index = index, "Active stop changed manually");
        Ok(vec![
            NavigationEvent::ActiveTargetChanged { index },
            self.route_event(),
        ])
    }

    /// Close navigation and drop the plan. Idempotent.
    pub fn cancel(&mut self) -> Vec<NavigationEvent> {
        if !self.state.is_active() {
            return Vec::new();
        }

        self.state = NavigationState::Cancelled;
        self.targets.clear();
        self.route.clear();
        self.current_index = 0;
        self.route_generation += 1;
        self.instruction = None;
        self.last_position = None;
        tracing::info!("Navigation cancelled");
        vec![NavigationEvent::Cancelled]
    }

    pub fn summary(&self) -> RouteSummary {
        let total_distance_m = self.targets.iter().map(|t| t.distance_from_previous_m).sum();
        let total_duration_s = self.targets.iter().map(|t| t.estimated_duration_s).sum();
        let remaining_distance_m = self
            .targets
            .iter()
            .skip(self.current_index)
            .filter(|t| !t.reached)
            .map(|t| t.distance_from_previous_m)
            .sum();

        RouteSummary {
            total_distance_m,
            total_duration_s,
            remaining_distance_m,
            reached: self.targets.iter().filter(|t| t.reached).count(),
            total: self.targets.len(),
            current_index: self.current_index,
            road_distances: self.road_distances,
        }
    }

    /// Straight-line distance still to cover from `position`: to the active
    /// stop, then along the remaining legs.
    pub fn remaining_distance_from(&self, position: &GeoPoint) -> f64 {
        let Some(current) = self.current_target() else {
            return 0.0;
        };

        let mut total = position.distance_to(&current.position);
        let mut previous = current.position;
        for target in self.targets.iter().skip(self.current_index + 1) {
            total += previous.distance_to(&target.position);
            previous = target.position;
        }
        total
    }
}

fn leg_instruction(previous: Option<GeoPoint>, target: &NavigationTarget) -> String {
    let name = target.billboard.display_name();
    match previous {
        None => format!("Start at {}", name),
        Some(from) => format!(
            "Head {} for {} to {} (about {})",
            bearing_direction(&from, &target.position),
            DistanceMeters(target.distance_from_previous_m),
            name,
            DurationSeconds(target.estimated_duration_s)
        ),
    }
}

fn live_instruction(
    position: &GeoPoint,
    heading: Option<f64>,
    target: &NavigationTarget,
    distance: f64,
) -> String {
    let name = target.billboard.display_name();
    match heading {
        Some(h) => format!(
            "{}, {} to {}",
            Turn::towards(position, &target.position, h).text(),
            DistanceMeters(distance),
            name
        ),
        None => format!(
            "Head {}, {} to {}",
            bearing_direction(position, &target.position),
            DistanceMeters(distance),
            name
        ),
    }
}

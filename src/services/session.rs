//! Live tracking session: wires GPS fixes into proximity detection, track
//! recording and navigation progress, and reports changes to a
//! [`MapObserver`] instead of any global event channel.

use crate::config::NavigationConfig;
use crate::constants::MIN_HEADING_MOVEMENT_M;
use crate::error::{AppError, GeolocationError, Result};
use crate::geometry::bearing;
use crate::models::{Billboard, GeoPoint, LocationFix, NavigationTarget};
use crate::services::alerts::AlertSink;
use crate::services::geolocation::{FixStream, GeolocationProvider};
use crate::services::navigation::{NavigationEvent, NavigationPlanner, NavigationState, RouteSummary};
use crate::services::proximity::{NearbyBillboard, ProximityTracker};
use crate::services::recorder::RouteRecorder;
use crate::services::routing::RoutingClient;
use crate::services::share::SharePayload;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

/// Callbacks toward the rendering layer. All methods default to no-ops.
pub trait MapObserver: Send + Sync {
    fn on_route_update(&self, _coordinates: &[GeoPoint], _current_index: usize) {}
    fn on_current_location_update(&self, _position: &GeoPoint) {}
    fn on_visited_billboards_update(&self, _visited: &HashSet<String>) {}
    fn on_billboard_select(&self, _billboard: &Billboard) {}
    fn on_navigation_event(&self, _event: &NavigationEvent) {}
    fn on_advisory(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MapObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    RouteUpdate {
        coordinates: Vec<GeoPoint>,
        current_index: usize,
    },
    CurrentLocation(GeoPoint),
    VisitedBillboards(Vec<String>),
    BillboardSelect(Billboard),
    Navigation(NavigationEvent),
    Advisory(String),
}

/// Forwards every callback as a [`MapEvent`] over an unbounded channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<MapEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MapEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelObserver { tx }, rx)
    }

    fn send(&self, event: MapEvent) {
        // Receiver gone means the map was torn down
        let _ = self.tx.send(event);
    }
}

impl MapObserver for ChannelObserver {
    fn on_route_update(&self, coordinates: &[GeoPoint], current_index: usize) {
        self.send(MapEvent::RouteUpdate {
            coordinates: coordinates.to_vec(),
            current_index,
        });
    }

    fn on_current_location_update(&self, position: &GeoPoint) {
        self.send(MapEvent::CurrentLocation(*position));
    }

    fn on_visited_billboards_update(&self, visited: &HashSet<String>) {
        let mut ids: Vec<String> = visited.iter().cloned().collect();
        ids.sort();
        self.send(MapEvent::VisitedBillboards(ids));
    }

    fn on_billboard_select(&self, billboard: &Billboard) {
        self.send(MapEvent::BillboardSelect(billboard.clone()));
    }

    fn on_navigation_event(&self, event: &NavigationEvent) {
        self.send(MapEvent::Navigation(event.clone()));
    }

    fn on_advisory(&self, message: &str) {
        self.send(MapEvent::Advisory(message.to_string()));
    }
}

/// Stops a running [`TrackingSession::run`] loop.
#[derive(Clone, Default)]
pub struct SessionHandle {
    stop: Arc<Notify>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Safe to call before the loop starts or after it ended.
    pub fn stop(&self) {
        self.stop.notify_one();
    }

    /// Resolves once [`stop`](Self::stop) was called.
    pub async fn stopped(&self) {
        self.stop.notified().await;
    }
}

/// What one fix changed.
#[derive(Debug, Clone, Default)]
pub struct FixOutcome {
    pub accepted: bool,
    pub recorded: bool,
    pub nearby: Vec<NearbyBillboard>,
    pub newly_visited: Vec<String>,
    pub events: Vec<NavigationEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The handle asked the loop to stop
    Stopped,
    /// The location stream ended
    StreamEnded,
}

pub struct TrackingSession {
    session_id: Uuid,
    planner: NavigationPlanner,
    proximity: ProximityTracker,
    recorder: RouteRecorder,
    routing: RoutingClient,
    observer: Arc<dyn MapObserver>,
    watch_list: Vec<NavigationTarget>,
    active: bool,
    auto_open_details: bool,
    last_position: Option<GeoPoint>,
}

impl TrackingSession {
    pub fn new(
        config: &NavigationConfig,
        routing: RoutingClient,
        alerts: Arc<dyn AlertSink>,
        observer: Arc<dyn MapObserver>,
    ) -> Self {
        TrackingSession {
            session_id: Uuid::new_v4(),
            planner: NavigationPlanner::new(config.clone()),
            proximity: ProximityTracker::new(config, alerts),
            recorder: RouteRecorder::new(config.min_movement_m),
            routing,
            observer,
            watch_list: Vec::new(),
            active: false,
            auto_open_details: false,
            last_position: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn planner(&self) -> &NavigationPlanner {
        &self.planner
    }

    pub fn recorder(&self) -> &RouteRecorder {
        &self.recorder
    }

    pub fn visited(&self) -> &HashSet<String> {
        self.proximity.visited()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_position(&self) -> Option<GeoPoint> {
        self.last_position
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.proximity.set_sound_enabled(enabled);
    }

    /// Open a billboard's details when the user first comes within the
    /// arrival radius.
    pub fn set_auto_open_details(&mut self, enabled: bool) {
        self.auto_open_details = enabled;
    }

    /// Billboards watched for proximity when no navigation plan is active.
    pub fn set_watch_list(&mut self, billboards: &[Billboard]) {
        self.watch_list = billboards
            .iter()
            .filter_map(NavigationTarget::from_billboard)
            .collect();
    }

    /// Plan a multi-stop route and resolve its road geometry.
    ///
    /// A routing failure is not an error here: the plan keeps its
    /// straight-line estimates and the observer gets an advisory.
    pub async fn plan_route(&mut self, selection: &[Billboard], start: Option<GeoPoint>) -> Result<()> {
        let start = start.or(self.last_position);
        let events = self.planner.activate(selection, start)?;
        self.dispatch(&events);
        self.refresh_route().await;
        Ok(())
    }

    /// Fetch road geometry for the current plan and apply it unless the
    /// plan moved on in the meantime.
    pub async fn refresh_route(&mut self) {
        let Some(request) = self.planner.route_request() else {
            return;
        };

        let result = self.routing.fetch_route(&request.waypoints).await;
        let events = self.planner.apply_route(request.generation, &result);
        self.dispatch(&events);
    }

    /// Begin accepting fixes. Moves a planned navigation into progress.
    pub fn start_tracking(&mut self) -> Result<()> {
        if self.planner.state() == NavigationState::Planning {
            let events = self.planner.start_navigation()?;
            self.dispatch(&events);
        }
        self.active = true;
        tracing::info!(session_id = %self.session_id, "Live tracking started");
        Ok(())
    }

    /// Stop accepting fixes. Late fixes after this are ignored.
    pub fn stop_tracking(&mut self) {
        if self.active {
            tracing::info!(
                session_id = %self.session_id,
                points = self.recorder.track().len(),
                "Live tracking stopped"
            );
        }
        self.active = false;
    }

    /// Process one fix. A no-op unless tracking is active.
    pub fn apply_fix(&mut self, fix: &LocationFix) -> FixOutcome {
        if !self.active {
            tracing::debug!("Ignoring fix for inactive session");
            return FixOutcome::default();
        }

        let position = fix.position;
        let heading = fix.heading.or_else(|| {
            self.last_position
                .filter(|last| last.distance_to(&position) >= MIN_HEADING_MOVEMENT_M)
                .map(|last| bearing(&last, &position))
        });
        self.last_position = Some(position);

        let recorded = self
            .recorder
            .add_sample(position, fix.speed, fix.timestamp_ms);
        self.observer.on_current_location_update(&position);

        let targets = if self.planner.targets().is_empty() {
            &self.watch_list
        } else {
            self.planner.targets()
        };
        let update = self.proximity.update(&position, heading, targets);

        if !update.newly_visited.is_empty() {
            self.observer
                .on_visited_billboards_update(self.proximity.visited());
            if self.auto_open_details {
                if let Some(first) = update.newly_visited.first() {
                    self.observer.on_billboard_select(first);
                }
            }
        }

        let events = self.planner.apply_fix(fix);
        self.dispatch(&events);

        FixOutcome {
            accepted: true,
            recorded,
            nearby: update.nearby,
            newly_visited: update.newly_visited.into_iter().map(|b| b.id).collect(),
            events,
        }
    }

    /// Consume fixes from `provider` until the stream ends or `handle` is
    /// stopped. The location watch is dropped on return.
    pub async fn run(&mut self, provider: &dyn GeolocationProvider, handle: &SessionHandle) -> Result<RunEnd> {
        let mut fixes = self.open_watch(provider).await?;

        let end = loop {
            tokio::select! {
                _ = handle.stopped() => break RunEnd::Stopped,
                next = fixes.next() => match next {
                    Some(Ok(fix)) => {
                        self.apply_fix(&fix);
                    }
                    Some(Err(e)) => self.report_location_error(provider, e),
                    None => break RunEnd::StreamEnded,
                },
            }
        };

        self.stop_tracking();
        Ok(end)
    }

    /// Subscribe to the provider and start tracking. A refused
    /// subscription is reported as an advisory and returned.
    pub async fn open_watch(&mut self, provider: &dyn GeolocationProvider) -> Result<FixStream> {
        let fixes = match provider.watch().await {
            Ok(stream) => stream,
            Err(e) => {
                let error = AppError::Geolocation(e);
                self.observer.on_advisory(&error.user_message());
                return Err(error);
            }
        };

        self.start_tracking()?;
        Ok(fixes)
    }

    /// Stream errors are transient: tracking goes on with the next fix.
    pub fn report_location_error(&self, provider: &dyn GeolocationProvider, error: GeolocationError) {
        tracing::warn!(
            provider = provider.provider_name(),
            error = %error,
            "Transient location error"
        );
        self.observer
            .on_advisory(&AppError::Geolocation(error).user_message());
    }

    /// Re-plan an active navigation for a changed selection, starting from
    /// the last fix or else the previous start.
    pub fn update_plan(&mut self, selection: &[Billboard]) -> Result<()> {
        let start = self.last_position.or(self.planner.start_position());
        let events = self.planner.update_plan(selection, start)?;
        self.dispatch(&events);
        Ok(())
    }

    /// Close navigation mode: drops the plan and stops tracking.
    pub fn close_navigation(&mut self) {
        let events = self.planner.cancel();
        self.dispatch(&events);
        self.stop_tracking();
    }

    /// Forget the recorded track and visits so alerts can fire again.
    /// Idempotent.
    pub fn clear_route(&mut self) {
        self.recorder.clear();
        self.proximity.reset();
        self.observer.on_route_update(&[], 0);
        self.observer
            .on_visited_billboards_update(self.proximity.visited());
    }

    pub fn summary(&self) -> RouteSummary {
        self.planner.summary()
    }

    pub fn share_payload(&self) -> SharePayload {
        SharePayload::new(
            self.session_id,
            self.recorder.track(),
            self.proximity.visited(),
            self.recorder.total_distance_m(),
        )
    }

    fn dispatch(&self, events: &[NavigationEvent]) {
        for event in events {
            match event {
                NavigationEvent::RouteUpdated {
                    coordinates,
                    current_index,
                } => self.observer.on_route_update(coordinates, *current_index),
                NavigationEvent::RouteAdvisory { message } => self.observer.on_advisory(message),
                other => self.observer.on_navigation_event(other),
            }
        }
    }
}

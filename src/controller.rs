//! Map orchestration: provider choice, mode switching, drawing-based
//! selection, and forwarding session events to the active renderer.

use crate::error::{AppError, Result};
use crate::geometry::point_in_polygon;
use crate::models::{Billboard, BoundingBox, GeoPoint};
use crate::render::{MapProvider, MapRenderer, PolylineLayer};
use crate::services::geolocation::GeolocationProvider;
use crate::services::markers::{prepare_markers, PlacedMarker};
use crate::services::session::{MapEvent, RunEnd, SessionHandle, TrackingSession};
use futures::StreamExt;
use geo::{Centroid, LineString, Polygon};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapMode {
    Browse,
    Drawing,
    Navigation,
    LiveTracking,
}

pub struct InteractiveMapController {
    renderer: Box<dyn MapRenderer>,
    session: TrackingSession,
    inventory: Arc<Vec<Billboard>>,
    mode: MapMode,
    fullscreen: bool,
    follow_location: bool,
    drawing: Vec<GeoPoint>,
    selection: Vec<String>,
    markers: Vec<PlacedMarker>,
    visited: HashSet<String>,
    details_open: Option<String>,
    advisory: Option<String>,
    events: Option<mpsc::UnboundedReceiver<MapEvent>>,
}

impl InteractiveMapController {
    pub fn new(
        renderer: Box<dyn MapRenderer>,
        session: TrackingSession,
        inventory: Arc<Vec<Billboard>>,
    ) -> Self {
        InteractiveMapController {
            renderer,
            session,
            inventory,
            mode: MapMode::Browse,
            fullscreen: false,
            follow_location: true,
            drawing: Vec::new(),
            selection: Vec::new(),
            markers: Vec::new(),
            visited: HashSet::new(),
            details_open: None,
            advisory: None,
            events: None,
        }
    }

    /// Receive the session's events, usually from a
    /// [`ChannelObserver`](crate::services::session::ChannelObserver).
    /// They are applied after every operation that can produce them.
    pub fn with_events(mut self, events: mpsc::UnboundedReceiver<MapEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Apply every session event received so far.
    pub fn apply_pending_events(&mut self) {
        let Some(mut events) = self.events.take() else {
            return;
        };
        while let Ok(event) = events.try_recv() {
            self.handle_map_event(&event);
        }
        self.events = Some(events);
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    pub fn provider(&self) -> MapProvider {
        self.renderer.provider()
    }

    pub fn renderer(&self) -> &dyn MapRenderer {
        self.renderer.as_ref()
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TrackingSession {
        &mut self.session
    }

    pub fn inventory(&self) -> &Arc<Vec<Billboard>> {
        &self.inventory
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    pub fn set_follow_location(&mut self, follow: bool) {
        self.follow_location = follow;
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn details_open(&self) -> Option<&str> {
        self.details_open.as_deref()
    }

    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    /// Swap the map backend and redraw the current scene on it.
    pub fn switch_provider(&mut self, renderer: Box<dyn MapRenderer>) {
        tracing::info!(
            from = %self.renderer.provider(),
            to = %renderer.provider(),
            "Switching map provider"
        );
        self.renderer = renderer;
        self.renderer.render_markers(&self.markers);
        self.renderer
            .render_polyline(PolylineLayer::PlannedRoute, self.session.planner().route());
        self.renderer.render_polyline(
            PolylineLayer::RecordedTrack,
            &self.session.recorder().polyline(),
        );
        if let Some(position) = self.session.last_position() {
            self.renderer.pan_to(position);
        }
    }

    /// New inventory: drops selections of billboards that disappeared.
    pub fn set_inventory(&mut self, inventory: Arc<Vec<Billboard>>) {
        let ids: HashSet<&str> = inventory.iter().map(|b| b.id.as_str()).collect();
        let before = self.selection.len();
        self.selection.retain(|id| ids.contains(id.as_str()));
        self.inventory = inventory;
        self.markers.clear();
        self.renderer.render_markers(&[]);
        if self.selection.len() != before {
            self.sync_navigation_with_selection();
        }
    }

    /// Append a batch from the progressive loader to the drawn markers.
    pub fn add_marker_batch(&mut self, batch: &[PlacedMarker]) {
        self.markers.extend_from_slice(batch);
        self.renderer.render_markers(&self.markers);
    }

    /// Draw every placeable billboard at once.
    pub fn render_all_markers(&mut self) {
        self.markers = prepare_markers(&self.inventory, None);
        self.renderer.render_markers(&self.markers);
    }

    pub fn zoom_to(&mut self, zoom: u8) {
        self.renderer.set_zoom(zoom);
    }

    /// Pan to the middle of the given billboards.
    pub fn fit_to(&mut self, billboards: &[Billboard]) {
        let points: Vec<GeoPoint> = billboards.iter().filter_map(Billboard::position).collect();
        if let Some(bounds) = BoundingBox::from_points(&points) {
            self.renderer.pan_to(bounds.center());
        }
    }

    // Selection

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Selected billboards in selection order.
    pub fn selected_billboards(&self) -> Vec<Billboard> {
        self.selection
            .iter()
            .filter_map(|id| self.inventory.iter().find(|b| &b.id == id))
            .cloned()
            .collect()
    }

    /// Returns whether the billboard is selected afterwards.
    ///
    /// During navigation the plan follows the selection with straight-line
    /// legs; [`refresh_route`](Self::refresh_route) fetches road geometry.
    pub fn toggle_selection(&mut self, billboard_id: &str) -> bool {
        let selected = if let Some(index) = self.selection.iter().position(|id| id == billboard_id) {
            self.selection.remove(index);
            false
        } else if self.inventory.iter().any(|b| b.id == billboard_id) {
            self.selection.push(billboard_id.to_string());
            true
        } else {
            tracing::debug!(billboard_id = %billboard_id, "Ignoring selection of unknown billboard");
            return false;
        };
        self.sync_navigation_with_selection();
        selected
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.renderer.render_polygon(&[]);
        self.sync_navigation_with_selection();
    }

    /// Re-plan a running navigation for the current selection. An empty or
    /// unplaceable selection ends navigation.
    fn sync_navigation_with_selection(&mut self) {
        if self.mode != MapMode::Navigation {
            return;
        }

        let selected = self.selected_billboards();
        if selected.is_empty() {
            tracing::info!("Selection emptied, closing navigation");
            self.close_navigation();
            return;
        }

        match self.session.update_plan(&selected) {
            Ok(()) => self.apply_pending_events(),
            Err(e) => {
                tracing::warn!(error = %e, "Re-planning failed, closing navigation");
                self.advisory = Some(e.user_message());
                self.close_navigation();
            }
        }
    }

    // Drawing

    pub fn start_drawing(&mut self) -> Result<()> {
        if matches!(self.mode, MapMode::Navigation | MapMode::LiveTracking) {
            return Err(AppError::InvalidRequest(
                "Close navigation before drawing a selection".to_string(),
            ));
        }
        self.mode = MapMode::Drawing;
        self.drawing.clear();
        self.renderer.render_polygon(&[]);
        Ok(())
    }

    pub fn add_vertex(&mut self, point: GeoPoint) -> Result<()> {
        if self.mode != MapMode::Drawing {
            return Err(AppError::InvalidRequest("Not in drawing mode".to_string()));
        }
        self.drawing.push(point);
        self.renderer.render_polygon(&self.drawing);
        Ok(())
    }

    pub fn cancel_drawing(&mut self) {
        if self.mode == MapMode::Drawing {
            self.mode = MapMode::Browse;
        }
        self.drawing.clear();
        self.renderer.render_polygon(&[]);
    }

    /// Close the polygon and add every billboard inside it to the
    /// selection. Returns the newly selected ids.
    pub fn finish_drawing(&mut self) -> Result<Vec<String>> {
        if self.mode != MapMode::Drawing {
            return Err(AppError::InvalidRequest("Not in drawing mode".to_string()));
        }
        if self.drawing.len() < 3 {
            return Err(AppError::InvalidRequest(
                "A selection area needs at least 3 points".to_string(),
            ));
        }

        let polygon = std::mem::take(&mut self.drawing);
        let mut added = Vec::new();
        for billboard in self.inventory.iter() {
            let Some(position) = billboard.position() else {
                continue;
            };
            if point_in_polygon(&position, &polygon) && !self.selection.contains(&billboard.id) {
                self.selection.push(billboard.id.clone());
                added.push(billboard.id.clone());
            }
        }

        let ring: LineString<f64> = polygon.iter().map(|p| geo::Coord::from(*p)).collect();
        if let Some(centroid) = Polygon::new(ring, vec![]).centroid() {
            self.renderer.pan_to(GeoPoint {
                lat: centroid.y(),
                lng: centroid.x(),
            });
        }
        self.renderer.render_polygon(&polygon);
        self.mode = MapMode::Browse;

        tracing::info!(
            vertices = polygon.len(),
            added = added.len(),
            "Area selection finished"
        );
        Ok(added)
    }

    // Navigation and live tracking

    /// Plan navigation through the current selection, from `start` or the
    /// last known position.
    pub async fn enter_navigation(&mut self, start: Option<GeoPoint>) -> Result<()> {
        let selected = self.selected_billboards();
        if selected.is_empty() {
            return Err(AppError::InvalidRequest(
                "Select billboards before starting navigation".to_string(),
            ));
        }

        self.drawing.clear();
        let planned = self.session.plan_route(&selected, start).await;
        self.apply_pending_events();
        planned?;
        self.mode = MapMode::Navigation;
        Ok(())
    }

    /// Fetch road geometry for the current plan.
    pub async fn refresh_route(&mut self) {
        self.session.refresh_route().await;
        self.apply_pending_events();
    }

    pub fn close_navigation(&mut self) {
        self.session.close_navigation();
        self.apply_pending_events();
        self.renderer.render_polyline(PolylineLayer::PlannedRoute, &[]);
        self.mode = MapMode::Browse;
    }

    /// Follow the device until the stream ends or `handle` stops it.
    ///
    /// Session events reach the renderer after every fix. The controller
    /// stays borrowed while running, so other tasks end the run through a
    /// clone of `handle`.
    pub async fn run_live_tracking(
        &mut self,
        provider: &dyn GeolocationProvider,
        handle: &SessionHandle,
    ) -> Result<RunEnd> {
        if self.mode != MapMode::Navigation {
            let selected = self.selected_billboards();
            self.session.set_watch_list(&selected);
            self.mode = MapMode::LiveTracking;
        }

        let mut fixes = match self.session.open_watch(provider).await {
            Ok(fixes) => fixes,
            Err(e) => {
                self.apply_pending_events();
                self.advisory = Some(e.user_message());
                if self.mode == MapMode::LiveTracking {
                    self.mode = MapMode::Browse;
                }
                return Err(e);
            }
        };
        self.apply_pending_events();

        let end = loop {
            tokio::select! {
                _ = handle.stopped() => break RunEnd::Stopped,
                next = fixes.next() => match next {
                    Some(Ok(fix)) => {
                        self.session.apply_fix(&fix);
                    }
                    Some(Err(e)) => self.session.report_location_error(provider, e),
                    None => break RunEnd::StreamEnded,
                },
            }
            self.apply_pending_events();
        };

        self.session.stop_tracking();
        self.apply_pending_events();
        Ok(end)
    }

    pub fn stop_live_tracking(&mut self) {
        self.session.stop_tracking();
        if self.mode == MapMode::LiveTracking {
            self.mode = MapMode::Browse;
        }
    }

    /// Forget the recorded track and visits.
    pub fn clear_route(&mut self) {
        self.session.clear_route();
        self.visited.clear();
        self.renderer.render_polyline(PolylineLayer::RecordedTrack, &[]);
    }

    /// Apply one session event to the renderer and controller state.
    pub fn handle_map_event(&mut self, event: &MapEvent) {
        match event {
            MapEvent::RouteUpdate { coordinates, .. } => {
                self.renderer
                    .render_polyline(PolylineLayer::PlannedRoute, coordinates);
            }
            MapEvent::CurrentLocation(position) => {
                if self.follow_location {
                    self.renderer.pan_to(*position);
                }
                self.renderer.render_polyline(
                    PolylineLayer::RecordedTrack,
                    &self.session.recorder().polyline(),
                );
            }
            MapEvent::VisitedBillboards(ids) => {
                self.visited = ids.iter().cloned().collect();
            }
            MapEvent::BillboardSelect(billboard) => {
                self.details_open = Some(billboard.id.clone());
            }
            MapEvent::Navigation(event) => {
                tracing::debug!(event = ?event, "Navigation event");
            }
            MapEvent::Advisory(message) => {
                self.advisory = Some(message.clone());
            }
        }
    }
}

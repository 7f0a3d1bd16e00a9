use async_trait::async_trait;
use billboard_nav::config::NavigationConfig;
use billboard_nav::controller::{InteractiveMapController, MapMode};
use billboard_nav::error::GeolocationError;
use billboard_nav::models::{Billboard, GeoPoint, LocationFix};
use billboard_nav::render::{GeoJsonRenderer, MapProvider, MapRenderer, PolylineLayer};
use billboard_nav::services::alerts::NoopAlerts;
use billboard_nav::services::geolocation::{FixStream, GeolocationProvider, ReplayGeolocation};
use billboard_nav::services::markers::{prepare_markers, PlacedMarker};
use billboard_nav::services::routing::{OfflineDirections, RoutingClient};
use billboard_nav::services::session::{ChannelObserver, SessionHandle, TrackingSession};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::{billboard, point, scenario_targets};

/// What a renderer was last asked to draw
#[derive(Default)]
struct Scene {
    markers: usize,
    route: Vec<GeoPoint>,
    track: Vec<GeoPoint>,
    center: Option<GeoPoint>,
}

struct RecordingRenderer {
    provider: MapProvider,
    scene: Arc<Mutex<Scene>>,
}

impl RecordingRenderer {
    fn new(provider: MapProvider) -> (Self, Arc<Mutex<Scene>>) {
        let scene = Arc::new(Mutex::new(Scene::default()));
        (
            RecordingRenderer {
                provider,
                scene: scene.clone(),
            },
            scene,
        )
    }
}

impl MapRenderer for RecordingRenderer {
    fn provider(&self) -> MapProvider {
        self.provider
    }

    fn render_markers(&mut self, markers: &[PlacedMarker]) {
        self.scene.lock().unwrap().markers = markers.len();
    }

    fn render_polyline(&mut self, layer: PolylineLayer, points: &[GeoPoint]) {
        let mut scene = self.scene.lock().unwrap();
        match layer {
            PolylineLayer::PlannedRoute => scene.route = points.to_vec(),
            PolylineLayer::RecordedTrack => scene.track = points.to_vec(),
        }
    }

    fn render_polygon(&mut self, _points: &[GeoPoint]) {}

    fn pan_to(&mut self, center: GeoPoint) {
        self.scene.lock().unwrap().center = Some(center);
    }

    fn set_zoom(&mut self, _zoom: u8) {}
}

fn map_with(renderer: Box<dyn MapRenderer>, inventory: Vec<Billboard>) -> InteractiveMapController {
    let (observer, events) = ChannelObserver::new();
    let session = TrackingSession::new(
        &NavigationConfig::default(),
        RoutingClient::new(Arc::new(OfflineDirections), 50),
        Arc::new(NoopAlerts),
        Arc::new(observer),
    );
    InteractiveMapController::new(renderer, session, Arc::new(inventory)).with_events(events)
}

/// Hands out its fixes one at a time and notes where the map was
/// centered each time the next fix is requested.
struct WatchedReplay {
    fixes: Vec<LocationFix>,
    scene: Arc<Mutex<Scene>>,
    centers: Arc<Mutex<Vec<Option<GeoPoint>>>>,
}

#[async_trait]
impl GeolocationProvider for WatchedReplay {
    async fn watch(&self) -> Result<FixStream, GeolocationError> {
        let scene = self.scene.clone();
        let centers = self.centers.clone();
        let stream = futures::stream::iter(self.fixes.clone()).then(move |fix| {
            let scene = scene.clone();
            let centers = centers.clone();
            async move {
                let center = scene.lock().unwrap().center;
                centers.lock().unwrap().push(center);
                Ok::<_, GeolocationError>(fix)
            }
        });
        Ok(stream.boxed())
    }

    fn provider_name(&self) -> &'static str {
        "watched-replay"
    }
}

#[tokio::test]
async fn test_switching_provider_redraws_scene() {
    let (_, targets) = scenario_targets();
    let (google, _) = RecordingRenderer::new(MapProvider::Google);
    let mut map = map_with(Box::new(google), targets.clone());

    map.render_all_markers();
    map.toggle_selection("near");
    map.toggle_selection("far");
    map.enter_navigation(Some(point(32.40, 14.40))).await.unwrap();

    let (osm, scene) = RecordingRenderer::new(MapProvider::OpenStreetMap);
    map.switch_provider(Box::new(osm));

    assert_eq!(map.provider(), MapProvider::OpenStreetMap);
    let scene = scene.lock().unwrap();
    assert_eq!(scene.markers, 2);
    assert_eq!(scene.route, map.session().planner().route());
    assert_eq!(scene.route.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_live_tracking_updates_map_state() {
    let (_, targets) = scenario_targets();
    let (renderer, scene) = RecordingRenderer::new(MapProvider::OpenStreetMap);
    let mut map = map_with(Box::new(renderer), targets);
    map.session_mut().set_auto_open_details(true);
    map.toggle_selection("near");

    let replay = ReplayGeolocation::new(vec![
        LocationFix::at(point(32.49, 14.50)),
        LocationFix::at(point(32.50, 14.50)),
    ])
    .with_interval(Duration::from_millis(100));

    map.run_live_tracking(&replay, &SessionHandle::new()).await.unwrap();
    assert_eq!(map.mode(), MapMode::LiveTracking);

    assert!(map.visited().contains("near"));
    assert_eq!(map.details_open(), Some("near"));
    let scene = scene.lock().unwrap();
    assert_eq!(scene.center, Some(point(32.50, 14.50)));
    assert_eq!(scene.track.len(), 2);
    drop(scene);

    map.stop_live_tracking();
    assert_eq!(map.mode(), MapMode::Browse);

    map.clear_route();
    assert!(map.visited().is_empty());
}

#[tokio::test]
async fn test_map_follows_each_fix_while_tracking() {
    let (renderer, scene) = RecordingRenderer::new(MapProvider::OpenStreetMap);
    let mut map = map_with(Box::new(renderer), vec![billboard("b1", 33.0, 13.0)]);
    let centers = Arc::new(Mutex::new(Vec::new()));
    let provider = WatchedReplay {
        fixes: vec![
            LocationFix::at(point(32.00, 13.00)),
            LocationFix::at(point(32.01, 13.00)),
        ],
        scene: scene.clone(),
        centers: centers.clone(),
    };

    map.run_live_tracking(&provider, &SessionHandle::new()).await.unwrap();

    // The first fix was already on the map when the second one was read
    assert_eq!(
        *centers.lock().unwrap(),
        vec![None, Some(point(32.00, 13.00))]
    );
    assert_eq!(scene.lock().unwrap().center, Some(point(32.01, 13.00)));
}

#[tokio::test]
async fn test_selection_change_replans_navigation() {
    let (start, targets) = scenario_targets();
    let (renderer, scene) = RecordingRenderer::new(MapProvider::Google);
    let mut map = map_with(Box::new(renderer), targets);
    map.toggle_selection("near");
    map.toggle_selection("far");
    map.enter_navigation(Some(start)).await.unwrap();
    assert_eq!(map.session().planner().targets().len(), 2);

    assert!(!map.toggle_selection("far"));
    assert_eq!(map.mode(), MapMode::Navigation);
    let ids: Vec<&str> = map
        .session()
        .planner()
        .targets()
        .iter()
        .map(|t| t.billboard.id.as_str())
        .collect();
    assert_eq!(ids, ["near"]);
    assert_eq!(scene.lock().unwrap().route, vec![start, point(32.50, 14.50)]);

    map.refresh_route().await;
    assert_eq!(scene.lock().unwrap().route, map.session().planner().route());

    assert!(!map.toggle_selection("near"));
    assert_eq!(map.mode(), MapMode::Browse);
    assert!(map.session().planner().targets().is_empty());
    assert!(scene.lock().unwrap().route.is_empty());
}

#[tokio::test]
async fn test_location_denied_sets_advisory() {
    let (renderer, _) = RecordingRenderer::new(MapProvider::Google);
    let mut map = map_with(Box::new(renderer), vec![billboard("b1", 32.0, 13.0)]);

    let replay = ReplayGeolocation::failing(billboard_nav::error::GeolocationError::PermissionDenied);
    assert!(map.run_live_tracking(&replay, &SessionHandle::new()).await.is_err());

    assert_eq!(map.mode(), MapMode::Browse);
    assert!(map.advisory().is_some_and(|m| m.contains("denied")));
}

#[test]
fn test_inventory_change_prunes_selection() {
    let (renderer, scene) = RecordingRenderer::new(MapProvider::Google);
    let mut map = map_with(
        Box::new(renderer),
        vec![billboard("keep", 32.0, 13.0), billboard("gone", 32.1, 13.1)],
    );
    map.toggle_selection("keep");
    map.toggle_selection("gone");
    map.render_all_markers();

    map.set_inventory(Arc::new(vec![billboard("keep", 32.0, 13.0)]));

    assert_eq!(map.selection(), ["keep"]);
    assert_eq!(scene.lock().unwrap().markers, 0);
}

#[tokio::test]
async fn test_geojson_scene_export() {
    let (_, targets) = scenario_targets();
    let mut map = map_with(
        Box::new(GeoJsonRenderer::new(MapProvider::OpenStreetMap)),
        targets.clone(),
    );
    map.add_marker_batch(&prepare_markers(&targets, None));
    map.toggle_selection("near");
    map.enter_navigation(Some(point(32.40, 14.40))).await.unwrap();

    let exported = map.renderer().export_geojson().unwrap();
    let parsed: geojson::GeoJson = exported.parse().unwrap();
    let geojson::GeoJson::FeatureCollection(collection) = parsed else {
        panic!("expected a feature collection");
    };

    let kinds: Vec<String> = collection
        .features
        .iter()
        .filter_map(|f| f.property("kind"))
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect();
    assert!(kinds.iter().any(|k| k == "planned_route"));
    assert_eq!(kinds.iter().filter(|k| *k == "billboard").count(), 2);
}

use billboard_nav::cache::{MemoryRouteCache, RouteCache};
use billboard_nav::config::Config;
use billboard_nav::controller::InteractiveMapController;
use billboard_nav::models::{Billboard, GeoPoint, LocationFix};
use billboard_nav::render::{map_sdk, GeoJsonRenderer, MapProvider, SdkHandle};
use billboard_nav::services::geolocation::ReplayGeolocation;
use billboard_nav::services::inventory::{load_inventory_or_empty, JsonFileInventory, StaticInventory};
use billboard_nav::services::markers::ProgressiveMarkerLoader;
use billboard_nav::services::routing::{DirectionsService, OfflineDirections, OsrmClient, RoutingClient};
use billboard_nav::services::session::{ChannelObserver, SessionHandle, TrackingSession};
use billboard_nav::services::share::directions_url;
use billboard_nav::services::TracingAlerts;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_REPLAY_INTERVAL_MS: u64 = 200;
const DEFAULT_AUTO_SELECT: usize = 3;
/// Spacing of synthesized GPS fixes along straight legs
const SYNTHETIC_STEP_M: f64 = 40.0;

fn print_help() {
    eprintln!(
        "\
Usage: billboard-nav [OPTIONS]

Simulates a navigation session over a billboard inventory and prints the
share payload as JSON.

Options:
  --inventory=PATH      JSON array of billboards (default: built-in demo set)
  --select=ID,ID,...    Billboards to navigate (default: first 3 placeable)
  --start=LAT,LNG       Starting position (default: first fix of the track)
  --track=PATH          JSON array of location fixes to replay
                        (default: straight-line drive through the stops)
  --interval-ms=N       Delay between replayed fixes (default: 200)
  --provider=NAME       google | openstreetmap (default: openstreetmap)
  --offline             Skip the routing service, use straight lines
  --geojson             Also print the final map scene as GeoJSON
  --help                Show this help message"
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billboard_nav=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let inventory_path = args.iter().find_map(|a| a.strip_prefix("--inventory="));
    let track_path = args.iter().find_map(|a| a.strip_prefix("--track="));
    let selection_arg = args.iter().find_map(|a| a.strip_prefix("--select="));
    let start_arg = args
        .iter()
        .find_map(|a| a.strip_prefix("--start="))
        .and_then(GeoPoint::parse);
    let interval_ms: u64 = args
        .iter()
        .find_map(|a| a.strip_prefix("--interval-ms="))
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_REPLAY_INTERVAL_MS);
    let provider: MapProvider = args
        .iter()
        .find_map(|a| a.strip_prefix("--provider="))
        .map(str::parse::<MapProvider>)
        .transpose()?
        .unwrap_or_default();
    let offline = args.iter().any(|a| a == "--offline");
    let geojson_output = args.iter().any(|a| a == "--geojson");

    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;
    tracing::info!("Configuration loaded successfully");

    // Routing with an in-memory cache in front
    let directions: Arc<dyn DirectionsService> = if offline {
        tracing::info!("Offline mode: routes are drawn as straight lines");
        Arc::new(OfflineDirections)
    } else {
        Arc::new(OsrmClient::with_config(
            config.routing_base_url.clone(),
            Duration::from_secs(config.routing_timeout_secs),
        )?)
    };
    let cache: Arc<dyn RouteCache> = Arc::new(MemoryRouteCache::new(
        config.route_cache_ttl,
        config.route_cache_max_entries,
    ));
    let routing =
        RoutingClient::new(directions, config.navigation.route_max_points).with_cache(cache);

    // Inventory never fails hard: a broken source gives an empty map
    let timeout = Duration::from_secs(config.inventory_timeout_secs);
    let billboards = match inventory_path {
        Some(path) => load_inventory_or_empty(&JsonFileInventory::new(path), timeout).await,
        None => load_inventory_or_empty(&StaticInventory(demo_inventory()), timeout).await,
    };
    let inventory = Arc::new(billboards);

    let sdk = map_sdk()
        .get_or_load(|| async move { Ok(SdkHandle::for_provider(provider)) })
        .await?;
    tracing::info!(provider = %sdk.provider, tiles = %sdk.tile_url_template, "Map ready");

    let (observer, events) = ChannelObserver::new();
    let session = TrackingSession::new(
        &config.navigation,
        routing,
        Arc::new(TracingAlerts::new()),
        Arc::new(observer),
    );
    let mut map = InteractiveMapController::new(
        Box::new(GeoJsonRenderer::new(provider)),
        session,
        inventory.clone(),
    )
    .with_events(events);
    map.session_mut().set_auto_open_details(true);

    let loader = ProgressiveMarkerLoader::new(&config.markers, true);
    loader
        .load(inventory.clone(), |batch, progress| {
            tracing::debug!(
                loaded = progress.loaded_count,
                total = progress.total_count,
                "Markers {:.0}%",
                progress.progress_percent
            );
            map.add_marker_batch(batch);
        })
        .await;

    match selection_arg {
        Some(ids) => {
            for id in ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
                if !map.toggle_selection(id) {
                    tracing::warn!(billboard_id = %id, "Unknown billboard id in selection");
                }
            }
        }
        None => {
            let ids: Vec<String> = inventory
                .iter()
                .filter(|b| b.position().is_some())
                .take(DEFAULT_AUTO_SELECT)
                .map(|b| b.id.clone())
                .collect();
            for id in &ids {
                map.toggle_selection(id);
            }
        }
    }

    let selected = map.selected_billboards();
    if selected.is_empty() {
        return Err("No billboards with valid coordinates to navigate".into());
    }
    map.fit_to(&selected);

    if let Err(e) = map.enter_navigation(start_arg).await {
        eprintln!("{}", e.user_message());
        return Ok(());
    }

    let summary = map.session().summary();
    tracing::info!(
        stops = summary.total,
        distance_km = %format!("{:.1}", summary.total_distance_m / 1000.0),
        road = summary.road_distances,
        "Route planned"
    );
    for (i, target) in map.session().planner().targets().iter().enumerate() {
        tracing::info!("{}. {}", i + 1, target.instruction);
    }

    let stops: Vec<GeoPoint> = map
        .session()
        .planner()
        .targets()
        .iter()
        .map(|t| t.position)
        .collect();

    let replay = match track_path {
        Some(path) => ReplayGeolocation::from_json_file(path).await?,
        None => ReplayGeolocation::new(synthesize_track(start_arg, &stops)),
    }
    .with_interval(Duration::from_millis(interval_ms));

    let handle = SessionHandle::new();
    let end = map.run_live_tracking(&replay, &handle).await?;

    let summary = map.session().summary();
    tracing::info!(
        end = ?end,
        state = ?map.session().planner().state(),
        reached = summary.reached,
        total = summary.total,
        visited = map.visited().len(),
        "Tracking finished"
    );

    if let Some(url) = directions_url(map.session().planner().start_position(), &stops) {
        tracing::info!(url = %url, "Open in external navigation app");
    }

    println!("{}", map.session().share_payload().to_json()?);
    if geojson_output {
        if let Some(scene) = map.renderer().export_geojson() {
            println!("{}", scene);
        }
    }

    Ok(())
}

/// Straight-line drive from `start` (or the first stop) through every stop.
fn synthesize_track(start: Option<GeoPoint>, stops: &[GeoPoint]) -> Vec<LocationFix> {
    let points: Vec<GeoPoint> = start.into_iter().chain(stops.iter().copied()).collect();

    let mut fixes = Vec::new();
    let mut timestamp_ms = 0;
    for leg in points.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        let steps = (from.distance_to(&to) / SYNTHETIC_STEP_M).ceil().max(1.0) as usize;
        for step in 0..steps {
            let t = step as f64 / steps as f64;
            let position = GeoPoint {
                lat: from.lat + (to.lat - from.lat) * t,
                lng: from.lng + (to.lng - from.lng) * t,
            };
            fixes.push(LocationFix::at(position).with_timestamp(timestamp_ms));
            timestamp_ms += 1000;
        }
    }
    if let Some(last) = points.last() {
        fixes.push(LocationFix::at(*last).with_timestamp(timestamp_ms));
    }
    fixes
}

fn demo_inventory() -> Vec<Billboard> {
    [
        ("TRP-001", "Airport Road North", "32.8190, 13.1550"),
        ("TRP-002", "Martyrs Square", "32.8951, 13.1802"),
        ("TRP-003", "Gurji Roundabout", "32.8720, 13.1120"),
        ("TRP-004", "Souq Al Juma", "32.9020, 13.2440"),
        ("TRP-005", "Tajoura Coastal Road", "32.8820, 13.3510"),
    ]
    .into_iter()
    .map(|(id, name, coordinates)| Billboard::new(id, name, coordinates))
    .collect()
}

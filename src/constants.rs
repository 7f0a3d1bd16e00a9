//! Stable application-wide constants.
//!
//! Values here are geodesy constants, proximity thresholds, and default
//! fallbacks for env-var-based configuration. For the tunable knobs see
//! [`NavigationConfig`](crate::config::NavigationConfig) and
//! [`MarkerLoaderConfig`](crate::config::MarkerLoaderConfig).

// --- Geodesy ---

/// Mean Earth radius in meters used by the Haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// --- Proximity thresholds (meters) ---

/// A target counts as reached/visited once the live position is this close.
/// Overridden by `ARRIVAL_RADIUS_M`.
pub const DEFAULT_ARRIVAL_RADIUS_M: f64 = 100.0;
/// Targets within this radius show up in the "nearby" list.
/// Overridden by `NEARBY_RADIUS_M`.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 2_000.0;
/// Maximum number of entries kept in the ranked nearby list.
pub const DEFAULT_NEARBY_LIMIT: usize = 8;

// --- Live track recording ---

/// Minimum movement (meters) between two recorded track points.
/// Smaller moves are GPS jitter while stationary. Overridden by `MIN_MOVEMENT_M`.
pub const DEFAULT_MIN_MOVEMENT_M: f64 = 5.0;
/// Minimum movement between two fixes before a heading is derived from them.
pub const MIN_HEADING_MOVEMENT_M: f64 = 3.0;

// --- Navigation estimates ---

/// Assumed average driving speed used for straight-line duration estimates.
/// Overridden by `AVERAGE_SPEED_KMH`.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;
/// Point budget for rendered route polylines. Overridden by `ROUTE_MAX_POINTS`.
pub const DEFAULT_ROUTE_MAX_POINTS: usize = 50;

// --- Routing service ---

/// Public OSRM driving profile endpoint. Overridden by `ROUTING_BASE_URL`.
pub const DEFAULT_ROUTING_BASE_URL: &str = "https://router.project-osrm.org/route/v1/driving";
/// Request timeout for one routing call. Overridden by `ROUTING_TIMEOUT_SECS`.
pub const DEFAULT_ROUTING_TIMEOUT_SECONDS: u64 = 10;
/// OSRM demo server rejects requests with more waypoints than this.
pub const MAX_ROUTING_WAYPOINTS: usize = 100;

// --- Route cache ---

/// Default route cache TTL: 1 hour. Overridden by `ROUTE_CACHE_TTL`.
pub const DEFAULT_ROUTE_CACHE_TTL_SECONDS: u64 = 3_600;
/// Maximum cached routes (LRU eviction). Overridden by `ROUTE_CACHE_MAX_ENTRIES`.
pub const DEFAULT_ROUTE_CACHE_MAX_ENTRIES: u64 = 200;
/// Waypoints are rounded to this many decimals (~1 m) when building cache keys.
pub const ROUTE_CACHE_KEY_PRECISION: u32 = 5;

// --- Progressive marker loading ---

/// Markers revealed per batch. Overridden by `MARKER_BATCH_SIZE`.
pub const DEFAULT_MARKER_BATCH_SIZE: usize = 50;
/// Pause between two batches. Overridden by `MARKER_BATCH_DELAY_MS`.
pub const DEFAULT_MARKER_BATCH_DELAY_MS: u64 = 80;
/// Quiet period before a pan/zoom triggers a visible-marker query.
pub const DEFAULT_VISIBLE_MARKERS_DEBOUNCE_MS: u64 = 300;
/// Reference center used to prioritise markers (Tripoli).
pub const DEFAULT_PRIORITY_CENTER_LAT: f64 = 32.8872;
pub const DEFAULT_PRIORITY_CENTER_LNG: f64 = 13.1913;

// --- Inventory ---

/// Inventory loads slower than this are treated as an empty inventory.
/// Overridden by `INVENTORY_TIMEOUT_SECS`.
pub const DEFAULT_INVENTORY_TIMEOUT_SECONDS: u64 = 15;

// --- Haptics ---

/// Vibration pattern (on/off/on, milliseconds) for a proximity alert.
pub const PROXIMITY_VIBRATION_PATTERN_MS: [u64; 3] = [200, 100, 200];

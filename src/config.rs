use crate::constants::*;
use crate::models::GeoPoint;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub routing_base_url: String,
    pub routing_timeout_secs: u64,
    pub route_cache_ttl: u64,
    pub route_cache_max_entries: u64,
    pub inventory_timeout_secs: u64,
    pub navigation: NavigationConfig,
    pub markers: MarkerLoaderConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationConfig {
    /// Distance (meters) at which a target counts as reached/visited
    pub arrival_radius_m: f64,

    /// Distance (meters) within which targets are listed as nearby
    pub nearby_radius_m: f64,

    /// Maximum number of nearby entries returned
    pub nearby_limit: usize,

    /// Minimum movement (meters) before a new track point is recorded
    pub min_movement_m: f64,

    /// Assumed average speed for straight-line duration estimates
    pub average_speed_kmh: f64,

    /// Point budget for rendered route polylines
    pub route_max_points: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: DEFAULT_ARRIVAL_RADIUS_M,
            nearby_radius_m: DEFAULT_NEARBY_RADIUS_M,
            nearby_limit: DEFAULT_NEARBY_LIMIT,
            min_movement_m: DEFAULT_MIN_MOVEMENT_M,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            route_max_points: DEFAULT_ROUTE_MAX_POINTS,
        }
    }
}

impl NavigationConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            arrival_radius_m: env::var("ARRIVAL_RADIUS_M")
                .unwrap_or_else(|_| defaults.arrival_radius_m.to_string())
                .parse()
                .map_err(|_| "Invalid ARRIVAL_RADIUS_M")?,

            nearby_radius_m: env::var("NEARBY_RADIUS_M")
                .unwrap_or_else(|_| defaults.nearby_radius_m.to_string())
                .parse()
                .map_err(|_| "Invalid NEARBY_RADIUS_M")?,

            nearby_limit: env::var("NEARBY_LIMIT")
                .unwrap_or_else(|_| defaults.nearby_limit.to_string())
                .parse()
                .map_err(|_| "Invalid NEARBY_LIMIT")?,

            min_movement_m: env::var("MIN_MOVEMENT_M")
                .unwrap_or_else(|_| defaults.min_movement_m.to_string())
                .parse()
                .map_err(|_| "Invalid MIN_MOVEMENT_M")?,

            average_speed_kmh: env::var("AVERAGE_SPEED_KMH")
                .unwrap_or_else(|_| defaults.average_speed_kmh.to_string())
                .parse()
                .map_err(|_| "Invalid AVERAGE_SPEED_KMH")?,

            route_max_points: env::var("ROUTE_MAX_POINTS")
                .unwrap_or_else(|_| defaults.route_max_points.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_MAX_POINTS")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.arrival_radius_m <= 0.0 || self.arrival_radius_m > 1_000.0 {
            return Err("ARRIVAL_RADIUS_M must be between 0 and 1000 meters".to_string());
        }
        if self.nearby_radius_m < self.arrival_radius_m {
            return Err("NEARBY_RADIUS_M must not be smaller than ARRIVAL_RADIUS_M".to_string());
        }
        if self.min_movement_m < 0.0 {
            return Err("MIN_MOVEMENT_M cannot be negative".to_string());
        }
        if self.average_speed_kmh <= 0.0 {
            return Err("AVERAGE_SPEED_KMH must be positive".to_string());
        }
        if self.route_max_points < 2 {
            return Err("ROUTE_MAX_POINTS must be at least 2".to_string());
        }
        Ok(())
    }

    /// Average speed in meters per second.
    pub fn average_speed_mps(&self) -> f64 {
        self.average_speed_kmh / 3.6
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLoaderConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub visible_debounce_ms: u64,
    /// Markers closest to this point are revealed first when prioritising
    pub priority_center: GeoPoint,
}

impl Default for MarkerLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_MARKER_BATCH_SIZE,
            batch_delay_ms: DEFAULT_MARKER_BATCH_DELAY_MS,
            visible_debounce_ms: DEFAULT_VISIBLE_MARKERS_DEBOUNCE_MS,
            priority_center: GeoPoint {
                lat: DEFAULT_PRIORITY_CENTER_LAT,
                lng: DEFAULT_PRIORITY_CENTER_LNG,
            },
        }
    }
}

impl MarkerLoaderConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let batch_size: usize = env::var("MARKER_BATCH_SIZE")
            .unwrap_or_else(|_| defaults.batch_size.to_string())
            .parse()
            .map_err(|_| "Invalid MARKER_BATCH_SIZE")?;

        if batch_size == 0 {
            return Err("MARKER_BATCH_SIZE must be at least 1".to_string());
        }

        Ok(Self {
            batch_size,
            batch_delay_ms: env::var("MARKER_BATCH_DELAY_MS")
                .unwrap_or_else(|_| defaults.batch_delay_ms.to_string())
                .parse()
                .map_err(|_| "Invalid MARKER_BATCH_DELAY_MS")?,
            visible_debounce_ms: env::var("VISIBLE_MARKERS_DEBOUNCE_MS")
                .unwrap_or_else(|_| defaults.visible_debounce_ms.to_string())
                .parse()
                .map_err(|_| "Invalid VISIBLE_MARKERS_DEBOUNCE_MS")?,
            priority_center: defaults.priority_center,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            routing_base_url: DEFAULT_ROUTING_BASE_URL.to_string(),
            routing_timeout_secs: DEFAULT_ROUTING_TIMEOUT_SECONDS,
            route_cache_ttl: DEFAULT_ROUTE_CACHE_TTL_SECONDS,
            route_cache_max_entries: DEFAULT_ROUTE_CACHE_MAX_ENTRIES,
            inventory_timeout_secs: DEFAULT_INVENTORY_TIMEOUT_SECONDS,
            navigation: NavigationConfig::default(),
            markers: MarkerLoaderConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            routing_base_url: env::var("ROUTING_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ROUTING_BASE_URL.to_string()),
            routing_timeout_secs: env::var("ROUTING_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_ROUTING_TIMEOUT_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTING_TIMEOUT_SECS")?,
            route_cache_ttl: env::var("ROUTE_CACHE_TTL")
                .unwrap_or_else(|_| DEFAULT_ROUTE_CACHE_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_CACHE_TTL")?,
            route_cache_max_entries: env::var("ROUTE_CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| DEFAULT_ROUTE_CACHE_MAX_ENTRIES.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_CACHE_MAX_ENTRIES")?,
            inventory_timeout_secs: env::var("INVENTORY_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_INVENTORY_TIMEOUT_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid INVENTORY_TIMEOUT_SECS")?,
            navigation: NavigationConfig::from_env()?,
            markers: MarkerLoaderConfig::from_env()?,
        })
    }
}

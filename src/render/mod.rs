//! Rendering adapters.
//!
//! Navigation, proximity and recording never talk to a concrete map
//! backend; they go through [`MapRenderer`].

pub mod clustering;
pub mod geojson_renderer;
pub mod sdk;

pub use clustering::{cluster_markers, MarkerCluster};
pub use geojson_renderer::GeoJsonRenderer;
pub use sdk::{map_sdk, MapSdkCache, SdkHandle, SdkLoadState};

use crate::models::GeoPoint;
use crate::services::markers::PlacedMarker;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MapProvider {
    Google,
    #[default]
    OpenStreetMap,
}

impl MapProvider {
    pub fn tile_url_template(&self) -> &'static str {
        match self {
            MapProvider::Google => "https://mt1.google.com/vt/lyrs=m&x={x}&y={y}&z={z}",
            MapProvider::OpenStreetMap => "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        }
    }
}

impl fmt::Display for MapProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapProvider::Google => write!(f, "google"),
            MapProvider::OpenStreetMap => write!(f, "openstreetmap"),
        }
    }
}

impl FromStr for MapProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(MapProvider::Google),
            "openstreetmap" | "osm" | "leaflet" => Ok(MapProvider::OpenStreetMap),
            _ => Err(format!("Invalid map provider: {}", s)),
        }
    }
}

/// Which polyline a draw call replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolylineLayer {
    PlannedRoute,
    RecordedTrack,
}

/// Capability set shared by every map backend.
///
/// Each call replaces what was previously drawn for that layer; an empty
/// slice clears it.
pub trait MapRenderer: Send {
    fn provider(&self) -> MapProvider;
    fn render_markers(&mut self, markers: &[PlacedMarker]);
    fn render_polyline(&mut self, layer: PolylineLayer, points: &[GeoPoint]);
    fn render_polygon(&mut self, points: &[GeoPoint]);
    fn pan_to(&mut self, center: GeoPoint);
    fn set_zoom(&mut self, zoom: u8);

    /// Drawn scene as GeoJSON, for backends that can export one.
    fn export_geojson(&self) -> Option<String> {
        None
    }
}

use crate::models::GeoPoint;
use crate::services::markers::PlacedMarker;
use serde::Serialize;
use std::collections::BTreeMap;

/// At this zoom and above every marker is drawn on its own.
pub const CLUSTER_MAX_ZOOM: u8 = 15;

/// Grid cells per 256 px map tile edge.
const CELLS_PER_TILE: f64 = 4.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarkerCluster {
    /// Mean position of the members
    pub center: GeoPoint,
    pub billboard_ids: Vec<String>,
}

impl MarkerCluster {
    pub fn count(&self) -> usize {
        self.billboard_ids.len()
    }

    pub fn is_single(&self) -> bool {
        self.billboard_ids.len() == 1
    }
}

/// Grid-based clustering: markers falling into the same cell at `zoom`
/// merge into one cluster. Output order is stable for the same input.
pub fn cluster_markers(markers: &[PlacedMarker], zoom: u8) -> Vec<MarkerCluster> {
    if zoom >= CLUSTER_MAX_ZOOM {
        return markers
            .iter()
            .map(|m| MarkerCluster {
                center: m.position,
                billboard_ids: vec![m.billboard_id.clone()],
            })
            .collect();
    }

    let cell_deg = 360.0 / f64::from(1u32 << zoom) / CELLS_PER_TILE;
    let mut cells: BTreeMap<(i64, i64), Vec<&PlacedMarker>> = BTreeMap::new();

    for marker in markers {
        let key = (
            (marker.position.lat / cell_deg).floor() as i64,
            (marker.position.lng / cell_deg).floor() as i64,
        );
        cells.entry(key).or_default().push(marker);
    }

    cells
        .into_values()
        .map(|members| {
            let n = members.len() as f64;
            let lat = members.iter().map(|m| m.position.lat).sum::<f64>() / n;
            let lng = members.iter().map(|m| m.position.lng).sum::<f64>() / n;
            MarkerCluster {
                center: GeoPoint { lat, lng },
                billboard_ids: members.iter().map(|m| m.billboard_id.clone()).collect(),
            }
        })
        .collect()
}

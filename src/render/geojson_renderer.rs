use super::clustering::cluster_markers;
use super::{MapProvider, MapRenderer, PolylineLayer};
use crate::error::Result;
use crate::models::GeoPoint;
use crate::services::markers::PlacedMarker;
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use std::collections::BTreeMap;

pub const DEFAULT_ZOOM: u8 = 12;

/// Headless renderer that keeps the drawn scene and exports it as GeoJSON.
///
/// Markers are clustered for the current zoom on export.
#[derive(Debug, Clone)]
pub struct GeoJsonRenderer {
    provider: MapProvider,
    markers: Vec<PlacedMarker>,
    polylines: BTreeMap<PolylineLayer, Vec<GeoPoint>>,
    polygon: Vec<GeoPoint>,
    center: Option<GeoPoint>,
    zoom: u8,
}

impl GeoJsonRenderer {
    pub fn new(provider: MapProvider) -> Self {
        GeoJsonRenderer {
            provider,
            markers: Vec::new(),
            polylines: BTreeMap::new(),
            polygon: Vec::new(),
            center: None,
            zoom: DEFAULT_ZOOM,
        }
    }

    pub fn markers(&self) -> &[PlacedMarker] {
        &self.markers
    }

    pub fn polyline(&self, layer: PolylineLayer) -> &[GeoPoint] {
        self.polylines.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn polygon(&self) -> &[GeoPoint] {
        &self.polygon
    }

    pub fn center(&self) -> Option<GeoPoint> {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut features = Vec::new();

        for cluster in cluster_markers(&self.markers, self.zoom) {
            let mut properties = JsonObject::new();
            let id = if cluster.is_single() {
                properties.insert("kind".to_string(), json!("billboard"));
                let marker = self
                    .markers
                    .iter()
                    .find(|m| m.billboard_id == cluster.billboard_ids[0]);
                if let Some(marker) = marker {
                    properties.insert("name".to_string(), json!(marker.name));
                    properties.insert("status".to_string(), json!(marker.status.to_string()));
                }
                cluster.billboard_ids[0].clone()
            } else {
                properties.insert("kind".to_string(), json!("cluster"));
                properties.insert("count".to_string(), json!(cluster.count()));
                format!("cluster:{}", cluster.billboard_ids.join(","))
            };

            features.push(feature(
                Value::Point(position(&cluster.center)),
                Some(id),
                properties,
            ));
        }

        for (layer, points) in &self.polylines {
            if points.len() < 2 {
                continue;
            }
            let mut properties = JsonObject::new();
            properties.insert("kind".to_string(), json!(layer));
            features.push(feature(
                Value::LineString(points.iter().map(position).collect()),
                None,
                properties,
            ));
        }

        if self.polygon.len() >= 3 {
            let mut ring: Vec<Vec<f64>> = self.polygon.iter().map(position).collect();
            // GeoJSON rings are explicitly closed
            ring.push(position(&self.polygon[0]));
            let mut properties = JsonObject::new();
            properties.insert("kind".to_string(), json!("selection"));
            features.push(feature(Value::Polygon(vec![ring]), None, properties));
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_feature_collection())?)
    }
}

impl MapRenderer for GeoJsonRenderer {
    fn provider(&self) -> MapProvider {
        self.provider
    }

    fn render_markers(&mut self, markers: &[PlacedMarker]) {
        tracing::trace!(provider = %self.provider, count = markers.len(), "Rendering markers");
        self.markers = markers.to_vec();
    }

    fn render_polyline(&mut self, layer: PolylineLayer, points: &[GeoPoint]) {
        if points.is_empty() {
            self.polylines.remove(&layer);
        } else {
            self.polylines.insert(layer, points.to_vec());
        }
    }

    fn render_polygon(&mut self, points: &[GeoPoint]) {
        self.polygon = points.to_vec();
    }

    fn pan_to(&mut self, center: GeoPoint) {
        self.center = Some(center);
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.min(22);
    }

    fn export_geojson(&self) -> Option<String> {
        self.to_geojson_string().ok()
    }
}

fn position(point: &GeoPoint) -> Vec<f64> {
    vec![point.lng, point.lat]
}

fn feature(value: Value, id: Option<String>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: id.map(Id::String),
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillboardStatus;

    fn marker(id: &str, lat: f64, lng: f64) -> PlacedMarker {
        PlacedMarker {
            billboard_id: id.to_string(),
            name: format!("Board {id}"),
            status: BillboardStatus::Reserved,
            position: GeoPoint { lat, lng },
        }
    }

    #[test]
    fn test_exports_scene_as_feature_collection() {
        let mut renderer = GeoJsonRenderer::new(MapProvider::OpenStreetMap);
        renderer.set_zoom(16);
        renderer.render_markers(&[marker("a", 32.88, 13.19)]);
        renderer.render_polyline(
            PolylineLayer::PlannedRoute,
            &[GeoPoint { lat: 32.88, lng: 13.19 }, GeoPoint { lat: 32.89, lng: 13.20 }],
        );
        renderer.render_polygon(&[
            GeoPoint { lat: 32.0, lng: 13.0 },
            GeoPoint { lat: 33.0, lng: 13.0 },
            GeoPoint { lat: 33.0, lng: 14.0 },
        ]);

        let collection = renderer.to_feature_collection();
        assert_eq!(collection.features.len(), 3);

        let raw = renderer.to_geojson_string().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        // lng first
        assert_eq!(json["features"][0]["geometry"]["coordinates"][0], 13.19);
        assert_eq!(json["features"][0]["properties"]["status"], "reserved");
        assert_eq!(json["features"][1]["properties"]["kind"], "planned_route");
        let ring = &json["features"][2]["geometry"]["coordinates"][0];
        assert_eq!(ring.as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_empty_polyline_clears_layer() {
        let mut renderer = GeoJsonRenderer::new(MapProvider::Google);
        let points = [GeoPoint { lat: 32.0, lng: 13.0 }, GeoPoint { lat: 32.1, lng: 13.1 }];
        renderer.render_polyline(PolylineLayer::RecordedTrack, &points);
        assert_eq!(renderer.polyline(PolylineLayer::RecordedTrack).len(), 2);

        renderer.render_polyline(PolylineLayer::RecordedTrack, &[]);
        assert!(renderer.polyline(PolylineLayer::RecordedTrack).is_empty());
        assert!(renderer.to_feature_collection().features.is_empty());
    }

    #[test]
    fn test_nearby_markers_export_as_cluster() {
        let mut renderer = GeoJsonRenderer::new(MapProvider::OpenStreetMap);
        renderer.set_zoom(5);
        renderer.render_markers(&[marker("a", 32.88, 13.19), marker("b", 32.89, 13.18)]);

        let collection = renderer.to_feature_collection();
        assert_eq!(collection.features.len(), 1);
        let properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["count"], 2);
    }
}

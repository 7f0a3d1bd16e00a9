use crate::models::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillboardStatus {
    #[default]
    Available,
    Soon,
    Reserved,
}

impl fmt::Display for BillboardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BillboardStatus::Available => "available",
            BillboardStatus::Soon => "soon",
            BillboardStatus::Reserved => "reserved",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for BillboardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" | "free" => Ok(BillboardStatus::Available),
            "soon" | "expiring" => Ok(BillboardStatus::Soon),
            "reserved" | "booked" => Ok(BillboardStatus::Reserved),
            _ => Err(format!("Invalid billboard status: {}", s)),
        }
    }
}

/// One inventory row. Read-only to the navigation core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Billboard {
    pub id: String,
    pub name: String,
    /// Free-text landmark or street description
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub municipality: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub status: BillboardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    /// Raw `"lat,lng"` string as delivered by the inventory source
    #[serde(default)]
    pub coordinates: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Billboard {
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinates: impl Into<String>) -> Self {
        Billboard {
            id: id.into(),
            name: name.into(),
            location: String::new(),
            municipality: String::new(),
            city: String::new(),
            area: String::new(),
            size: String::new(),
            status: BillboardStatus::Available,
            expiry_date: None,
            coordinates: coordinates.into(),
            image_url: None,
        }
    }

    /// Parsed position, or `None` when the coordinate string is unusable.
    ///
    /// Unusable rows are excluded from every geospatial operation; that is
    /// not an error.
    pub fn position(&self) -> Option<GeoPoint> {
        let parsed = GeoPoint::parse(&self.coordinates);
        if parsed.is_none() {
            tracing::debug!(
                billboard_id = %self.id,
                coordinates = %self.coordinates,
                "Skipping billboard with unparseable coordinates"
            );
        }
        parsed
    }

    /// Name used in spoken and on-screen instructions
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Keep only billboards whose coordinates parse, paired with their position.
pub fn with_positions<'a, I>(billboards: I) -> Vec<(&'a Billboard, GeoPoint)>
where
    I: IntoIterator<Item = &'a Billboard>,
{
    billboards
        .into_iter()
        .filter_map(|b| b.position().map(|p| (b, p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("available".parse::<BillboardStatus>().unwrap(), BillboardStatus::Available);
        assert_eq!("SOON".parse::<BillboardStatus>().unwrap(), BillboardStatus::Soon);
        assert_eq!(" reserved ".parse::<BillboardStatus>().unwrap(), BillboardStatus::Reserved);
        assert!("gone".parse::<BillboardStatus>().is_err());
    }

    #[test]
    fn test_deserialize_inventory_row() {
        let json = r#"{
            "id": "B-17",
            "name": "Airport Road",
            "municipality": "Tripoli",
            "status": "soon",
            "expiryDate": "2026-12-01",
            "coordinates": "32.8872,13.1913",
            "imageUrl": "https://example.com/b17.jpg"
        }"#;
        let billboard: Billboard = serde_json::from_str(json).unwrap();
        assert_eq!(billboard.id, "B-17");
        assert_eq!(billboard.status, BillboardStatus::Soon);
        assert_eq!(billboard.expiry_date.as_deref(), Some("2026-12-01"));
        assert!(billboard.position().is_some());
    }

    #[test]
    fn test_unparseable_coordinates_are_excluded() {
        let rows = vec![
            Billboard::new("1", "ok", "32.5,14.5"),
            Billboard::new("2", "broken", "n/a"),
            Billboard::new("3", "empty", ""),
        ];
        let valid = with_positions(&rows);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].0.id, "1");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let b = Billboard::new("B-9", "  ", "32.5,14.5");
        assert_eq!(b.display_name(), "B-9");
    }
}

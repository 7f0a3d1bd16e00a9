use crate::error::Result;
use crate::models::{GeoPoint, RoutePoint};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

const EXTERNAL_DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/?api=1";

/// Snapshot of a tracking session handed to the clipboard or share sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    pub session_id: Uuid,
    pub track: Vec<RoutePoint>,
    /// Sorted for a stable output
    pub visited: Vec<String>,
    pub total_distance_m: f64,
    /// RFC 3339
    pub created_at: String,
}

impl SharePayload {
    pub fn new<'a, I>(session_id: Uuid, track: &[RoutePoint], visited: I, total_distance_m: f64) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut visited: Vec<String> = visited.into_iter().cloned().collect();
        visited.sort();

        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string());

        SharePayload {
            session_id,
            track: track.to_vec(),
            visited,
            total_distance_m,
            created_at,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Link that opens the stops in an external turn-by-turn app.
///
/// The first stop after `origin` is the destination when there is only
/// one; otherwise the last stop is the destination and the rest become
/// intermediate waypoints. `None` when there are no stops.
pub fn directions_url(origin: Option<GeoPoint>, stops: &[GeoPoint]) -> Option<String> {
    let (destination, via) = stops.split_last()?;

    let mut url = String::from(EXTERNAL_DIRECTIONS_URL);
    if let Some(origin) = origin {
        url.push_str("&origin=");
        url.push_str(&urlencoding::encode(&lat_lng(&origin)));
    }
    url.push_str("&destination=");
    url.push_str(&urlencoding::encode(&lat_lng(destination)));

    if !via.is_empty() {
        let waypoints: Vec<String> = via.iter().map(lat_lng).collect();
        url.push_str("&waypoints=");
        url.push_str(&urlencoding::encode(&waypoints.join("|")));
    }

    url.push_str("&travelmode=driving");
    Some(url)
}

fn lat_lng(point: &GeoPoint) -> String {
    format!("{:.6},{:.6}", point.lat, point.lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_payload_survives_json() {
        let track = vec![
            RoutePoint { lat: 32.0, lng: 13.0, timestamp: 1_700_000_000_000, speed: None },
            RoutePoint { lat: 32.001, lng: 13.0, timestamp: 1_700_000_005_000, speed: Some(4.2) },
        ];
        let visited: HashSet<String> = ["b2".to_string(), "b1".to_string()].into_iter().collect();

        let payload = SharePayload::new(Uuid::new_v4(), &track, &visited, 111.2);
        assert_eq!(payload.visited, vec!["b1", "b2"]);
        assert!(OffsetDateTime::parse(&payload.created_at, &Rfc3339).is_ok());

        let json = payload.to_json().unwrap();
        assert!(json.contains("totalDistanceM"));
        assert_eq!(SharePayload::from_json(&json).unwrap(), payload);
    }

    #[test]
    fn test_directions_url_encodes_waypoints() {
        let origin = GeoPoint { lat: 32.4, lng: 14.4 };
        let stops = [GeoPoint { lat: 32.5, lng: 14.5 }, GeoPoint { lat: 32.55, lng: 14.55 }];

        let url = directions_url(Some(origin), &stops).unwrap();
        assert!(url.contains("origin=32.400000%2C14.400000"));
        assert!(url.contains("destination=32.550000%2C14.550000"));
        assert!(url.contains("waypoints=32.500000%2C14.500000"));
        assert!(url.ends_with("travelmode=driving"));

        let single = directions_url(None, &stops[..1]).unwrap();
        assert!(!single.contains("origin="));
        assert!(!single.contains("waypoints="));
        assert!(directions_url(None, &[]).is_none());
    }
}

use billboard_nav::config::NavigationConfig;
use billboard_nav::geometry::RelativeDirection;
use billboard_nav::models::NavigationTarget;
use billboard_nav::services::proximity::ProximityTracker;
use std::sync::Arc;

mod common;
use common::{billboard, point, RecordingAlerts};

fn targets(ids: &[(&str, f64, f64)]) -> Vec<NavigationTarget> {
    ids.iter()
        .filter_map(|(id, lat, lng)| NavigationTarget::from_billboard(&billboard(id, *lat, *lng)))
        .collect()
}

#[test]
fn test_repeated_entry_alerts_once() {
    let alerts = Arc::new(RecordingAlerts::default());
    let mut tracker = ProximityTracker::new(&NavigationConfig::default(), alerts.clone());
    let targets = targets(&[("b1", 32.50, 14.50)]);

    let inside = point(32.5005, 14.50);
    let outside = point(32.505, 14.50);

    let mut visits = 0;
    for _ in 0..3 {
        visits += tracker.update(&inside, None, &targets).newly_visited.len();
        let away = tracker.update(&outside, None, &targets);
        assert!(away.newly_visited.is_empty());
    }

    assert_eq!(visits, 1);
    assert!(tracker.is_visited("b1"));
    assert_eq!(alerts.spoken().len(), 1);
    assert_eq!(alerts.vibration_count(), 1);
}

#[test]
fn test_reset_allows_alerts_again() {
    let alerts = Arc::new(RecordingAlerts::default());
    let mut tracker = ProximityTracker::new(&NavigationConfig::default(), alerts.clone());
    let targets = targets(&[("b1", 32.50, 14.50)]);
    let inside = point(32.5005, 14.50);

    tracker.update(&inside, None, &targets);
    tracker.reset();
    assert!(tracker.visited().is_empty());

    let update = tracker.update(&inside, None, &targets);
    assert_eq!(update.newly_visited.len(), 1);
    assert_eq!(alerts.spoken().len(), 2);
    assert_eq!(alerts.vibration_count(), 2);
}

#[test]
fn test_muted_visit_still_vibrates_and_speaks_after_unmute() {
    let alerts = Arc::new(RecordingAlerts::default());
    let mut tracker = ProximityTracker::new(&NavigationConfig::default(), alerts.clone());
    let targets = targets(&[("b1", 32.50, 14.50)]);
    let inside = point(32.5005, 14.50);

    tracker.set_sound_enabled(false);
    let update = tracker.update(&inside, None, &targets);
    assert_eq!(update.newly_visited.len(), 1);
    assert!(alerts.spoken().is_empty());
    assert_eq!(alerts.vibration_count(), 1);

    tracker.set_sound_enabled(true);
    let update = tracker.update(&inside, None, &targets);
    assert!(update.newly_visited.is_empty());
    assert_eq!(alerts.spoken().len(), 1);
    assert_eq!(alerts.vibration_count(), 1);
}

#[test]
fn test_nearby_ranked_and_capped() {
    let config = NavigationConfig {
        nearby_limit: 2,
        ..NavigationConfig::default()
    };
    let alerts = Arc::new(RecordingAlerts::default());
    let mut tracker = ProximityTracker::new(&config, alerts);
    let targets = targets(&[
        ("third", 32.51, 14.50),
        ("first", 32.501, 14.50),
        ("second", 32.505, 14.50),
        ("beyond", 32.60, 14.50),
    ]);

    let update = tracker.update(&point(32.50, 14.50), None, &targets);
    let ids: Vec<&str> = update.nearby.iter().map(|n| n.billboard_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
    assert!(update.nearby[0].distance_m < update.nearby[1].distance_m);
}

#[test]
fn test_direction_follows_heading() {
    let alerts = Arc::new(RecordingAlerts::default());
    let mut tracker = ProximityTracker::new(&NavigationConfig::default(), alerts);
    // Target due north of the user
    let targets = targets(&[("north", 32.51, 14.50)]);
    let here = point(32.50, 14.50);

    let facing_north = tracker.update(&here, Some(0.0), &targets);
    assert_eq!(facing_north.nearby[0].direction, RelativeDirection::Ahead);

    let facing_south = tracker.update(&here, Some(180.0), &targets);
    assert_eq!(facing_south.nearby[0].direction, RelativeDirection::Behind);

    let facing_east = tracker.update(&here, Some(90.0), &targets);
    assert_eq!(facing_east.nearby[0].direction, RelativeDirection::Left);
}

#[test]
fn test_visited_flag_survives_leaving() {
    let alerts = Arc::new(RecordingAlerts::default());
    let mut tracker = ProximityTracker::new(&NavigationConfig::default(), alerts);
    let targets = targets(&[("b1", 32.50, 14.50)]);

    tracker.update(&point(32.5005, 14.50), None, &targets);
    let later = tracker.update(&point(32.51, 14.50), None, &targets);

    assert_eq!(later.nearby.len(), 1);
    assert!(later.nearby[0].visited);
}

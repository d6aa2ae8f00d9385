//! Integration tests for the pointer tracker and coordinate mapping.
//!
//! Tests cover:
//! - Lock acquisition on the largest blob
//! - Lock stickiness when nothing is within the search radius
//! - Nearest-neighbour reacquisition regardless of blob size
//! - The optional non-sticky policy
//! - Camera to display rescaling

mod common;

use arcade_tracker::config::TrackerConfig;
use arcade_tracker::detection::{CoordinateMapper, PointerTracker, TrackPhase};
use arcade_tracker::{Point, Resolution};

use common::*;

const CAMERA: Resolution = Resolution::new(640, 480);

fn sticky_tracker() -> PointerTracker {
    PointerTracker::new(CAMERA, &TrackerConfig::default())
}

fn locked_at(x: f32, y: f32) -> PointerTracker {
    let mut tracker = sticky_tracker();
    let update = tracker.update(&[make_blob(1, x, y, 400)]);
    assert!(update.found);
    tracker
}

#[test]
fn test_starts_searching_at_frame_center() {
    let tracker = sticky_tracker();
    assert_eq!(tracker.state().phase, TrackPhase::Searching);
    assert_eq!(tracker.state().last_position, Point::new(320.0, 240.0));
    assert_eq!(tracker.state().search_radius, 150.0);
    assert!(tracker.sticky_lock());
}

#[test]
fn test_lock_acquisition() {
    let mut tracker = sticky_tracker();

    let update = tracker.update(&[make_blob(1, 100.0, 120.0, 400)]);

    assert!(update.found);
    assert_eq!(update.position, Point::new(100.0, 120.0));
    assert!(tracker.state().is_locked());
    assert_eq!(tracker.state().last_position, Point::new(100.0, 120.0));
}

#[test]
fn test_searching_picks_largest_blob() {
    let mut tracker = sticky_tracker();

    let update = tracker.update(&[
        make_blob(1, 50.0, 50.0, 100),
        make_blob(2, 500.0, 300.0, 900),
        make_blob(3, 200.0, 400.0, 300),
    ]);

    assert_eq!(update.position, Point::new(500.0, 300.0));
}

#[test]
fn test_no_blob_while_searching_is_not_found() {
    let mut tracker = sticky_tracker();

    let update = tracker.update(&[]);

    assert!(!update.found);
    assert_eq!(tracker.state().phase, TrackPhase::Searching);
    assert_eq!(update.position, Point::new(320.0, 240.0));
}

#[test]
fn test_lock_stickiness() {
    let mut tracker = locked_at(100.0, 100.0);

    // A brighter, larger target far away must not steal the lock
    let update = tracker.update(&[make_blob(2, 400.0, 100.0, 5000)]);

    assert!(!update.found);
    assert!(tracker.state().is_locked());
    assert_eq!(tracker.state().last_position, Point::new(100.0, 100.0));
    assert_eq!(update.position, Point::new(100.0, 100.0));
}

#[test]
fn test_candidate_exactly_at_search_radius_is_rejected() {
    let mut tracker = locked_at(100.0, 100.0);

    let update = tracker.update(&[make_blob(2, 250.0, 100.0, 400)]);

    assert!(!update.found);
    assert_eq!(tracker.state().last_position, Point::new(100.0, 100.0));
}

#[test]
fn test_nearest_neighbour_reacquire() {
    let mut tracker = locked_at(100.0, 100.0);

    let update = tracker.update(&[
        make_blob(2, 200.0, 100.0, 5000),
        make_blob(3, 130.0, 100.0, 60),
    ]);

    assert!(update.found);
    assert_eq!(update.position, Point::new(130.0, 100.0));
}

#[test]
fn test_frozen_lock_recovers_when_target_returns() {
    let mut tracker = locked_at(100.0, 100.0);

    assert!(!tracker.update(&[]).found);
    assert!(!tracker.update(&[make_blob(2, 600.0, 400.0, 900)]).found);
    let update = tracker.update(&[make_blob(3, 110.0, 95.0, 200)]);

    assert!(update.found);
    assert_eq!(update.position, Point::new(110.0, 95.0));
}

#[test]
fn test_non_sticky_lock_demotes_on_miss() {
    let config = TrackerConfig {
        sticky_lock: false,
        ..TrackerConfig::default()
    };
    let mut tracker = PointerTracker::new(CAMERA, &config);
    tracker.update(&[make_blob(1, 100.0, 100.0, 400)]);

    let miss = tracker.update(&[make_blob(2, 500.0, 400.0, 400)]);
    assert!(!miss.found);
    assert_eq!(tracker.state().phase, TrackPhase::Searching);

    // Searching again, the far blob is now fair game
    let update = tracker.update(&[make_blob(2, 500.0, 400.0, 400)]);
    assert!(update.found);
    assert_eq!(update.position, Point::new(500.0, 400.0));
}

#[test]
fn test_reset_returns_to_searching() {
    let mut tracker = locked_at(100.0, 100.0);

    tracker.reset();

    assert_eq!(tracker.state().phase, TrackPhase::Searching);
    assert_eq!(tracker.state().last_position, Point::new(320.0, 240.0));
    let update = tracker.update(&[make_blob(2, 600.0, 400.0, 400)]);
    assert_eq!(update.position, Point::new(600.0, 400.0));
}

#[test]
fn test_coordinate_mapping_rescales_and_truncates() {
    let mapper = CoordinateMapper::new(CAMERA, Resolution::new(800, 480));

    assert_eq!(mapper.map(&Point::new(320.0, 240.0)), Point::new(400.0, 240.0));
    assert_eq!(mapper.map(&Point::new(100.0, 100.0)), Point::new(125.0, 100.0));
    assert_eq!(mapper.map(&Point::new(1.0, 1.5)), Point::new(1.0, 1.0));
    assert_eq!(mapper.map(&Point::new(0.0, 0.0)), Point::new(0.0, 0.0));
}

//! Integration tests for course rasterization and path validation.

use arcade_tracker::course::{is_in_zone, Zone};
use arcade_tracker::{CourseDefinition, CourseMask, PathValidator, Point, Resolution};
use image::{GrayImage, Luma};
use std::sync::Arc;

fn straight_course() -> CourseDefinition {
    CourseDefinition {
        resolution: Resolution::new(800, 480),
        waypoints: vec![Point::new(100.0, 240.0), Point::new(700.0, 240.0)],
        track_width: 50,
        pad_radius: 25,
        start_zone_radius: 30.0,
        end_zone_radius: 30.0,
    }
}

fn validator(definition: &CourseDefinition) -> anyhow::Result<PathValidator> {
    Ok(PathValidator::new(Arc::new(CourseMask::build(definition)?)))
}

#[test]
fn test_straight_stroke_end_to_end() -> anyhow::Result<()> {
    let validator = validator(&straight_course())?;

    for x in (100..=700).step_by(10) {
        assert!(
            validator.is_on_track(&Point::new(x as f32, 240.0)),
            "sample at x={} should be on track",
            x
        );
    }

    assert!(!validator.is_on_track(&Point::new(400.0, 280.0)));
    assert!(!validator.is_on_track(&Point::new(400.0, 200.0)));
    Ok(())
}

#[test]
fn test_stroke_width() -> anyhow::Result<()> {
    let validator = validator(&straight_course())?;

    assert!(validator.is_on_track(&Point::new(400.0, 222.0)));
    assert!(validator.is_on_track(&Point::new(400.0, 258.0)));
    assert!(!validator.is_on_track(&Point::new(400.0, 270.0)));
    assert!(!validator.is_on_track(&Point::new(400.0, 210.0)));
    Ok(())
}

#[test]
fn test_fail_closed_bounds() -> anyhow::Result<()> {
    let validator = validator(&straight_course())?;

    assert!(!validator.is_on_track(&Point::new(-1.0, 240.0)));
    assert!(!validator.is_on_track(&Point::new(800.0, 240.0)));
    assert!(!validator.is_on_track(&Point::new(400.0, 480.0)));
    assert!(!validator.is_on_track(&Point::new(400.0, -0.5)));
    assert!(!validator.is_on_track(&Point::new(f32::NAN, 240.0)));
    assert!(!validator.is_on_track(&Point::new(10.0, 10.0)));
    Ok(())
}

#[test]
fn test_positions_truncate_to_cells() -> anyhow::Result<()> {
    let validator = validator(&straight_course())?;

    assert!(validator.is_on_track(&Point::new(400.9, 240.9)));
    assert!(!validator.is_on_track(&Point::new(799.5, 10.0)));
    Ok(())
}

#[test]
fn test_zones_are_strict() -> anyhow::Result<()> {
    let validator = validator(&straight_course())?;
    let start = Point::new(100.0, 240.0);

    assert!(is_in_zone(&Point::new(129.0, 240.0), &start, 30.0));
    assert!(!is_in_zone(&Point::new(130.0, 240.0), &start, 30.0));
    assert!(validator.is_in_zone(&Point::new(100.0, 240.0), &start, 30.0));

    assert!(validator.in_start_zone(&Point::new(110.0, 250.0)));
    assert!(!validator.in_start_zone(&Point::new(700.0, 240.0)));
    assert!(validator.in_end_zone(&Point::new(690.0, 240.0)));
    assert!(!validator.in_end_zone(&Point::new(670.0, 240.0)));
    Ok(())
}

#[test]
fn test_zone_contains() {
    let zone = Zone {
        center: Point::new(0.0, 0.0),
        radius: 5.0,
    };
    assert!(zone.contains(&Point::new(3.0, 3.9)));
    assert!(!zone.contains(&Point::new(3.0, 4.0)));
}

#[test]
fn test_default_course_covers_every_waypoint() -> anyhow::Result<()> {
    let definition = CourseDefinition::default();
    let validator = validator(&definition)?;

    for waypoint in &definition.waypoints {
        assert!(validator.is_on_track(waypoint), "{:?} should be on track", waypoint);
    }
    // Midpoint of the climb from (350,100) to (400,380)
    assert!(validator.is_on_track(&Point::new(375.0, 240.0)));
    assert!(!validator.is_on_track(&Point::new(400.0, 20.0)));

    let course = validator.course();
    assert_eq!(course.resolution(), Resolution::new(800, 480));
    assert_eq!(course.start_zone().center, Point::new(50.0, 240.0));
    assert_eq!(course.end_zone().center, Point::new(750.0, 240.0));
    Ok(())
}

#[test]
fn test_gate_resamples_course_to_camera() -> anyhow::Result<()> {
    let course = CourseMask::build(&CourseDefinition::default())?;
    let mut mask = GrayImage::from_pixel(640, 480, Luma([255]));
    // Course waypoint (400,380) sits at camera (320,380)
    mask.put_pixel(330, 380, Luma([0]));

    let gated = course.gate(&mask);

    assert_eq!(gated.dimensions(), (640, 480));
    assert_eq!(gated.get_pixel(320, 380)[0], 255);
    assert_eq!(gated.get_pixel(330, 380)[0], 0);
    assert_eq!(gated.get_pixel(8, 8)[0], 0);
    Ok(())
}

#[test]
fn test_build_rejects_empty_course() {
    let definition = CourseDefinition {
        waypoints: Vec::new(),
        ..CourseDefinition::default()
    };
    assert!(CourseMask::build(&definition).is_err());

    let definition = CourseDefinition {
        track_width: 0,
        ..CourseDefinition::default()
    };
    assert!(CourseMask::build(&definition).is_err());
}

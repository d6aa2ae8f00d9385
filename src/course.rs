//! Course legality raster for tracing games.
//!
//! A course is a polyline of waypoints stroked at a fixed width, with round
//! joins and a circular pad at each end. It is rasterized once into a
//! `GrayImage` where 255 marks an on-track pixel and is read-only afterwards.

use anyhow::{ensure, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point as RasterPoint;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::detection::Mask;
use crate::models::{Point, Resolution};

const ON_TRACK: Luma<u8> = Luma([255]);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseDefinition {
    pub resolution: Resolution,
    pub waypoints: Vec<Point>,
    pub track_width: u32,
    pub pad_radius: u32,
    pub start_zone_radius: f32,
    pub end_zone_radius: f32,
}

impl Default for CourseDefinition {
    fn default() -> Self {
        let track_width = 50;
        Self {
            resolution: Resolution::new(800, 480),
            waypoints: vec![
                Point::new(50.0, 240.0),
                Point::new(150.0, 240.0),
                Point::new(200.0, 100.0),
                Point::new(350.0, 100.0),
                Point::new(400.0, 380.0),
                Point::new(550.0, 380.0),
                Point::new(600.0, 240.0),
                Point::new(750.0, 240.0),
            ],
            track_width,
            pad_radius: track_width - 5,
            start_zone_radius: (track_width / 2 + 5) as f32,
            end_zone_radius: 30.0,
        }
    }
}

/// A circular target area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub center: Point,
    pub radius: f32,
}

impl Zone {
    pub fn contains(&self, position: &Point) -> bool {
        is_in_zone(position, &self.center, self.radius)
    }
}

/// True iff `position` lies strictly inside the circle
pub fn is_in_zone(position: &Point, zone_center: &Point, zone_radius: f32) -> bool {
    position.distance(zone_center) < zone_radius
}

#[derive(Debug, Clone)]
pub struct CourseMask {
    grid: GrayImage,
    start: Zone,
    end: Zone,
}

impl CourseMask {
    pub fn build(definition: &CourseDefinition) -> Result<Self> {
        ensure!(
            !definition.waypoints.is_empty(),
            "A course needs at least one waypoint"
        );
        ensure!(definition.track_width > 0, "Track width must be positive");
        let Resolution { width, height } = definition.resolution;
        ensure!(width > 0 && height > 0, "Course resolution must be non-empty");

        let mut grid = GrayImage::new(width, height);
        let half_width = definition.track_width as f32 / 2.0;

        for segment in definition.waypoints.windows(2) {
            stroke_segment(&mut grid, &segment[0], &segment[1], half_width);
        }
        for waypoint in &definition.waypoints {
            let (x, y) = round_pixel(waypoint);
            draw_filled_circle_mut(&mut grid, (x, y), half_width.round() as i32, ON_TRACK);
        }

        let first = definition.waypoints[0];
        let last = definition.waypoints[definition.waypoints.len() - 1];
        for pad in [first, last] {
            draw_filled_circle_mut(
                &mut grid,
                round_pixel(&pad),
                definition.pad_radius as i32,
                ON_TRACK,
            );
        }

        debug!(
            width,
            height,
            waypoints = definition.waypoints.len(),
            "Course rasterized"
        );

        Ok(Self {
            grid,
            start: Zone {
                center: first,
                radius: definition.start_zone_radius,
            },
            end: Zone {
                center: last,
                radius: definition.end_zone_radius,
            },
        })
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.grid.width(), self.grid.height())
    }

    pub fn grid(&self) -> &GrayImage {
        &self.grid
    }

    pub fn start_zone(&self) -> &Zone {
        &self.start
    }

    pub fn end_zone(&self) -> &Zone {
        &self.end
    }

    /// Cell lookup; anything outside the grid is off track
    pub fn cell(&self, position: &Point) -> bool {
        match self.resolution().cell(position) {
            Some((x, y)) => self.grid.get_pixel(x, y)[0] > 0,
            None => false,
        }
    }

    /// Keep only mask pixels that lie over the course, resampling the course to the mask size
    pub fn gate(&self, mask: &Mask) -> Mask {
        let course = if self.grid.dimensions() == mask.dimensions() {
            self.grid.clone()
        } else {
            imageops::resize(&self.grid, mask.width(), mask.height(), FilterType::Nearest)
        };
        GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            if mask.get_pixel(x, y)[0] > 0 && course.get_pixel(x, y)[0] > 0 {
                ON_TRACK
            } else {
                Luma([0])
            }
        })
    }
}

/// Samples a shared course at cursor positions
#[derive(Debug, Clone)]
pub struct PathValidator {
    course: Arc<CourseMask>,
}

impl PathValidator {
    pub fn new(course: Arc<CourseMask>) -> Self {
        Self { course }
    }

    pub fn course(&self) -> &CourseMask {
        &self.course
    }

    /// Fail-closed: false outside the grid and on every off-track cell
    pub fn is_on_track(&self, position: &Point) -> bool {
        self.course.cell(position)
    }

    pub fn is_in_zone(&self, position: &Point, zone_center: &Point, zone_radius: f32) -> bool {
        is_in_zone(position, zone_center, zone_radius)
    }

    pub fn in_start_zone(&self, position: &Point) -> bool {
        self.course.start_zone().contains(position)
    }

    pub fn in_end_zone(&self, position: &Point) -> bool {
        self.course.end_zone().contains(position)
    }
}

fn round_pixel(point: &Point) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}

/// Fill the rectangle of half-width `half_width` around the segment a-b
fn stroke_segment(grid: &mut GrayImage, a: &Point, b: &Point, half_width: f32) {
    let length = a.distance(b);
    if length == 0.0 {
        return;
    }
    let nx = -(b.y - a.y) / length * half_width;
    let ny = (b.x - a.x) / length * half_width;

    let corners = [
        Point::new(a.x + nx, a.y + ny),
        Point::new(b.x + nx, b.y + ny),
        Point::new(b.x - nx, b.y - ny),
        Point::new(a.x - nx, a.y - ny),
    ];
    let polygon: Vec<RasterPoint<i32>> = corners
        .iter()
        .map(|c| {
            let (x, y) = round_pixel(c);
            RasterPoint::new(x, y)
        })
        .collect();

    draw_polygon_mut(grid, &polygon, ON_TRACK);
}

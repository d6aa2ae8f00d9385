use crate::models::{Point, Resolution};

/// Rescale `point` from `source` resolution into `target` resolution, per axis
pub fn map_point(point: &Point, source: Resolution, target: Resolution) -> Point {
    Point::new(
        point.x / source.width as f32 * target.width as f32,
        point.y / source.height as f32 * target.height as f32,
    )
}

/// Camera space to game space
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    pub source: Resolution,
    pub target: Resolution,
}

impl CoordinateMapper {
    pub fn new(source: Resolution, target: Resolution) -> Self {
        Self { source, target }
    }

    /// Rescaled point, truncated to whole pixels for raster sampling
    pub fn map(&self, point: &Point) -> Point {
        let scaled = map_point(point, self.source, self.target);
        let (x, y) = scaled.to_pixel();
        Point::new(x as f32, y as f32)
    }
}

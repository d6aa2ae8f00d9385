use serde::{Deserialize, Serialize};

/// A position in either camera space or game space, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Move `alpha` of the way towards `target`
    pub fn lerp(&self, target: &Point, alpha: f32) -> Point {
        Point::new(
            self.x + (target.x - self.x) * alpha,
            self.y + (target.y - self.y) * alpha,
        )
    }

    /// Integer pixel coordinates, truncated towards zero
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Pixel cell containing `point`, or None when it falls outside the grid
    pub fn cell(&self, point: &Point) -> Option<(u32, u32)> {
        if !(point.x >= 0.0 && point.y >= 0.0) {
            return None;
        }
        let (x, y) = (point.x as u32, point.y as u32);
        if x < self.width && y < self.height {
            Some((x, y))
        } else {
            None
        }
    }
}

/// A connected region of in-band pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub label: u32,
    pub centroid: Point,
    pub area: u32,
}

/// The per-tick pointer every game consumes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cursor {
    pub position: Point,
    pub active: bool,
}

impl Cursor {
    pub fn active(position: Point) -> Self {
        Self { position, active: true }
    }

    pub fn inactive(position: Point) -> Self {
        Self { position, active: false }
    }
}

/// Axis-aligned screen rectangle; the right and bottom edges are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grow by `dw` x `dh` around the same center
    pub fn inflate(&self, dw: f32, dh: f32) -> Rect {
        Rect::new(
            self.x - dw / 2.0,
            self.y - dh / 2.0,
            self.width + dw,
            self.height + dh,
        )
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

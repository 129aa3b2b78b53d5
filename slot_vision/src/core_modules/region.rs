// THEORY:
// A `Region` is one candidate parking slot in one frame: the four corners of the
// axis-aligned box around a marker contour, listed clockwise from the top-left.
//
// Regions are "dumb" snapshots. They are rebuilt from the marker every frame, carry
// no identity, and are never mutated. Two regions at the same spot in consecutive
// frames are unrelated values.

/// A pixel coordinate. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in pixel extents: `width` and `height` count pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingRect {
    /// Width over height. A zero-height rectangle has ratio 0.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0 {
            self.width as f64 / self.height as f64
        } else {
            0.0
        }
    }
}

/// Four corners of a candidate slot, clockwise from top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    corners: [Point; 4],
}

impl Region {
    pub fn from_rect(rect: BoundingRect) -> Self {
        let BoundingRect { x, y, width, height } = rect;
        Self {
            corners: [
                Point::new(x, y),
                Point::new(x + width, y),
                Point::new(x + width, y + height),
                Point::new(x, y + height),
            ],
        }
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn width(&self) -> i32 {
        self.corners[1].x - self.corners[0].x
    }

    pub fn height(&self) -> i32 {
        self.corners[3].y - self.corners[0].y
    }

    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    pub fn aspect_ratio(&self) -> f64 {
        BoundingRect {
            x: self.corners[0].x,
            y: self.corners[0].y,
            width: self.width(),
            height: self.height(),
        }
        .aspect_ratio()
    }

    /// Mean of the corners, truncated. Used by renderers to place labels.
    pub fn center(&self) -> Point {
        let sum_x: i32 = self.corners.iter().map(|p| p.x).sum();
        let sum_y: i32 = self.corners.iter().map(|p| p.y).sum();
        Point::new(sum_x / 4, sum_y / 4)
    }
}

//! Geometry primitives for OCR detections
//!
//! Points and quadrilateral bounding boxes in image pixel coordinates.

use serde::{Deserialize, Serialize};

/// A point in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Arithmetic mean of two points
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Quadrilateral bounding box of a detection.
///
/// Corners are stored clockwise starting top-left, exactly as the OCR provider
/// emits them. The order is never re-derived from the coordinates, so a
/// rotated or skewed box keeps its logical "top-left" corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    corners: [Point; 4],
}

impl BoundingBox {
    /// Create a box from corners in top-left, top-right, bottom-right, bottom-left order
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            corners: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    /// Build a box from a flat `[x1, y1, ..., x4, y4]` slice.
    ///
    /// Returns `None` when fewer than eight coordinates are present; anything
    /// past the eighth value is ignored.
    pub fn from_coords(coords: &[f64]) -> Option<Self> {
        if coords.len() < 8 {
            return None;
        }

        let point = |i: usize| Point::new(coords[2 * i], coords[2 * i + 1]);
        Some(Self::new(point(0), point(1), point(2), point(3)))
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.corners[3]
    }

    /// Midpoint of the left edge
    pub fn left_mid(&self) -> Point {
        midpoint(self.bottom_left(), self.top_left())
    }

    /// Midpoint of the right edge
    pub fn right_mid(&self) -> Point {
        midpoint(self.bottom_right(), self.top_right())
    }

    /// Center of the box, taken between the left and right edge midpoints
    pub fn center_mid(&self) -> Point {
        midpoint(self.left_mid(), self.right_mid())
    }

    /// Length of the left-to-right midline
    pub fn width(&self) -> f64 {
        let (l, r) = (self.left_mid(), self.right_mid());
        (r.x - l.x).hypot(r.y - l.y)
    }

    /// Length of the top-to-bottom midline
    pub fn height(&self) -> f64 {
        let top = midpoint(self.top_left(), self.top_right());
        let bottom = midpoint(self.bottom_left(), self.bottom_right());
        (bottom.x - top.x).hypot(bottom.y - top.y)
    }
}

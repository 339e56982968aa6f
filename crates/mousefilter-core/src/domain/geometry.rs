//! 2-D geometry primitives used by every stage of the motion pipeline.
//!
//! Positions are `f64` in the host's global display coordinate space (pixels,
//! origin at the top-left of the primary display, Y growing downward).
//! Fractional coordinates are kept on purpose: the smoothing filter produces
//! sub-pixel positions and rounding them would make the exact-equality echo
//! check in the warp ledger meaningless.

use std::ops::{Add, AddAssign, Sub, SubAssign};

/// How far (in pixels) the synthesized position may run past the display
/// edges before it is clamped.
///
/// The real cursor is hard-clamped by the OS at the display edge.  Allowing
/// the synthesized track a little overscan keeps the filter from "sticking"
/// to the edge when the user pushes into it.
pub const OVERSCAN_MARGIN: f64 = 100.0;

/// An absolute position in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a point from its two coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between `self` and `other`.
    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A relative movement (delta) in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

impl Vector {
    /// The zero vector.
    pub const ZERO: Vector = Vector { dx: 0.0, dy: 0.0 };

    /// Creates a vector from its two components.
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

impl AddAssign<Vector> for Point {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.dx;
        self.y += rhs.dy;
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.dx += rhs.dx;
        self.dy += rhs.dy;
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.dx - rhs.dx, self.dy - rhs.dy)
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        self.dx -= rhs.dx;
        self.dy -= rhs.dy;
    }
}

/// The visible bounds of the active display.
///
/// `origin` is the top-left corner; the region spans `width × height` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBounds {
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl DisplayBounds {
    /// Creates bounds anchored at `(0, 0)`.
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            width,
            height,
        }
    }

    /// Rightmost X coordinate.
    pub fn right(&self) -> f64 {
        self.origin.x + self.width
    }

    /// Bottommost Y coordinate.
    pub fn bottom(&self) -> f64 {
        self.origin.y + self.height
    }

    /// Clamps `point` to these bounds expanded by `margin` on every side.
    pub fn clamp_with_margin(&self, point: Point, margin: f64) -> Point {
        Point::new(
            point.x.clamp(self.origin.x - margin, self.right() + margin),
            point.y.clamp(self.origin.y - margin, self.bottom() + margin),
        )
    }

    /// Returns `true` if `point` lies within the bounds expanded by `margin`.
    pub fn contains_with_margin(&self, point: Point, margin: f64) -> bool {
        point.x >= self.origin.x - margin
            && point.x <= self.right() + margin
            && point.y >= self.origin.y - margin
            && point.y <= self.bottom() + margin
    }
}

impl Default for DisplayBounds {
    fn default() -> Self {
        Self::from_size(1920.0, 1080.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(b.distance_to(a), 5.0);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = Point::new(400.0, 300.0);
        assert_eq!(p.distance_to(p), 0.0);
    }

    #[test]
    fn test_point_minus_point_is_vector() {
        let delta = Point::new(10.0, 20.0) - Point::new(4.0, 25.0);
        assert_eq!(delta, Vector::new(6.0, -5.0));
    }

    #[test]
    fn test_point_plus_vector_moves_point() {
        let mut p = Point::new(1.0, 1.0) + Vector::new(2.0, 3.0);
        assert_eq!(p, Point::new(3.0, 4.0));
        p += Vector::new(-3.0, -4.0);
        assert_eq!(p, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_clamp_with_margin_limits_both_axes() {
        // Arrange
        let bounds = DisplayBounds::from_size(1920.0, 1080.0);

        // Act
        let low = bounds.clamp_with_margin(Point::new(-5000.0, -5000.0), OVERSCAN_MARGIN);
        let high = bounds.clamp_with_margin(Point::new(9000.0, 9000.0), OVERSCAN_MARGIN);
        let inside = bounds.clamp_with_margin(Point::new(10.0, 20.0), OVERSCAN_MARGIN);

        // Assert
        assert_eq!(low, Point::new(-100.0, -100.0));
        assert_eq!(high, Point::new(2020.0, 1180.0));
        assert_eq!(inside, Point::new(10.0, 20.0));
    }

    #[test]
    fn test_clamp_with_margin_respects_non_zero_origin() {
        let bounds = DisplayBounds {
            origin: Point::new(-1280.0, 0.0),
            width: 1280.0,
            height: 1024.0,
        };
        let clamped = bounds.clamp_with_margin(Point::new(-3000.0, 2000.0), 100.0);
        assert_eq!(clamped, Point::new(-1380.0, 1124.0));
        assert!(bounds.contains_with_margin(clamped, 100.0));
    }
}

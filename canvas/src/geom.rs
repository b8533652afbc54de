//! Point and rectangle math shared by the store, selection, viewport and renderer.
//!
//! Everything here is pure: no module in this file knows about objects, ids or
//! history. Rectangles are axis-aligned with a top-left origin and non-negative
//! extent.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rotate this point by `degrees` clockwise (screen axes) around `pivot`.
    #[must_use]
    pub fn rotate_around(self, pivot: Point, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Self { x: pivot.x + dx * cos - dy * sin, y: pivot.y + dx * sin + dy * cos }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp both dimensions to at least `min`.
    #[must_use]
    pub fn clamped(self, min: f64) -> Self {
        Self { width: clamp_dimension(self.width, min), height: clamp_dimension(self.height, min) }
    }
}

/// Clamp a single dimension to `min`, mapping NaN to `min` as well.
#[must_use]
pub fn clamp_dimension(value: f64, min: f64) -> f64 {
    if value.is_nan() { min } else { value.max(min) }
}

/// Axis-aligned rectangle with top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized rectangle spanning two arbitrary corners (e.g. a marquee drag).
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { x: a.x.min(b.x), y: a.y.min(b.y), width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Corners in clockwise order starting at the top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    /// Whether `pt` lies inside or on the boundary.
    #[must_use]
    pub fn contains_point(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.right() && pt.y >= self.y && pt.y <= self.bottom()
    }

    /// Whether `other` lies entirely inside this rectangle (boundaries inclusive).
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x && other.y >= self.y && other.right() <= self.right() && other.bottom() <= self.bottom()
    }

    /// Whether the two rectangles overlap. Touching edges count as overlap.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right() && other.x <= self.right() && self.y <= other.bottom() && other.y <= self.bottom()
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    /// Grow every side by `amount`.
    #[must_use]
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect::new(self.x - amount, self.y - amount, self.width + amount * 2.0, self.height + amount * 2.0)
    }

    /// Axis-aligned bounds of this rectangle after rotating it by `degrees` around its center.
    #[must_use]
    pub fn rotated_bounds(&self, degrees: f64) -> Rect {
        if normalize_degrees(degrees).abs() < f64::EPSILON {
            return *self;
        }
        let center = self.center();
        let corners = self.corners().map(|c| c.rotate_around(center, degrees));
        bounding_box_of_points(&corners).unwrap_or(*self)
    }
}

/// Bounding box of a point cloud, `None` when empty.
#[must_use]
pub fn bounding_box_of_points(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

/// Union of a sequence of rectangles, `None` when empty.
pub fn union_all<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    rects.into_iter().reduce(|acc, r| acc.union(&r))
}

/// Round each axis of `pt` to the nearest multiple of `grid_size`.
///
/// A non-positive or non-finite grid leaves the point unchanged.
#[must_use]
pub fn snap(pt: Point, grid_size: f64) -> Point {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return pt;
    }
    Point::new((pt.x / grid_size).round() * grid_size, (pt.y / grid_size).round() * grid_size)
}

/// Normalize an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}

/// Shortest distance from `pt` to the segment `a`–`b`.
#[must_use]
pub fn distance_to_segment(pt: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return pt.distance(a);
    }
    let t = (((pt.x - a.x) * dx + (pt.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    pt.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Even-odd point-in-polygon test.
#[must_use]
pub fn point_in_polygon(pt: Point, polygon: &[Point]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > pt.y) != (pj.y > pt.y) && pt.x < (pj.x - pi.x) * (pt.y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

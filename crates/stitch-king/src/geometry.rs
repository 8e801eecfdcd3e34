//! Core geometry types for stitch-king.
//!
//! Everything here is plain data: points, segments, polylines, polygons
//! and the axis-aligned bounds derived from them. All coordinates are in
//! millimeters.
//!
//! ## Rust Lesson #3: Value Types
//!
//! `Point` derives `Copy`, so passing it around copies 16 bytes instead of
//! moving ownership. `Polygon` owns heap data (`Vec`) so it is only `Clone`:
//! duplicating it is always an explicit `.clone()` call.

use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A 3D point. Stitches carry a `z` for thread loft and twist jitter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A line segment defined by two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// An ordered sequence of points. Order is the stitch traversal direction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline {
    pub points: Vec<Point>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// A polygon with an exterior ring and optional holes.
///
/// Winding is not assumed anywhere: membership tests use even-odd ray
/// casting. The optional fields carry metadata picked up from SVG input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    /// Exterior ring (implicitly closed, first point is not repeated)
    pub exterior: Vec<Point>,
    /// Hole rings
    pub holes: Vec<Vec<Point>>,
    /// Optional ID from the SVG element
    pub id: Option<String>,
    /// Pattern family from a data-pattern attribute
    pub data_pattern: Option<String>,
    /// Stitch density from a data-density attribute
    pub data_density: Option<f64>,
    /// Fill angle from a data-angle attribute (degrees)
    pub data_angle: Option<f64>,
    /// Thread color from a data-color attribute
    pub data_color: Option<String>,
    /// Fill color of the SVG element
    pub fill_color: Option<String>,
    /// Stroke color of the SVG element
    pub stroke_color: Option<String>,
}

// ============================================================================
// IMPLEMENTATIONS
// ============================================================================

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Lift into 3D with the given height.
    #[inline]
    pub fn with_z(self, z: f64) -> Point3 {
        Point3::new(self.x, self.y, z)
    }

    /// Linear interpolation towards `other` (`t = 0` is self).
    #[inline]
    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl Point3 {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Drop the height component.
    #[inline]
    pub fn xy(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl Line {
    #[inline]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a segment from two points.
    #[inline]
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    #[inline]
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    #[inline]
    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// A polyline needs at least two points to be stitched.
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Total length: sum of consecutive segment distances.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// Append a point unless it coincides with the current last point.
    pub fn push_distinct(&mut self, p: Point) {
        match self.points.last() {
            Some(last) if last.distance(p) < 1e-9 => {}
            _ => self.points.push(p),
        }
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Polyline::new(points)
    }
}

impl Bounds {
    /// Compute bounds of a point set. `None` for an empty set.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        Some(Self { min_x, min_y, max_x, max_y })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    #[inline]
    pub fn diagonal(&self) -> f64 {
        let w = self.width();
        let h = self.height();
        (w * w + h * h).sqrt()
    }
}

impl Polygon {
    /// Create a simple polygon with no holes.
    pub fn new(exterior: Vec<Point>) -> Self {
        Self {
            exterior,
            ..Default::default()
        }
    }

    /// Create a polygon with holes.
    pub fn with_holes(exterior: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self {
            exterior,
            holes,
            ..Default::default()
        }
    }

    /// Axis-aligned rectangle, handy for tests and design files.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(vec![
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    /// Bounds of the exterior ring, recomputed on every call.
    ///
    /// ## Rust Lesson #6: Option<T>
    ///
    /// An empty ring has no bounds. Instead of returning NaNs we return
    /// `None` and let the caller decide what an empty shape means.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.exterior)
    }

    /// Calculate signed area of the exterior ring (shoelace formula).
    ///
    /// Positive for counter-clockwise winding in a y-up frame.
    #[inline]
    pub fn signed_area(&self) -> f64 {
        signed_area_of_points(&self.exterior)
    }
}

/// Calculate signed area of a point ring using the shoelace formula.
pub fn signed_area_of_points(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0);
    }

    #[test]
    fn polyline_length_sums_segments() {
        let pl = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(3.0, 10.0),
        ]);
        assert_eq!(pl.length(), 11.0);
        assert!(pl.is_usable());
        assert!(!Polyline::new(vec![Point::new(1.0, 1.0)]).is_usable());
    }

    #[test]
    fn push_distinct_skips_duplicates() {
        let mut pl = Polyline::default();
        pl.push_distinct(Point::new(1.0, 1.0));
        pl.push_distinct(Point::new(1.0, 1.0));
        pl.push_distinct(Point::new(2.0, 1.0));
        assert_eq!(pl.points.len(), 2);
    }

    #[test]
    fn polygon_bounds() {
        let poly = Polygon::rectangle(0.0, 0.0, 10.0, 5.0);
        let b = poly.bounds().unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 10.0, 5.0));
        assert_eq!(b.center(), Point::new(5.0, 2.5));
    }

    #[test]
    fn empty_polygon_bounds() {
        let poly = Polygon::new(vec![]);
        assert_eq!(poly.bounds(), None);
    }

    #[test]
    fn bounds_diagonal() {
        let b = Polygon::rectangle(0.0, 0.0, 3.0, 4.0).bounds().unwrap();
        assert_eq!(b.diagonal(), 5.0);
    }

    #[test]
    fn signed_area_follows_winding() {
        let ccw = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        assert!((ccw.signed_area() - 100.0).abs() < 1e-10);

        let mut cw = ccw.clone();
        cw.exterior.reverse();
        assert!((cw.signed_area() + 100.0).abs() < 1e-10);
    }
}

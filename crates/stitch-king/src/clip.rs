//! Geometry algorithms shared by every pattern generator.
//!
//! Point-in-polygon, segment intersection, the simplified sub-segment
//! clip used by fill, and the bisector polygon offset used by contour.
//! This is the hot path: fill calls `point_in_polygon` once per
//! stitch-length step of every candidate line.

use crate::geometry::{Line, Point};

/// Determinant magnitude below which two segments count as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-10;

// ============================================================================
// POINT IN POLYGON (Ray Casting Algorithm)
// ============================================================================

/// Test if a point is inside a ring using even-odd ray casting.
///
/// Casts a ray to the right and counts edge crossings. Winding order does
/// not matter. Points exactly on the boundary get a consistent but
/// unspecified answer.
#[inline]
pub fn point_in_polygon(px: f64, py: f64, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);

        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// Point form of [`point_in_polygon`].
#[inline]
pub fn contains(ring: &[Point], p: Point) -> bool {
    point_in_polygon(p.x, p.y, ring)
}

// ============================================================================
// SEGMENT-SEGMENT INTERSECTION
// ============================================================================

/// Result of a segment-segment intersection test.
///
/// ## Rust Lesson #10: Enums Carry Data
///
/// The `Point` variant carries the hit location plus both segment
/// parameters. A caller can't read `t` without first proving, via
/// `match` or `if let`, that there was a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    None,
    Point { x: f64, y: f64, t: f64, u: f64 },
}

impl Intersection {
    /// The hit location, if any.
    pub fn point(&self) -> Option<Point> {
        match *self {
            Intersection::Point { x, y, .. } => Some(Point::new(x, y)),
            Intersection::None => None,
        }
    }
}

/// Intersect segment `a1→a2` with segment `b1→b2`.
///
/// Standard parametric solve. Parallel segments (determinant below
/// [`PARALLEL_EPSILON`]) never intersect, and a hit only counts when both
/// `t` (along a) and `u` (along b) fall within `[0, 1]`.
#[inline]
pub fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Intersection {
    let denom = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);

    if denom.abs() < PARALLEL_EPSILON {
        return Intersection::None;
    }

    let t = ((b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x)) / denom;
    let u = ((a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x)) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Intersection::Point {
            x: a1.x + t * (a2.x - a1.x),
            y: a1.y + t * (a2.y - a1.y),
            t,
            u,
        }
    } else {
        Intersection::None
    }
}

/// First boundary crossing of segment `a→b`, walking the ring's edges in
/// order. Later crossings are ignored.
pub fn first_boundary_crossing(a: Point, b: Point, ring: &[Point]) -> Option<Point> {
    let n = ring.len();
    if n < 2 {
        return None;
    }

    (0..n).find_map(|i| {
        let j = (i + 1) % n;
        segment_intersection(a, b, ring[i], ring[j]).point()
    })
}

// ============================================================================
// SIMPLIFIED SEGMENT CLIPPING
// ============================================================================

/// Clip one short segment against a ring using endpoint membership only.
///
/// - both endpoints inside: kept whole, even if it leaves and re-enters
/// - exactly one inside: truncated at the first boundary crossing
/// - neither inside: dropped, even if it passes through the interior
///
/// Fill walks candidate lines in stitch-length steps, so the sub-segments
/// handed in here are short relative to the shape.
pub fn clip_segment(a: Point, b: Point, ring: &[Point]) -> Option<Line> {
    let a_in = contains(ring, a);
    let b_in = contains(ring, b);

    match (a_in, b_in) {
        (true, true) => Some(Line::from_points(a, b)),
        (true, false) => first_boundary_crossing(a, b, ring).map(|hit| Line::from_points(a, hit)),
        (false, true) => first_boundary_crossing(a, b, ring).map(|hit| Line::from_points(hit, b)),
        (false, false) => None,
    }
}

// ============================================================================
// POLYGON OFFSET (vertex bisector)
// ============================================================================

/// Left-hand unit normal of the edge `from→to`, or zero for a zero-length edge.
#[inline]
fn edge_normal(from: Point, to: Point) -> (f64, f64) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < PARALLEL_EPSILON {
        return (0.0, 0.0);
    }
    (-dy / len, dx / len)
}

/// Offset a ring by moving each vertex along the averaged normal of its
/// two adjacent edges.
///
/// Positive `distance` moves towards the left of the travel direction,
/// which is inward for a counter-clockwise ring in a y-up frame. Vertices
/// move by exactly `distance` along the bisector, so corners inset less
/// than a true parallel offset would. Concave rings and large distances
/// self-intersect; callers get that output as-is.
pub fn offset_polygon(ring: &[Point], distance: f64) -> Vec<Point> {
    let n = ring.len();
    if n < 3 {
        return ring.to_vec();
    }

    (0..n)
        .map(|i| {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];

            let (n1x, n1y) = edge_normal(prev, cur);
            let (n2x, n2y) = edge_normal(cur, next);

            let (mut ax, mut ay) = (n1x + n2x, n1y + n2y);
            let len = (ax * ax + ay * ay).sqrt();
            if len < PARALLEL_EPSILON {
                // Spike: the two normals cancel out. Fall back to whichever edge has one.
                (ax, ay) = if n1x != 0.0 || n1y != 0.0 { (n1x, n1y) } else { (n2x, n2y) };
            } else {
                ax /= len;
                ay /= len;
            }

            Point::new(cur.x + ax * distance, cur.y + ay * distance)
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

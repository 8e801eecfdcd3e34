//! Shared setup for region-based generators.
//!
//! Fill, contour, tartan and meander all start the same way: validate the
//! exterior ring, compute the bounds, derive center and diagonal.

use crate::error::StitchError;
use crate::geometry::{Bounds, Point, Polygon};

/// Context for region generation with pre-computed values.
///
/// # Example
/// ```ignore
/// let ctx = RegionContext::new(polygon)?;
/// // Now use ctx.center, ctx.diagonal, ctx.bounds.min_y, etc.
/// ```
#[derive(Debug, Clone)]
pub struct RegionContext<'a> {
    /// Reference to the polygon being stitched
    pub polygon: &'a Polygon,
    pub bounds: Bounds,
    /// Center of bounding box
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Diagonal length of bounding box
    pub diagonal: f64,
}

impl<'a> RegionContext<'a> {
    /// Validate the exterior ring and pre-compute bounds.
    ///
    /// Fails with `InvalidShape` when the exterior has fewer than 3 points
    /// or any non-finite coordinate. Holes are carried but not validated:
    /// no generator subtracts them.
    pub fn new(polygon: &'a Polygon) -> Result<Self, StitchError> {
        let ring = &polygon.exterior;
        if ring.len() < 3 {
            return Err(StitchError::InvalidShape(format!(
                "exterior ring needs at least 3 points, got {}",
                ring.len()
            )));
        }
        if !ring.iter().all(Point::is_finite) {
            return Err(StitchError::InvalidShape(
                "exterior ring has non-finite coordinates".into(),
            ));
        }

        let Some(bounds) = polygon.bounds() else {
            return Err(StitchError::InvalidShape("exterior ring is empty".into()));
        };

        Ok(Self {
            polygon,
            bounds,
            center: bounds.center(),
            width: bounds.width(),
            height: bounds.height(),
            diagonal: bounds.diagonal(),
        })
    }

    #[inline]
    pub fn exterior(&self) -> &[Point] {
        &self.polygon.exterior
    }

    /// Smaller of the two bounding-box dimensions.
    #[inline]
    pub fn min_dimension(&self) -> f64 {
        self.width.min(self.height)
    }
}

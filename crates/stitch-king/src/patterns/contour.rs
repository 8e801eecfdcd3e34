//! Contour fill: nested rings stepping inward from the exterior.
//!
//! Rings come from [`offset_polygon`], so concave shapes produce the
//! bisector offset's self-intersections unchanged.

use tracing::{debug, warn};

use super::util::RegionContext;
use super::{ContourParams, RawPattern};
use crate::clip::offset_polygon;
use crate::error::{require_positive, StitchError};
use crate::geometry::{signed_area_of_points, Polygon, Polyline};

/// Upper bound on rings per shape, whatever the spacing.
pub const MAX_CONTOUR_RINGS: usize = 500;

/// Generate contour rings, outermost first.
///
/// Ring `k` is offset inward by `k × spacing`. Rings stop once the offset
/// would exceed a quarter of the smaller bounding-box dimension, so there
/// are at most `1 + floor(min(w, h) / 4 / spacing)` of them. Every ring is
/// closed: its first point is repeated at the end.
pub fn generate_contour(polygon: &Polygon, params: &ContourParams) -> Result<Vec<RawPattern>, StitchError> {
    let spacing = require_positive("spacing", params.spacing)?;
    let ctx = RegionContext::new(polygon)?;
    let exterior = ctx.exterior();

    let limit = ctx.min_dimension() / 4.0;
    let mut max_k = (limit / spacing).floor() as usize;
    if max_k >= MAX_CONTOUR_RINGS {
        warn!(requested = max_k + 1, cap = MAX_CONTOUR_RINGS, spacing, "contour ring count capped");
        max_k = MAX_CONTOUR_RINGS - 1;
    }

    // Positive offsets move left of travel, which is inward only for CCW rings
    let inward = if signed_area_of_points(exterior) >= 0.0 { 1.0 } else { -1.0 };

    let rings: Vec<RawPattern> = (0..=max_k)
        .filter_map(|k| {
            let offset = k as f64 * spacing;
            let mut ring = if k == 0 {
                exterior.to_vec()
            } else {
                offset_polygon(exterior, inward * offset)
            };
            if ring.len() <= 2 {
                return None;
            }
            ring.push(ring[0]);
            Some(RawPattern::Contour { ring: Polyline::new(ring), ring_index: k, offset })
        })
        .collect();

    debug!(rings = rings.len(), spacing, "contour generated");
    Ok(rings)
}

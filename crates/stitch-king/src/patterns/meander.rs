//! Meander fill: one sine serpentine per horizontal band.
//!
//! Bands sit one stitch length apart and span the full bounding-box
//! width. Like tartan, nothing is clipped to the shape.

use std::f64::consts::PI;

use tracing::{debug, warn};

use super::util::RegionContext;
use super::{stitch_length_for_density, MeanderParams, RawPattern};
use crate::error::{require_positive, StitchError};
use crate::geometry::{Point, Polygon, Polyline};

/// Upper bound on bands per shape.
pub const MAX_MEANDER_BANDS: usize = 10_000;

/// Minimum samples along one band.
const MIN_SEGMENTS: usize = 8;

/// Generate meander bands, bottom band first.
///
/// Each band's vertical offset is `sin(phase × 4π) × 0.3 × spacing`, with
/// `phase` running from 0 to 1 across the bounding-box width: two full
/// waves per band.
pub fn generate_meander(polygon: &Polygon, params: &MeanderParams) -> Result<Vec<RawPattern>, StitchError> {
    let density = require_positive("density", params.density)?;
    let ctx = RegionContext::new(polygon)?;

    if ctx.width <= 0.0 {
        return Err(StitchError::DegenerateGeometry(
            "meander needs a shape with non-zero width".into(),
        ));
    }

    let spacing = stitch_length_for_density(density);
    let amplitude = 0.3 * spacing;
    let segments = ((ctx.width / spacing).ceil() as usize).max(MIN_SEGMENTS);

    let mut bands = (ctx.height / spacing).floor() as usize;
    if bands >= MAX_MEANDER_BANDS {
        warn!(requested = bands + 1, cap = MAX_MEANDER_BANDS, "meander band count capped");
        bands = MAX_MEANDER_BANDS - 1;
    }

    let b = ctx.bounds;
    let out: Vec<RawPattern> = (0..=bands)
        .map(|band_index| {
            let base_y = b.min_y + band_index as f64 * spacing;
            let points = (0..=segments)
                .map(|i| {
                    let phase = i as f64 / segments as f64;
                    Point::new(
                        b.min_x + phase * ctx.width,
                        base_y + (phase * 4.0 * PI).sin() * amplitude,
                    )
                })
                .collect();
            RawPattern::Meander { line: Polyline::new(points), band_index, amplitude }
        })
        .collect();

    debug!(bands = out.len(), spacing, "meander generated");
    Ok(out)
}

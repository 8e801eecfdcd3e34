//! Tartan fill: a crossed grid over the bounding box.
//!
//! Lines are not clipped to the shape. A non-rectangular shape gets grid
//! lines running past its boundary.

use tracing::{debug, warn};

use super::util::RegionContext;
use super::{RawPattern, TartanParams};
use crate::error::{require_positive, StitchError};
use crate::geometry::{Point, Polygon, Polyline};

/// Upper bound on lines per axis.
pub const MAX_TARTAN_LINES: usize = 10_000;

/// Generate horizontal lines, then vertical lines, every `stripe_spacing`
/// from the bounding-box minimum.
pub fn generate_tartan(polygon: &Polygon, params: &TartanParams) -> Result<Vec<RawPattern>, StitchError> {
    let stripe_width = require_positive("stripe_width", params.stripe_width)?;
    let spacing = require_positive("stripe_spacing", params.stripe_spacing)?;
    let ctx = RegionContext::new(polygon)?;
    let b = ctx.bounds;

    let mut out = Vec::new();

    // Zero-length lines appear when the box is flat on one axis
    if ctx.width > 0.0 {
        for k in 0..=axis_steps(ctx.height, spacing) {
            let y = b.min_y + k as f64 * spacing;
            out.push(RawPattern::Tartan {
                line: Polyline::new(vec![Point::new(b.min_x, y), Point::new(b.max_x, y)]),
                stripe_width,
                vertical: false,
            });
        }
    }

    if ctx.height > 0.0 {
        for k in 0..=axis_steps(ctx.width, spacing) {
            let x = b.min_x + k as f64 * spacing;
            out.push(RawPattern::Tartan {
                line: Polyline::new(vec![Point::new(x, b.min_y), Point::new(x, b.max_y)]),
                stripe_width,
                vertical: true,
            });
        }
    }

    debug!(lines = out.len(), spacing, "tartan generated");
    Ok(out)
}

fn axis_steps(extent: f64, spacing: f64) -> usize {
    let steps = (extent / spacing).floor() as usize;
    if steps >= MAX_TARTAN_LINES {
        warn!(requested = steps + 1, cap = MAX_TARTAN_LINES, "tartan line count capped");
        return MAX_TARTAN_LINES - 1;
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_over_rectangle() {
        let poly = Polygon::rectangle(0.0, 0.0, 10.0, 6.0);
        let params = TartanParams { stripe_width: 0.5, stripe_spacing: 2.0 };
        let lines = generate_tartan(&poly, &params).unwrap();

        // 4 horizontal (y = 0, 2, 4, 6) then 6 vertical (x = 0..10)
        let horizontal = lines.iter().filter(|l| matches!(l, RawPattern::Tartan { vertical: false, .. })).count();
        assert_eq!(horizontal, 4);
        assert_eq!(lines.len(), 10);
        assert!(matches!(lines[4], RawPattern::Tartan { vertical: true, .. }));
    }

    #[test]
    fn lines_ignore_the_shape_boundary() {
        // Triangle: the top horizontal line runs well outside it
        let tri = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)]);
        let lines = generate_tartan(&tri, &TartanParams { stripe_width: 1.0, stripe_spacing: 5.0 }).unwrap();
        let top = lines[2].polyline();
        assert_eq!(top.points, vec![Point::new(0.0, 10.0), Point::new(10.0, 10.0)]);
    }

    #[test]
    fn stripe_width_carried() {
        let poly = Polygon::rectangle(0.0, 0.0, 4.0, 4.0);
        let lines = generate_tartan(&poly, &TartanParams { stripe_width: 0.75, stripe_spacing: 4.0 }).unwrap();
        assert!(lines.iter().all(|l| l.width() == Some(0.75)));
    }

    #[test]
    fn negative_spacing_rejected() {
        let poly = Polygon::rectangle(0.0, 0.0, 4.0, 4.0);
        let err = generate_tartan(&poly, &TartanParams { stripe_width: 1.0, stripe_spacing: -1.0 }).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameters");
    }
}

//! Fill pattern: parallel rows at an angle, clipped to the shape.
//!
//! Rows are spaced at 80% of the stitch length so neighbouring rows
//! overlap slightly. Each row is walked in stitch-length steps and every
//! step is clipped on its own with [`clip_segment`], so a step whose two
//! ends both fall outside is dropped even when it crosses the interior.

use std::f64::consts::PI;

use tracing::{debug, warn};

use super::util::RegionContext;
use super::{stitch_length_for_density, FillParams, RawPattern, FILL_ROW_OVERLAP};
use crate::clip::clip_segment;
use crate::error::{require_positive, StitchError};
use crate::geometry::{Point, Polygon, Polyline};

/// Upper bound on rows in one fill pass.
pub const MAX_FILL_ROWS: usize = 10_000;
/// Upper bound on clip steps along one row.
pub const MAX_FILL_STEPS: usize = 10_000;

/// Generate fill rows for a polygon.
///
/// With `underlay` set, a second pass at double density rotated 90° is
/// generated first and prepended to the output.
pub fn generate_fill(polygon: &Polygon, params: &FillParams) -> Result<Vec<RawPattern>, StitchError> {
    let density = require_positive("density", params.density)?;
    require_finite_angle(params.angle)?;
    let ctx = RegionContext::new(polygon)?;

    let mut out = Vec::new();

    if params.underlay {
        let underlay_density = density * 2.0;
        let underlay_angle = params.angle + 90.0;
        out.extend(fill_pass(&ctx, underlay_density, underlay_angle).into_iter().map(|line| {
            RawPattern::Fill { line, angle: underlay_angle, density: underlay_density, underlay: true }
        }));
    }

    let underlay_count = out.len();
    out.extend(fill_pass(&ctx, density, params.angle).into_iter().map(|line| RawPattern::Fill {
        line,
        angle: params.angle,
        density,
        underlay: false,
    }));

    debug!(
        rows = out.len() - underlay_count,
        underlay_rows = underlay_count,
        density,
        angle = params.angle,
        "fill generated"
    );

    Ok(out)
}

/// Clipped fill rows without the `RawPattern` wrapper.
pub fn fill_lines(polygon: &Polygon, density: f64, angle_degrees: f64) -> Result<Vec<Polyline>, StitchError> {
    let density = require_positive("density", density)?;
    require_finite_angle(angle_degrees)?;
    let ctx = RegionContext::new(polygon)?;
    Ok(fill_pass(&ctx, density, angle_degrees))
}

fn require_finite_angle(angle: f64) -> Result<(), StitchError> {
    if angle.is_finite() {
        Ok(())
    } else {
        Err(StitchError::InvalidParameters(format!("angle must be finite, got {angle}")))
    }
}

/// One pass of parallel rows over the bounding-box diagonal.
fn fill_pass(ctx: &RegionContext, density: f64, angle_degrees: f64) -> Vec<Polyline> {
    let stitch_len = stitch_length_for_density(density);
    let spacing = stitch_len * FILL_ROW_OVERLAP;
    let angle_rad = angle_degrees * PI / 180.0;

    // Row direction, and the perpendicular rows are stepped along
    let (dir_x, dir_y) = (angle_rad.cos(), angle_rad.sin());
    let (perp_x, perp_y) = (-angle_rad.sin(), angle_rad.cos());

    let half = ctx.diagonal / 2.0;
    let Some(num_rows) = rows_each_side(half, spacing) else {
        return Vec::new();
    };
    let steps = row_steps(2.0 * half, stitch_len);
    let ring = ctx.exterior();

    let mut rows = Vec::new();
    let mut unresolved = 0usize;

    for i in -num_rows..=num_rows {
        let offset = i as f64 * spacing;
        let cx = ctx.center.x + perp_x * offset;
        let cy = ctx.center.y + perp_y * offset;
        let start = Point::new(cx - dir_x * half, cy - dir_y * half);
        let end = Point::new(cx + dir_x * half, cy + dir_y * half);


        let mut current = Polyline::default();
        let mut prev = start;

        for k in 1..=steps {
            let next = if k == steps {
                end
            } else {
                start.lerp(end, (k as f64 / steps as f64).min(1.0))
            };

            match clip_segment(prev, next, ring) {
                Some(kept) => {
                    current.push_distinct(kept.start());
                    current.push_distinct(kept.end());
                    // Truncated at an exit: this interior run is over
                    if kept.end() != next {
                        flush(&mut current, &mut rows);
                    }
                }
                None => {
                    if crate::clip::contains(ring, prev) != crate::clip::contains(ring, next) {
                        unresolved += 1;
                    }
                    flush(&mut current, &mut rows);
                }
            }

            prev = next;
        }

        flush(&mut current, &mut rows);
    }

    if unresolved > 0 {
        debug!(unresolved, "fill steps straddled the boundary without a crossing and were dropped");
    }

    rows
}

/// Rows on either side of the center row, or `None` when the region is
/// too large to measure.
fn rows_each_side(half: f64, spacing: f64) -> Option<i64> {
    if !half.is_finite() {
        warn!(half_diagonal = half, "fill region has no finite extent, nothing stitched");
        return None;
    }
    let wanted = (half / spacing).ceil();
    let cap = (MAX_FILL_ROWS / 2) as f64;
    if wanted > cap {
        warn!(requested = 2.0 * wanted + 1.0, cap = MAX_FILL_ROWS, "fill row count capped");
        return Some(cap as i64);
    }
    Some(wanted as i64)
}

fn row_steps(row_len: f64, stitch_len: f64) -> usize {
    let wanted = (row_len / stitch_len).ceil().max(1.0);
    if wanted > MAX_FILL_STEPS as f64 {
        warn!(requested = wanted, cap = MAX_FILL_STEPS, "fill steps per row capped");
        return MAX_FILL_STEPS;
    }
    wanted as usize
}

/// Move a finished run into the output if it is stitchable.
fn flush(current: &mut Polyline, rows: &mut Vec<Polyline>) {
    let run = std::mem::take(current);
    if run.is_usable() {
        rows.push(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::rectangle(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn square_rows_step_by_point_eight() {
        let params = FillParams { density: 2.0, angle: 0.0, underlay: false };
        let rows = generate_fill(&square(), &params).unwrap();
        assert_eq!(rows.len(), 13);

        let ys: Vec<f64> = rows.iter().map(|r| r.polyline().points[0].y).collect();
        for (k, y) in ys.iter().enumerate() {
            assert!((y - (0.2 + 0.8 * k as f64)).abs() < 1e-9, "row {k} at y={y}");
        }
    }

    #[test]
    fn rows_are_horizontal_and_span_the_square() {
        let rows = fill_lines(&square(), 2.0, 0.0).unwrap();
        for row in &rows {
            let y0 = row.points[0].y;
            assert!(row.points.iter().all(|p| (p.y - y0).abs() < 1e-9));
            let first = row.first().unwrap();
            let last = row.last().unwrap();
            assert!(first.x.abs() < 1e-9);
            assert!((last.x - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn underlay_is_prepended_and_rotated() {
        let params = FillParams { density: 2.0, angle: 0.0, underlay: true };
        let rows = generate_fill(&square(), &params).unwrap();

        let underlay: Vec<_> = rows.iter().take_while(|r| r.is_underlay()).collect();
        assert!(!underlay.is_empty());
        assert!(rows[underlay.len()..].iter().all(|r| !r.is_underlay()));

        match underlay[0] {
            RawPattern::Fill { angle, density, .. } => {
                assert_eq!(*angle, 90.0);
                assert_eq!(*density, 4.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        // Rotated rows run vertically
        let line = underlay[0].polyline();
        assert!((line.points[0].x - line.points[1].x).abs() < 1e-9);
    }

    #[test]
    fn every_row_has_two_points() {
        let tri = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(20.0, 3.0),
            Point::new(4.0, 17.0),
        ]);
        let rows = fill_lines(&tri, 1.3, 37.0).unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.points.len() >= 2));
    }

    #[test]
    fn rejects_bad_density() {
        for density in [0.0, -2.0, f64::NAN] {
            let params = FillParams { density, ..Default::default() };
            let err = generate_fill(&square(), &params).unwrap_err();
            assert_eq!(err.kind(), "invalid_parameters");
        }
    }

    #[test]
    fn row_count_is_capped() {
        assert_eq!(rows_each_side(10.0, 0.8), Some(13));
        assert_eq!(rows_each_side(1e12, 0.8), Some((MAX_FILL_ROWS / 2) as i64));
        assert_eq!(rows_each_side(f64::INFINITY, 0.8), None);
        assert_eq!(row_steps(1e12, 0.4), MAX_FILL_STEPS);
        assert_eq!(row_steps(4.0, 0.4), 10);
    }

    #[test]
    fn astronomical_region_yields_nothing() {
        let huge = Polygon::rectangle(-1e300, -1e300, 1e300, 1e300);
        let rows = fill_lines(&huge, 2.0, 0.0).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn rejects_missing_exterior() {
        let err = generate_fill(&Polygon::default(), &FillParams::default()).unwrap_err();
        assert_eq!(err.kind(), "invalid_shape");
    }
}

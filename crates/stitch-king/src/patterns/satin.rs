//! Satin column: dense stitches strung across a pair of rails.
//!
//! The rails only gate the input; each stitch line runs between the
//! rung's own first and last points, which are taken as its meeting
//! points with the two rails.

use tracing::{debug, warn};

use super::{RawPattern, SatinParams, MIN_STITCH_LENGTH};
use crate::error::{require_positive, StitchError};
use crate::geometry::{Point, Polyline};

/// Rungs shorter than this cannot be interpolated.
const MIN_RUNG_LENGTH: f64 = 1e-9;

/// Upper bound on points along a single satin line.
pub const MAX_SATIN_POINTS: usize = 100_000;

/// Generate one satin line per rung.
///
/// Needs exactly two rails and at least one rung. Each line carries
/// `ceil(rung_length × density) + 1` evenly spaced points. Density is
/// clamped so no stitch is shorter than [`MIN_STITCH_LENGTH`].
pub fn generate_satin(
    rails: &[Polyline],
    rungs: &[Polyline],
    params: &SatinParams,
) -> Result<Vec<RawPattern>, StitchError> {
    validate_column(rails, rungs)?;
    let density = require_positive("density", params.density)?;
    if !params.angle.is_finite() {
        return Err(StitchError::InvalidParameters(format!(
            "angle must be finite, got {}",
            params.angle
        )));
    }

    let mut out = Vec::with_capacity(rungs.len() * if params.underlay { 2 } else { 1 });

    if params.underlay {
        out.extend(satin_pass(rungs, density * 2.0, params.angle + 90.0, true)?);
    }
    out.extend(satin_pass(rungs, density, params.angle, false)?);

    debug!(rungs = rungs.len(), lines = out.len(), density, "satin generated");
    Ok(out)
}

fn validate_column(rails: &[Polyline], rungs: &[Polyline]) -> Result<(), StitchError> {
    if rails.len() != 2 {
        return Err(StitchError::InvalidShape(format!(
            "satin needs exactly 2 rails, got {}",
            rails.len()
        )));
    }
    if rungs.is_empty() {
        return Err(StitchError::InvalidShape("satin needs at least 1 rung".into()));
    }

    for (i, rail) in rails.iter().enumerate() {
        if !rail.is_usable() || !rail.points.iter().all(Point::is_finite) {
            return Err(StitchError::InvalidShape(format!(
                "rail {i} needs at least 2 finite points"
            )));
        }
    }
    for (i, rung) in rungs.iter().enumerate() {
        if !rung.is_usable() || !rung.points.iter().all(Point::is_finite) {
            return Err(StitchError::InvalidShape(format!(
                "rung {i} needs at least 2 finite points"
            )));
        }
    }

    Ok(())
}

fn satin_pass(
    rungs: &[Polyline],
    density: f64,
    angle: f64,
    underlay: bool,
) -> Result<Vec<RawPattern>, StitchError> {
    let max_density = 1.0 / MIN_STITCH_LENGTH;
    let density = if density > max_density {
        warn!(requested = density, max = max_density, "satin density clamped");
        max_density
    } else {
        density
    };

    rungs
        .iter()
        .enumerate()
        .map(|(i, rung)| {
            // validate_column guarantees both ends exist
            let (Some(p1), Some(p2)) = (rung.first(), rung.last()) else {
                return Err(StitchError::InvalidShape(format!("rung {i} is empty")));
            };

            let width = p1.distance(p2);
            if width < MIN_RUNG_LENGTH {
                return Err(StitchError::DegenerateGeometry(format!(
                    "rung {i} has zero length"
                )));
            }

            let wanted = (width * density).ceil().max(1.0);
            let count = if wanted >= MAX_SATIN_POINTS as f64 {
                warn!(rung = i, requested = wanted, cap = MAX_SATIN_POINTS, "satin point count capped");
                MAX_SATIN_POINTS - 1
            } else {
                wanted as usize
            };
            let points = (0..=count)
                .map(|k| p1.lerp(p2, k as f64 / count as f64))
                .collect();

            Ok(RawPattern::Satin {
                line: Polyline::new(points),
                column_width: width,
                density,
                angle,
                underlay,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rails() -> Vec<Polyline> {
        vec![
            Polyline::new(vec![Point::new(0.0, 0.0), Point::new(0.0, 10.0)]),
            Polyline::new(vec![Point::new(5.0, 0.0), Point::new(5.0, 10.0)]),
        ]
    }

    fn rungs() -> Vec<Polyline> {
        [2.0, 5.0, 8.0]
            .iter()
            .map(|&y| Polyline::new(vec![Point::new(0.0, y), Point::new(5.0, y)]))
            .collect()
    }

    #[test]
    fn three_rungs_six_points_each() {
        let params = SatinParams { density: 1.0, ..Default::default() };
        let lines = generate_satin(&rails(), &rungs(), &params).unwrap();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.polyline().points.len(), 6);
            assert_eq!(line.width(), Some(5.0));
        }
    }

    #[test]
    fn wrong_rail_count_is_invalid_shape() {
        let params = SatinParams::default();
        let one_rail = &rails()[..1];
        let err = generate_satin(one_rail, &rungs(), &params).unwrap_err();
        assert_eq!(err.kind(), "invalid_shape");

        let mut three = rails();
        three.push(three[0].clone());
        assert!(generate_satin(&three, &rungs(), &params).is_err());
    }

    #[test]
    fn no_rungs_is_invalid_shape() {
        let err = generate_satin(&rails(), &[], &SatinParams::default()).unwrap_err();
        assert!(matches!(err, StitchError::InvalidShape(_)));
    }

    #[test]
    fn zero_length_rung_is_degenerate() {
        let rung = Polyline::new(vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)]);
        let err = generate_satin(&rails(), &[rung], &SatinParams::default()).unwrap_err();
        assert_eq!(err.kind(), "degenerate_geometry");
    }

    #[test]
    fn underlay_doubles_density_first() {
        let params = SatinParams { density: 1.0, angle: 10.0, underlay: true };
        let lines = generate_satin(&rails(), &rungs(), &params).unwrap();
        assert_eq!(lines.len(), 6);
        assert!(lines[..3].iter().all(RawPattern::is_underlay));
        assert_eq!(lines[0].polyline().points.len(), 11);
        assert_eq!(lines[0].direction(), 100.0);
        assert_eq!(lines[3].direction(), 10.0);
    }

    #[test]
    fn huge_density_is_clamped_to_min_stitch_length() {
        let params = SatinParams { density: 1e20, ..Default::default() };
        let lines = generate_satin(&rails(), &rungs(), &params).unwrap();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            // 5 mm at 10 stitches per mm
            assert_eq!(line.polyline().points.len(), 51);
            let pts = &line.polyline().points;
            assert!(pts[0].distance(pts[1]) >= MIN_STITCH_LENGTH - 1e-9);
        }
    }

    #[test]
    fn very_long_rung_is_capped() {
        let rung = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1e12, 0.0)]);
        let params = SatinParams { density: 1.0, ..Default::default() };
        let lines = generate_satin(&rails(), &[rung], &params).unwrap();
        assert_eq!(lines[0].polyline().points.len(), MAX_SATIN_POINTS);
    }
}

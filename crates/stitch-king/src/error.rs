//! Error types for stitch generation and shape import.
//!
//! Generators never panic on bad input. They return one of these and the
//! pipeline turns it into an empty stitch list for that shape.

use serde::Serialize;
use thiserror::Error;

/// Why a generator refused a shape or its parameters.
///
/// Serializes as `{"kind": "invalid_shape", "message": "..."}` for reports.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StitchError {
    /// Missing or degenerate exterior ring, wrong rail/rung count,
    /// or a shape that does not match the requested pattern family.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Non-positive or non-finite density, spacing or stripe size.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Geometry that would divide by zero (zero-length rung, zero-width bounds).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl StitchError {
    /// Short machine-readable kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            StitchError::InvalidShape(_) => "invalid_shape",
            StitchError::InvalidParameters(_) => "invalid_parameters",
            StitchError::DegenerateGeometry(_) => "degenerate_geometry",
        }
    }
}

/// Error type for SVG shape import.
#[derive(Error, Debug)]
pub enum SvgError {
    #[error("SVG parse error: {0}")]
    ParseError(String),

    #[error("no stitchable shapes found in SVG")]
    NoShapes,
}

/// Reject non-finite or non-positive values with `InvalidParameters`.
pub(crate) fn require_positive(name: &str, value: f64) -> Result<f64, StitchError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(StitchError::InvalidParameters(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_values_pass() {
        assert_eq!(require_positive("density", 2.0), Ok(2.0));
    }

    #[test]
    fn zero_negative_and_nan_are_rejected() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = require_positive("density", bad).unwrap_err();
            assert_eq!(err.kind(), "invalid_parameters");
        }
    }

    #[test]
    fn display_mentions_reason() {
        let err = StitchError::InvalidShape("satin needs exactly 2 rails, got 3".into());
        assert_eq!(err.to_string(), "invalid shape: satin needs exactly 2 rails, got 3");
    }

    #[test]
    fn serializes_kind_and_message() {
        let err = StitchError::DegenerateGeometry("rung 0 has zero length".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], err.kind());
        assert_eq!(json["message"], "rung 0 has zero length");
    }
}

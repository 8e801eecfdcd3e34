//! Pattern generators for embroidery stitch geometry.
//!
//! Each generator turns a shape plus a parameter record into a list of
//! [`RawPattern`]s. Raw patterns are still pure geometry: thread, fabric and
//! identity are attached later by the materializer in [`crate::stitch`].

pub mod util;

mod contour;
mod fill;
mod meander;
mod satin;
mod tartan;

pub use contour::generate_contour;
pub use fill::{fill_lines, generate_fill, MAX_FILL_ROWS};
pub use meander::generate_meander;
pub use satin::generate_satin;
pub use tartan::generate_tartan;

use serde::{Deserialize, Serialize};

use crate::geometry::Polyline;
use crate::stitch::StitchType;

// ============================================================================
// STITCH LENGTH
// ============================================================================

/// Shortest stitch a machine will sew, in mm.
pub const MIN_STITCH_LENGTH: f64 = 0.1;
/// Longest stitch before it turns into a loose float, in mm.
pub const MAX_STITCH_LENGTH: f64 = 10.0;
/// Densities below this are treated as this value.
pub const MIN_DENSITY: f64 = 0.1;
/// Fill rows sit at this fraction of the stitch length, giving 20% overlap.
pub const FILL_ROW_OVERLAP: f64 = 0.8;

/// Stitch length (mm) for a density in stitches per mm.
///
/// `2.0 / max(density, 0.1)` clamped to `[0.1, 10.0]`. Callers validate the
/// density first; this only guards the division.
#[inline]
pub fn stitch_length_for_density(density: f64) -> f64 {
    (2.0 / density.max(MIN_DENSITY)).clamp(MIN_STITCH_LENGTH, MAX_STITCH_LENGTH)
}

// ============================================================================
// PARAMETER RECORDS
// ============================================================================

/// Parameters for [`generate_fill`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillParams {
    /// Stitches per mm
    pub density: f64,
    /// Row angle in degrees
    pub angle: f64,
    /// Prepend an underlay pass at double density, rotated 90°
    pub underlay: bool,
}

impl Default for FillParams {
    fn default() -> Self {
        Self { density: 2.0, angle: 0.0, underlay: false }
    }
}

/// Parameters for [`generate_satin`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatinParams {
    /// Stitches per mm of rung length
    pub density: f64,
    /// Recorded as the stitch direction; satin geometry follows the rungs
    pub angle: f64,
    pub underlay: bool,
}

impl Default for SatinParams {
    fn default() -> Self {
        Self { density: 1.0, angle: 0.0, underlay: false }
    }
}

/// Parameters for [`generate_contour`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourParams {
    /// Distance between successive rings, in mm
    pub spacing: f64,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self { spacing: 1.0 }
    }
}

/// Parameters for [`generate_tartan`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TartanParams {
    pub stripe_width: f64,
    pub stripe_spacing: f64,
}

impl Default for TartanParams {
    fn default() -> Self {
        Self { stripe_width: 1.0, stripe_spacing: 4.0 }
    }
}

/// Parameters for [`generate_meander`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanderParams {
    /// Stitches per mm; band spacing is the matching stitch length
    pub density: f64,
}

impl Default for MeanderParams {
    fn default() -> Self {
        Self { density: 2.0 }
    }
}

// ============================================================================
// RAW PATTERN
// ============================================================================

/// Geometry emitted by a generator, before materialization.
///
/// ## Rust Lesson #11: One Enum, Many Shapes
///
/// Each family keeps its own vocabulary (a satin line knows its column
/// width, a contour ring knows its offset) but everything downstream
/// handles a single type. Adding a family means adding a variant, and
/// the compiler points at every `match` that needs updating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawPattern {
    Fill {
        line: Polyline,
        angle: f64,
        density: f64,
        underlay: bool,
    },
    Satin {
        line: Polyline,
        /// Distance between the rung's endpoints
        column_width: f64,
        density: f64,
        angle: f64,
        underlay: bool,
    },
    Contour {
        ring: Polyline,
        /// 0 is the original exterior
        ring_index: usize,
        offset: f64,
    },
    Tartan {
        line: Polyline,
        stripe_width: f64,
        vertical: bool,
    },
    Meander {
        line: Polyline,
        band_index: usize,
        amplitude: f64,
    },
}

impl RawPattern {
    pub fn polyline(&self) -> &Polyline {
        match self {
            RawPattern::Fill { line, .. }
            | RawPattern::Satin { line, .. }
            | RawPattern::Tartan { line, .. }
            | RawPattern::Meander { line, .. } => line,
            RawPattern::Contour { ring, .. } => ring,
        }
    }

    pub fn stitch_type(&self) -> StitchType {
        match self {
            RawPattern::Fill { .. } => StitchType::Fill,
            RawPattern::Satin { .. } => StitchType::Satin,
            RawPattern::Contour { .. } => StitchType::Contour,
            RawPattern::Tartan { .. } => StitchType::Tartan,
            RawPattern::Meander { .. } => StitchType::Meander,
        }
    }

    pub fn is_underlay(&self) -> bool {
        matches!(
            self,
            RawPattern::Fill { underlay: true, .. } | RawPattern::Satin { underlay: true, .. }
        )
    }

    /// Stitch direction in degrees.
    pub fn direction(&self) -> f64 {
        match self {
            RawPattern::Fill { angle, .. } | RawPattern::Satin { angle, .. } => *angle,
            RawPattern::Tartan { vertical: true, .. } => 90.0,
            _ => 0.0,
        }
    }

    /// Density carried into the stitch, if the family has one.
    pub fn density(&self) -> Option<f64> {
        match self {
            RawPattern::Fill { density, .. } | RawPattern::Satin { density, .. } => Some(*density),
            _ => None,
        }
    }

    /// Family-specific stitch width (column or stripe), if any.
    pub fn width(&self) -> Option<f64> {
        match self {
            RawPattern::Satin { column_width, .. } => Some(*column_width),
            RawPattern::Tartan { stripe_width, .. } => Some(*stripe_width),
            _ => None,
        }
    }
}

// ============================================================================
// PATTERN KINDS
// ============================================================================

/// Metadata describing a pattern family for listings.
#[derive(Debug, Clone, Copy)]
pub struct PatternMetadata {
    /// Label for the density/spacing parameter
    pub spacing_label: &'static str,
    /// Label for the angle parameter
    pub angle_label: &'static str,
    pub description: &'static str,
    /// Whether the family takes rails and rungs instead of a region
    pub needs_rails: bool,
}

impl PatternMetadata {
    pub const fn new(
        spacing_label: &'static str,
        angle_label: &'static str,
        description: &'static str,
        needs_rails: bool,
    ) -> Self {
        Self { spacing_label, angle_label, description, needs_rails }
    }
}

/// Available pattern families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Fill,
    Satin,
    Contour,
    Tartan,
    Meander,
}

impl PatternKind {
    pub fn all() -> &'static [PatternKind] {
        &[
            PatternKind::Fill,
            PatternKind::Satin,
            PatternKind::Contour,
            PatternKind::Tartan,
            PatternKind::Meander,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::Fill => "fill",
            PatternKind::Satin => "satin",
            PatternKind::Contour => "contour",
            PatternKind::Tartan => "tartan",
            PatternKind::Meander => "meander",
        }
    }

    /// Parse a family name. Accepts a few common aliases.
    pub fn from_name(name: &str) -> Option<PatternKind> {
        match name.trim().to_lowercase().as_str() {
            "fill" | "tatami" => Some(PatternKind::Fill),
            "satin" | "column" => Some(PatternKind::Satin),
            "contour" | "concentric" => Some(PatternKind::Contour),
            "tartan" | "plaid" | "grid" => Some(PatternKind::Tartan),
            "meander" | "serpentine" => Some(PatternKind::Meander),
            _ => None,
        }
    }

    pub fn metadata(&self) -> PatternMetadata {
        match self {
            PatternKind::Fill =>
                PatternMetadata::new("Density", "Angle", "Parallel rows clipped to the shape", false),
            PatternKind::Satin =>
                PatternMetadata::new("Density", "Direction", "Dense stitches across rail pairs", true),
            PatternKind::Contour =>
                PatternMetadata::new("Ring Spacing", "N/A", "Nested inward offset rings", false),
            PatternKind::Tartan =>
                PatternMetadata::new("Stripe Spacing", "N/A", "Crossed grid over the bounds", false),
            PatternKind::Meander =>
                PatternMetadata::new("Density", "N/A", "Sine serpentine per band", false),
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

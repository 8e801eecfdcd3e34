//! Stitch records and the materializer that builds them.
//!
//! A [`Stitch`] is the unit handed to renderers and exporters: 3D points,
//! the thread and fabric it is sewn with, and a few derived fields
//! (length, UV parametrization, material summary). The materializer is
//! the only place raw pattern geometry becomes a `Stitch`.
//!
//! ## Rust Lesson #12: Arc for Shared Immutable Data
//!
//! Thousands of stitches share one thread description. `Arc<ThreadProperties>`
//! makes each stitch hold a pointer plus a refcount bump instead of its own
//! copy of the color string.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry::{Point, Point3};
use crate::patterns::RawPattern;

// ============================================================================
// STITCH TYPE
// ============================================================================

/// What kind of stitch a record is. Jumps are travel, not sewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StitchType {
    Fill,
    Satin,
    Contour,
    Tartan,
    Meander,
    Jump,
}

impl StitchType {
    /// Tag used in identifiers and as the optimizer's secondary sort key.
    pub fn tag(&self) -> &'static str {
        match self {
            StitchType::Fill => "fill",
            StitchType::Satin => "satin",
            StitchType::Contour => "contour",
            StitchType::Tartan => "tartan",
            StitchType::Meander => "meander",
            StitchType::Jump => "jump",
        }
    }

    #[inline]
    pub fn is_jump(&self) -> bool {
        matches!(self, StitchType::Jump)
    }
}

// ============================================================================
// THREAD & FABRIC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadType {
    Cotton,
    #[default]
    Polyester,
    Rayon,
    Silk,
    Metallic,
    Wool,
}

/// Thread description. Immutable once built; shared by every stitch sewn with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadProperties {
    #[serde(rename = "type")]
    pub thread_type: ThreadType,
    /// Hex color, e.g. `#CC2200`
    #[serde(deserialize_with = "deserialize_color")]
    pub color: String,
    /// Thickness in mm
    pub thickness: f64,
    /// Twist factor, scales twist jitter
    pub twist: f64,
    pub sheen: f64,
    pub roughness: f64,
    pub metallic: f64,
    pub glow_intensity: f64,
    pub variegation_pattern: Option<String>,
}

impl Default for ThreadProperties {
    fn default() -> Self {
        Self {
            thread_type: ThreadType::Polyester,
            color: "#000000".to_string(),
            thickness: 0.4,
            twist: 0.5,
            sheen: 0.5,
            roughness: 0.5,
            metallic: 0.0,
            glow_intensity: 0.0,
            variegation_pattern: None,
        }
    }
}

impl ThreadProperties {
    /// Thread with a given color and default everything else.
    pub fn with_color(color: impl AsRef<str>) -> Self {
        Self { color: normalize_color(color.as_ref()), ..Default::default() }
    }

    /// The minimal thread carried by jump stitches.
    pub fn jump() -> Self {
        Self {
            color: "#000000".to_string(),
            thickness: 0.0,
            twist: 0.0,
            sheen: 0.0,
            roughness: 1.0,
            ..Default::default()
        }
    }
}

/// Canonical form of a thread color.
///
/// Hex colors are uppercased so `#cc2200` and `#CC2200` are the same
/// thread to the optimizer. Anything else is only trimmed.
pub fn normalize_color(color: &str) -> String {
    let color = color.trim();
    match color.strip_prefix('#') {
        Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            format!("#{}", hex.to_ascii_uppercase())
        }
        _ => color.to_string(),
    }
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|c| normalize_color(&c))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FabricType {
    #[default]
    Cotton,
    Linen,
    Denim,
    Silk,
    Felt,
    Canvas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaveType {
    #[default]
    Plain,
    Twill,
    Satin,
    Knit,
}

/// Fabric the design is sewn onto. Defaults to white plain-weave cotton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricProperties {
    #[serde(rename = "type")]
    pub fabric_type: FabricType,
    pub color: String,
    pub weave: WeaveType,
}

impl Default for FabricProperties {
    fn default() -> Self {
        Self {
            fabric_type: FabricType::Cotton,
            color: "#FFFFFF".to_string(),
            weave: WeaveType::Plain,
        }
    }
}

/// Render-facing subset of the thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub color: String,
    pub sheen: f64,
    pub roughness: f64,
    pub metallic: f64,
    pub glow_intensity: f64,
}

impl From<&ThreadProperties> for MaterialSummary {
    fn from(t: &ThreadProperties) -> Self {
        Self {
            color: t.color.clone(),
            sheen: t.sheen,
            roughness: t.roughness,
            metallic: t.metallic,
            glow_intensity: t.glow_intensity,
        }
    }
}

// ============================================================================
// STITCH
// ============================================================================

/// One stitch group: a polyline sewn in one go with one thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stitch {
    pub id: String,
    #[serde(rename = "type")]
    pub stitch_type: StitchType,
    #[serde(default)]
    pub underlay: bool,
    pub points: Vec<Point3>,
    pub thread: Arc<ThreadProperties>,
    pub fabric: Arc<FabricProperties>,
    /// Stitches per mm
    pub density: f64,
    pub tension: f64,
    /// Stitch direction in degrees
    pub direction: f64,
    /// Total polyline length in mm
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// `[u, v]` per point, `u = i / (n - 1)`, `v = 0`
    pub uv: Vec<[f64; 2]>,
    pub material: MaterialSummary,
}

impl Stitch {
    /// A 2-point travel move between two stitches.
    pub fn jump(index: usize, from: Point3, to: Point3, thread: Arc<ThreadProperties>, fabric: Arc<FabricProperties>) -> Self {
        let length = from.xy().distance(to.xy());
        let material = MaterialSummary::from(thread.as_ref());
        Self {
            id: format!("jump-{index}"),
            stitch_type: StitchType::Jump,
            underlay: false,
            points: vec![from, to],
            width: thread.thickness,
            height: thread.thickness,
            thread,
            fabric,
            density: 0.0,
            tension: 0.0,
            direction: (to.y - from.y).atan2(to.x - from.x).to_degrees(),
            length,
            uv: vec![[0.0, 0.0], [1.0, 0.0]],
            material,
        }
    }

    #[inline]
    pub fn is_jump(&self) -> bool {
        self.stitch_type.is_jump()
    }

    pub fn first_point(&self) -> Option<Point3> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<Point3> {
        self.points.last().copied()
    }

    /// Mean of the points in the XY plane. `None` for an empty stitch.
    pub fn centroid(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point::new(sx / n, sy / n))
    }

    /// Thread color, the optimizer's primary grouping key.
    #[inline]
    pub fn color(&self) -> &str {
        &self.thread.color
    }
}

// ============================================================================
// MATERIALIZER
// ============================================================================

/// Caller-supplied inputs to materialization.
///
/// The timestamp is passed in rather than read from the clock so that the
/// same inputs always produce the same identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeOptions {
    /// Generation timestamp embedded in stitch identifiers
    pub timestamp: i64,
    /// Fabric for jobs that do not name their own
    pub fabric: FabricProperties,
    pub tension: f64,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self { timestamp: 0, fabric: FabricProperties::default(), tension: 1.0 }
    }
}

/// Turns raw patterns into stitches, numbering them as it goes.
///
/// One materializer is used for a whole batch so sequence numbers (and
/// therefore identifiers) are unique across shapes.
#[derive(Debug, Clone)]
pub struct Materializer {
    options: MaterializeOptions,
    default_fabric: Arc<FabricProperties>,
    next_sequence: usize,
}

impl Materializer {
    pub fn new(options: MaterializeOptions) -> Self {
        let default_fabric = Arc::new(options.fabric.clone());
        Self { options, default_fabric, next_sequence: 0 }
    }

    pub fn default_fabric(&self) -> Arc<FabricProperties> {
        Arc::clone(&self.default_fabric)
    }

    /// Build a stitch from one raw pattern.
    pub fn materialize(
        &mut self,
        raw: &RawPattern,
        thread: &Arc<ThreadProperties>,
        fabric: Option<&Arc<FabricProperties>>,
    ) -> Stitch {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let stitch_type = raw.stitch_type();
        let line = raw.polyline();
        let length = line.length();
        let n = line.points.len();

        let points: Vec<Point3> = line.points.iter().map(|p| p.with_z(0.0)).collect();
        let uv = (0..n)
            .map(|i| {
                let u = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
                [u, 0.0]
            })
            .collect();

        // Families without a density parameter report points per mm sewn
        let density = raw.density().unwrap_or_else(|| {
            if length > 0.0 { (n.saturating_sub(1)) as f64 / length } else { 0.0 }
        });

        Stitch {
            id: format!("{}-{}-{}", stitch_type.tag(), sequence, self.options.timestamp),
            stitch_type,
            underlay: raw.is_underlay(),
            points,
            thread: Arc::clone(thread),
            fabric: fabric.map_or_else(|| self.default_fabric(), Arc::clone),
            density,
            tension: self.options.tension,
            direction: raw.direction(),
            length,
            width: raw.width().unwrap_or(thread.thickness),
            height: thread.thickness,
            uv,
            material: MaterialSummary::from(thread.as_ref()),
        }
    }

    /// Materialize a whole generator output in order.
    pub fn materialize_all(
        &mut self,
        raws: &[RawPattern],
        thread: &Arc<ThreadProperties>,
        fabric: Option<&Arc<FabricProperties>>,
    ) -> Vec<Stitch> {
        raws.iter().map(|raw| self.materialize(raw, thread, fabric)).collect()
    }
}

/// One-shot materialization with sequence numbers starting at 0.
pub fn materialize(raws: &[RawPattern], thread: &ThreadProperties, options: &MaterializeOptions) -> Vec<Stitch> {
    let thread = Arc::new(thread.clone());
    Materializer::new(options.clone()).materialize_all(raws, &thread, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polyline;

    fn fill_raw(points: Vec<Point>) -> RawPattern {
        RawPattern::Fill { line: Polyline::new(points), angle: 30.0, density: 2.0, underlay: false }
    }

    #[test]
    fn length_and_uv() {
        let raw = fill_raw(vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0), Point::new(3.0, 10.0)]);
        let stitches = materialize(&[raw], &ThreadProperties::default(), &MaterializeOptions::default());
        let s = &stitches[0];
        assert_eq!(s.length, 11.0);
        assert_eq!(s.uv, vec![[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]]);
        assert!(s.points.iter().all(|p| p.z == 0.0));
        assert_eq!(s.direction, 30.0);
        assert_eq!(s.density, 2.0);
    }

    #[test]
    fn default_fabric_is_white_cotton() {
        let raw = fill_raw(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        let s = &materialize(&[raw], &ThreadProperties::default(), &MaterializeOptions::default())[0];
        assert_eq!(s.fabric.fabric_type, FabricType::Cotton);
        assert_eq!(s.fabric.color, "#FFFFFF");
        assert_eq!(s.fabric.weave, WeaveType::Plain);
    }

    #[test]
    fn ids_combine_type_sequence_timestamp() {
        let raws = vec![
            fill_raw(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
            fill_raw(vec![Point::new(0.0, 1.0), Point::new(1.0, 1.0)]),
        ];
        let options = MaterializeOptions { timestamp: 1_700_000_000_000, ..Default::default() };
        let stitches = materialize(&raws, &ThreadProperties::default(), &options);
        assert_eq!(stitches[0].id, "fill-0-1700000000000");
        assert_eq!(stitches[1].id, "fill-1-1700000000000");
    }

    #[test]
    fn thread_is_shared_not_copied() {
        let thread = Arc::new(ThreadProperties::with_color("#FF0000"));
        let mut m = Materializer::new(MaterializeOptions::default());
        let raws = vec![
            fill_raw(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
            fill_raw(vec![Point::new(0.0, 1.0), Point::new(1.0, 1.0)]),
        ];
        let stitches = m.materialize_all(&raws, &thread, None);
        assert!(Arc::ptr_eq(&stitches[0].thread, &stitches[1].thread));
        assert_eq!(stitches[1].material.color, "#FF0000");
    }

    #[test]
    fn hex_colors_are_uppercased() {
        assert_eq!(ThreadProperties::with_color("#cc2200").color, "#CC2200");
        assert_eq!(normalize_color(" #aBc "), "#ABC");
        assert_eq!(normalize_color("red"), "red");
        assert_eq!(normalize_color("#zz0000"), "#zz0000");
    }

    #[test]
    fn deserialized_color_is_normalized() {
        let t: ThreadProperties = serde_json::from_str(r##"{"color": "#00aa00", "twist": 0.8}"##).unwrap();
        assert_eq!(t.color, "#00AA00");
        assert_eq!(t.twist, 0.8);

        let missing: ThreadProperties = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.color, "#000000");
    }

    #[test]
    fn jump_thread_is_minimal() {
        let t = ThreadProperties::jump();
        assert_eq!(t.color, "#000000");
        assert_eq!((t.sheen, t.roughness, t.thickness), (0.0, 1.0, 0.0));

        let j = Stitch::jump(
            0,
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(8.0, 0.0, 0.0),
            Arc::new(t),
            Arc::new(FabricProperties::default()),
        );
        assert_eq!(j.length, 8.0);
        assert!(j.is_jump());
        assert_eq!(j.points.len(), 2);
    }

    #[test]
    fn stitch_serializes_with_type_tag() {
        let raw = fill_raw(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        let s = &materialize(&[raw], &ThreadProperties::default(), &MaterializeOptions::default())[0];
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json["type"], "fill");
        assert_eq!(json["thread"]["type"], "polyester");
        assert_eq!(json["fabric"]["color"], "#FFFFFF");
    }
}

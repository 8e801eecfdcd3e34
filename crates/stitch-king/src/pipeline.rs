//! Batch pipeline: shapes in, ordered stitch plan out.
//!
//! ```text
//! Job ──generate_raw──▶ RawPattern ──Materializer──▶ Stitch
//!                                                     │
//!             all jobs, in order ◀────────────────────┘
//!                    │
//!             twist jitter (optional)
//!                    │
//!             optimizer (optional) ──▶ BatchReport
//! ```
//!
//! A shape that fails validation contributes no stitches and one
//! [`ShapeError`]. The rest of the batch carries on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StitchError;
use crate::geometry::{Polygon, Polyline};
use crate::jitter::{apply_twist_jitter, JitterConfig};
use crate::order::{jump_count, optimize, travel_distance, OptimizeConfig};
use crate::patterns::{
    generate_contour, generate_fill, generate_meander, generate_satin, generate_tartan,
    ContourParams, FillParams, MeanderParams, PatternKind, RawPattern, SatinParams, TartanParams,
};
use crate::stitch::{
    normalize_color, FabricProperties, MaterializeOptions, Materializer, Stitch, ThreadProperties,
};

/// Geometry of one job.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A closed region, for fill, contour, tartan and meander
    Region(Polygon),
    /// Two rails and their rungs, for satin
    Column { rails: Vec<Polyline>, rungs: Vec<Polyline> },
}

impl Shape {
    fn describe(&self) -> &'static str {
        match self {
            Shape::Region(_) => "region",
            Shape::Column { .. } => "column",
        }
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Shape::Region(polygon)
    }
}

/// Parameters for one job, tagged by family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "lowercase")]
pub enum PatternParams {
    Fill(FillParams),
    Satin(SatinParams),
    Contour(ContourParams),
    Tartan(TartanParams),
    Meander(MeanderParams),
}

impl PatternParams {
    pub fn kind(&self) -> PatternKind {
        match self {
            PatternParams::Fill(_) => PatternKind::Fill,
            PatternParams::Satin(_) => PatternKind::Satin,
            PatternParams::Contour(_) => PatternKind::Contour,
            PatternParams::Tartan(_) => PatternKind::Tartan,
            PatternParams::Meander(_) => PatternKind::Meander,
        }
    }

    /// Default parameters for a family.
    pub fn defaults_for(kind: PatternKind) -> Self {
        match kind {
            PatternKind::Fill => PatternParams::Fill(FillParams::default()),
            PatternKind::Satin => PatternParams::Satin(SatinParams::default()),
            PatternKind::Contour => PatternParams::Contour(ContourParams::default()),
            PatternKind::Tartan => PatternParams::Tartan(TartanParams::default()),
            PatternKind::Meander => PatternParams::Meander(MeanderParams::default()),
        }
    }
}

/// One shape to stitch, with everything needed to stitch it.
#[derive(Debug, Clone)]
pub struct Job {
    pub shape: Shape,
    pub params: PatternParams,
    pub thread: Arc<ThreadProperties>,
    /// `None` uses the batch default fabric
    pub fabric: Option<Arc<FabricProperties>>,
}

impl Job {
    /// The thread color is normalized so equal colors group together.
    pub fn new(shape: impl Into<Shape>, params: PatternParams, mut thread: ThreadProperties) -> Self {
        thread.color = normalize_color(&thread.color);
        Self {
            shape: shape.into(),
            params,
            thread: Arc::new(thread),
            fabric: None,
        }
    }

    pub fn with_fabric(mut self, fabric: FabricProperties) -> Self {
        self.fabric = Some(Arc::new(fabric));
        self
    }
}

/// Run the generator that matches the parameters.
///
/// A region with satin parameters, or a column with anything else, is
/// `InvalidShape`.
pub fn generate_raw(shape: &Shape, params: &PatternParams) -> Result<Vec<RawPattern>, StitchError> {
    match (shape, params) {
        (Shape::Region(polygon), PatternParams::Fill(p)) => generate_fill(polygon, p),
        (Shape::Region(polygon), PatternParams::Contour(p)) => generate_contour(polygon, p),
        (Shape::Region(polygon), PatternParams::Tartan(p)) => generate_tartan(polygon, p),
        (Shape::Region(polygon), PatternParams::Meander(p)) => generate_meander(polygon, p),
        (Shape::Column { rails, rungs }, PatternParams::Satin(p)) => generate_satin(rails, rungs, p),
        (shape, params) => Err(StitchError::InvalidShape(format!(
            "{} pattern cannot stitch a {} shape",
            params.kind(),
            shape.describe()
        ))),
    }
}

/// Generate and materialize one job.
pub fn run_job(job: &Job, materializer: &mut Materializer) -> Result<Vec<Stitch>, StitchError> {
    let raws = generate_raw(&job.shape, &job.params)?;
    Ok(materializer.materialize_all(&raws, &job.thread, job.fabric.as_ref()))
}

// ============================================================================
// BATCH
// ============================================================================

/// Batch-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub materialize: MaterializeOptions,
    /// Twist jitter, off when `None`
    pub jitter: Option<JitterConfig>,
    /// Stitch-order optimization, off when `None`
    pub optimize: Option<OptimizeConfig>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            materialize: MaterializeOptions::default(),
            jitter: None,
            optimize: Some(OptimizeConfig::default()),
        }
    }
}

/// A shape the batch had to skip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeError {
    /// Position of the job in the batch
    pub shape_index: usize,
    pub error: StitchError,
}

/// Summary numbers for a finished plan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlanStats {
    pub sewing_stitches: usize,
    pub jump_stitches: usize,
    /// Travel in job order, before optimization
    pub travel_before: f64,
    /// Travel in final order
    pub travel_after: f64,
}

/// Everything a batch produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub stitches: Vec<Stitch>,
    pub errors: Vec<ShapeError>,
    pub stats: PlanStats,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run every job and build the final stitch plan.
///
/// Stitches are concatenated in job order, then jittered and optimized if
/// configured. Never fails: rejected shapes end up in `errors`.
pub fn run_batch(jobs: &[Job], options: &PipelineOptions) -> BatchReport {
    let mut materializer = Materializer::new(options.materialize.clone());
    let mut stitches = Vec::new();
    let mut errors = Vec::new();

    for (shape_index, job) in jobs.iter().enumerate() {
        match run_job(job, &mut materializer) {
            Ok(produced) => {
                debug!(shape_index, pattern = %job.params.kind(), stitches = produced.len(), "shape stitched");
                stitches.extend(produced);
            }
            Err(error) => {
                warn!(shape_index, pattern = %job.params.kind(), %error, "shape skipped");
                errors.push(ShapeError { shape_index, error });
            }
        }
    }

    if let Some(jitter) = &options.jitter {
        apply_twist_jitter(&mut stitches, jitter);
    }

    let travel_before = travel_distance(&stitches);
    let stitches = match &options.optimize {
        Some(config) => optimize(stitches, config),
        None => stitches,
    };

    let jump_stitches = jump_count(&stitches);
    let stats = PlanStats {
        sewing_stitches: stitches.len() - jump_stitches,
        jump_stitches,
        travel_before,
        travel_after: travel_distance(&stitches),
    };

    BatchReport { stitches, errors, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Polyline};

    fn square_job(x: f64, color: &str) -> Job {
        Job::new(
            Polygon::rectangle(x, 0.0, 10.0, 10.0),
            PatternParams::Fill(FillParams::default()),
            ThreadProperties::with_color(color),
        )
    }

    #[test]
    fn bad_shape_does_not_abort_batch() {
        let broken = Job::new(
            Polygon::new(vec![Point::new(0.0, 0.0)]),
            PatternParams::Fill(FillParams::default()),
            ThreadProperties::default(),
        );
        let jobs = vec![square_job(0.0, "#FF0000"), broken, square_job(20.0, "#FF0000")];
        let report = run_batch(&jobs, &PipelineOptions::default());

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].shape_index, 1);
        assert_eq!(report.errors[0].error.kind(), "invalid_shape");
        assert!(report.stats.sewing_stitches > 0);
    }

    #[test]
    fn mismatched_params_are_invalid_shape() {
        let job = Job::new(
            Polygon::rectangle(0.0, 0.0, 5.0, 5.0),
            PatternParams::Satin(SatinParams::default()),
            ThreadProperties::default(),
        );
        let err = generate_raw(&job.shape, &job.params).unwrap_err();
        assert!(matches!(err, StitchError::InvalidShape(_)));
    }

    #[test]
    fn ids_are_unique_across_jobs() {
        let jobs = vec![square_job(0.0, "#000000"), square_job(20.0, "#000000")];
        let report = run_batch(&jobs, &PipelineOptions { optimize: None, ..Default::default() });
        let mut ids: Vec<&str> = report.stitches.iter().map(|s| s.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn without_optimizer_order_is_job_order() {
        let jobs = vec![square_job(20.0, "#FF0000"), square_job(0.0, "#0000FF")];
        let report = run_batch(&jobs, &PipelineOptions { optimize: None, ..Default::default() });
        assert_eq!(report.stitches[0].color(), "#FF0000");
        assert_eq!(report.stats.jump_stitches, 0);
    }

    #[test]
    fn optimizer_groups_colors() {
        let jobs = vec![
            square_job(0.0, "#FF0000"),
            square_job(20.0, "#0000FF"),
            square_job(40.0, "#FF0000"),
        ];
        let report = run_batch(&jobs, &PipelineOptions::default());
        let sewing: Vec<&str> = report.stitches.iter().filter(|s| !s.is_jump()).map(|s| s.color()).collect();
        let switches = sewing.windows(2).filter(|w| w[0] != w[1]).count();
        assert_eq!(switches, 1);
    }

    #[test]
    fn extreme_satin_density_still_sews() {
        let line = |a: (f64, f64), b: (f64, f64)| Polyline::new(vec![Point::new(a.0, a.1), Point::new(b.0, b.1)]);
        let job = Job::new(
            Shape::Column {
                rails: vec![line((0.0, 0.0), (0.0, 10.0)), line((5.0, 0.0), (5.0, 10.0))],
                rungs: vec![line((0.0, 5.0), (5.0, 5.0))],
            },
            PatternParams::Satin(SatinParams { density: 1e20, ..Default::default() }),
            ThreadProperties::default(),
        );
        let report = run_batch(&[job], &PipelineOptions::default());
        assert!(report.is_clean());
        assert_eq!(report.stitches.len(), 1);
        assert_eq!(report.stitches[0].points.len(), 51);
    }

    #[test]
    fn astronomical_fill_region_returns() {
        let job = Job::new(
            Polygon::rectangle(-1e300, -1e300, 1e300, 1e300),
            PatternParams::Fill(FillParams::default()),
            ThreadProperties::default(),
        );
        let report = run_batch(&[job], &PipelineOptions::default());
        assert!(report.stitches.len() <= 2 * crate::patterns::MAX_FILL_ROWS);
    }

    #[test]
    fn color_case_does_not_split_groups() {
        let jobs = vec![
            square_job(0.0, "#ff0000"),
            square_job(20.0, "#0000FF"),
            square_job(40.0, "#FF0000"),
        ];
        let report = run_batch(&jobs, &PipelineOptions::default());
        let sewing: Vec<&str> = report.stitches.iter().filter(|s| !s.is_jump()).map(|s| s.color()).collect();
        assert!(sewing.iter().all(|c| *c == "#FF0000" || *c == "#0000FF"));
        assert_eq!(sewing.windows(2).filter(|w| w[0] != w[1]).count(), 1);
    }

    #[test]
    fn params_deserialize_with_pattern_tag() {
        let params: PatternParams = serde_json::from_str(r#"{"pattern": "contour", "spacing": 2.5}"#).unwrap();
        assert_eq!(params, PatternParams::Contour(ContourParams { spacing: 2.5 }));
    }
}

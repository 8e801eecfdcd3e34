//! Design files: declarative stitch plans in YAML.
//!
//! A design lists shapes in sewing order. Each shape names a pattern
//! family, its parameters and its geometry. Thread settings on a shape are
//! merged over the design defaults key by key.
//!
//! ```yaml
//! name: Badge
//! defaults:
//!   thread: { color: "#202020", thickness: 0.4 }
//! shapes:
//!   - pattern: fill
//!     density: 3
//!     polygon: [[0, 0], [40, 0], [40, 30], [0, 30]]
//!   - pattern: satin
//!     rails: [[[0, 35], [40, 35]], [[0, 40], [40, 40]]]
//!     rungs: [[[0, 35], [0, 40]], [[40, 35], [40, 40]]]
//!     thread: { color: "#CC2200" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use stitch_king::{
    run_batch, FabricProperties, JitterConfig, Job, MaterializeOptions, OptimizeConfig,
    PatternKind, PipelineOptions, Point, Polygon, Polyline, Shape, ThreadProperties,
};

use super::common::{log_report, parse_pattern, render_plan, write_output, OutputFormat, ParamOverrides};

#[derive(Debug, Args)]
pub struct DesignArgs {
    /// Design file (YAML)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep shapes in design order
    #[arg(long)]
    pub no_optimize: bool,
}

/// A complete design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub defaults: DesignDefaults,

    /// Twist jitter, off when absent
    #[serde(default)]
    pub jitter: Option<JitterConfig>,

    /// Gap in mm above which a jump is inserted
    #[serde(default)]
    pub jump_threshold: Option<f64>,

    /// Shapes in sewing order
    pub shapes: Vec<DesignShape>,
}

/// Settings every shape starts from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignDefaults {
    pub thread: ThreadProperties,
    pub fabric: FabricProperties,
}

/// A single shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignShape {
    #[serde(default)]
    pub name: Option<String>,

    /// Pattern family (fill, satin, contour, tartan, meander)
    pub pattern: String,

    #[serde(default)]
    pub density: Option<f64>,
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub underlay: Option<bool>,
    #[serde(default)]
    pub spacing: Option<f64>,
    #[serde(default)]
    pub stripe_width: Option<f64>,
    #[serde(default)]
    pub stripe_spacing: Option<f64>,

    /// Exterior ring for region families
    #[serde(default)]
    pub polygon: Vec<[f64; 2]>,
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,

    /// Two rails for satin
    #[serde(default)]
    pub rails: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub rungs: Vec<Vec<[f64; 2]>>,

    /// Thread keys to merge over the defaults
    #[serde(default)]
    pub thread: Option<serde_yaml::Mapping>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

fn points(coords: &[[f64; 2]]) -> Vec<Point> {
    coords.iter().map(|&[x, y]| Point::new(x, y)).collect()
}

impl DesignShape {
    fn overrides(&self) -> ParamOverrides {
        ParamOverrides {
            density: self.density,
            angle: self.angle,
            underlay: self.underlay,
            spacing: self.spacing,
            stripe_width: self.stripe_width,
            stripe_spacing: self.stripe_spacing,
        }
    }

    fn shape(&self, kind: PatternKind) -> Shape {
        if kind.metadata().needs_rails {
            Shape::Column {
                rails: self.rails.iter().map(|r| Polyline::new(points(r))).collect(),
                rungs: self.rungs.iter().map(|r| Polyline::new(points(r))).collect(),
            }
        } else {
            let mut polygon = Polygon::with_holes(points(&self.polygon), self.holes.iter().map(|h| points(h)).collect());
            polygon.id = self.name.clone();
            Shape::Region(polygon)
        }
    }
}

impl Design {
    /// Load a design from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid design file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let design: Design = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        if design.shapes.is_empty() {
            bail!("design '{}' has no shapes", design.name);
        }
        Ok(design)
    }

    /// Build jobs for the enabled shapes.
    ///
    /// Returns the jobs and, for each job, the index of its shape in the
    /// design, so batch errors can point back at the file.
    pub fn to_jobs(&self) -> Result<(Vec<Job>, Vec<usize>)> {
        let mut jobs = Vec::new();
        let mut indices = Vec::new();

        for (index, shape) in self.shapes.iter().enumerate() {
            if !shape.enabled {
                debug!(index, "shape disabled");
                continue;
            }
            let kind = parse_pattern(&shape.pattern).with_context(|| format!("shape {index}"))?;
            let thread = self
                .thread_for(shape)
                .with_context(|| format!("shape {index}: invalid thread"))?;

            jobs.push(Job::new(shape.shape(kind), shape.overrides().params_for(kind), thread));
            indices.push(index);
        }

        Ok((jobs, indices))
    }

    /// Defaults with the shape's thread keys laid over them.
    fn thread_for(&self, shape: &DesignShape) -> Result<ThreadProperties> {
        let Some(overrides) = &shape.thread else {
            return Ok(self.defaults.thread.clone());
        };

        let mut merged = match serde_yaml::to_value(&self.defaults.thread)? {
            serde_yaml::Value::Mapping(map) => map,
            _ => serde_yaml::Mapping::new(),
        };
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        Ok(serde_yaml::from_value(serde_yaml::Value::Mapping(merged))?)
    }

    pub fn pipeline_options(&self, timestamp: i64, optimize: bool) -> PipelineOptions {
        let optimize_config = OptimizeConfig {
            jump_threshold: self.jump_threshold.unwrap_or(OptimizeConfig::default().jump_threshold),
        };
        PipelineOptions {
            materialize: MaterializeOptions {
                timestamp,
                fabric: self.defaults.fabric.clone(),
                ..Default::default()
            },
            jitter: self.jitter,
            optimize: optimize.then_some(optimize_config),
        }
    }
}

/// Execute the design command.
pub fn cmd_design(args: &DesignArgs) -> Result<()> {
    info!(path = %args.input.display(), "loading design");
    let design = Design::load(&args.input)?;
    let (jobs, indices) = design.to_jobs()?;
    info!(
        name = %design.name,
        description = design.description.as_deref().unwrap_or(""),
        shapes = design.shapes.len(),
        jobs = jobs.len(),
        "design loaded"
    );

    let options = design.pipeline_options(chrono::Utc::now().timestamp_millis(), !args.no_optimize);
    let mut report = run_batch(&jobs, &options);

    // Report errors against the design's own shape numbering
    for error in &mut report.errors {
        if let Some(&index) = indices.get(error.shape_index) {
            error.shape_index = index;
        }
    }
    log_report(&report);

    let output = render_plan(&report, args.format, Some(&design.name), None)?;
    write_output(&output, args.output.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_king::{PatternParams, SatinParams};

    const BADGE: &str = r##"
name: Badge
defaults:
  thread:
    color: "#202020"
    twist: 0.8
shapes:
  - pattern: fill
    density: 3
    polygon: [[0, 0], [40, 0], [40, 30], [0, 30]]
  - pattern: contour
    enabled: false
    polygon: [[0, 0], [10, 0], [10, 10]]
  - pattern: satin
    density: 2
    rails: [[[0, 35], [40, 35]], [[0, 40], [40, 40]]]
    rungs: [[[5, 35], [5, 40]], [[35, 35], [35, 40]]]
    thread:
      color: "#CC2200"
"##;

    #[test]
    fn parses_and_skips_disabled_shapes() {
        let design = Design::from_yaml(BADGE).unwrap();
        let (jobs, indices) = design.to_jobs().unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(indices, vec![0, 2]);
        assert!(matches!(jobs[1].shape, Shape::Column { .. }));
        assert_eq!(
            jobs[1].params,
            PatternParams::Satin(SatinParams { density: 2.0, ..Default::default() })
        );
    }

    #[test]
    fn thread_override_keeps_other_defaults() {
        let design = Design::from_yaml(BADGE).unwrap();
        let (jobs, _) = design.to_jobs().unwrap();

        assert_eq!(jobs[0].thread.color, "#202020");
        assert_eq!(jobs[1].thread.color, "#CC2200");
        assert_eq!(jobs[1].thread.twist, 0.8);
    }

    #[test]
    fn unknown_pattern_is_an_error() {
        let yaml = "name: x\nshapes:\n  - pattern: zigzag\n    polygon: [[0, 0], [1, 0], [1, 1]]\n";
        let design = Design::from_yaml(yaml).unwrap();
        assert!(design.to_jobs().is_err());
    }

    #[test]
    fn empty_design_is_rejected() {
        assert!(Design::from_yaml("name: x\nshapes: []\n").is_err());
    }

    #[test]
    fn jump_threshold_reaches_optimizer() {
        let yaml = "name: x\njump_threshold: 2.5\nshapes:\n  - pattern: fill\n    polygon: [[0, 0], [1, 0], [1, 1]]\n";
        let design = Design::from_yaml(yaml).unwrap();
        let options = design.pipeline_options(0, true);
        assert_eq!(options.optimize, Some(OptimizeConfig { jump_threshold: 2.5 }));
        assert_eq!(design.pipeline_options(0, false).optimize, None);
    }
}

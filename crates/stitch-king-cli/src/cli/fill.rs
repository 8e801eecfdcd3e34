//! Fill command implementation.
//!
//! Every closed region in the artwork becomes one job. `data-*` attributes
//! on an element override the command-line parameters for that element.
//! With `-p satin`, open paths sharing an id are read as a column: the
//! first two subpaths are the rails, the rest are rungs.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info, warn};

use stitch_king::{
    extract_shapes_from_svg, run_batch, JitterConfig, Job, MaterializeOptions, OpenPath,
    OptimizeConfig, PatternKind, PipelineOptions, Polygon, Polyline, Shape, SvgShapes,
    ThreadProperties,
};

use super::common::{
    extract_viewbox, log_report, parse_pattern, read_input, render_plan, write_output,
    OutputFormat, ParamOverrides,
};

#[derive(Debug, Args)]
pub struct FillArgs {
    /// SVG file, or '-' for stdin
    #[arg(value_name = "SVG")]
    pub input: String,

    /// Pattern family (see `stitch-king patterns`)
    #[arg(short, long, default_value = "fill")]
    pub pattern: String,

    /// Stitch density in stitches per mm
    #[arg(short, long)]
    pub density: Option<f64>,

    /// Row angle in degrees
    #[arg(short, long, allow_negative_numbers = true)]
    pub angle: Option<f64>,

    /// Ring or stripe spacing in mm
    #[arg(short, long)]
    pub spacing: Option<f64>,

    /// Lay a perpendicular underlay pass first
    #[arg(long)]
    pub underlay: bool,

    /// Thread color for shapes without their own
    #[arg(long, value_name = "HEX")]
    pub color: Option<String>,

    /// Seed for twist jitter (random when --twist is given alone)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Twist jitter amplitude in mm
    #[arg(long, value_name = "MM")]
    pub twist: Option<f64>,

    /// Keep shapes in document order
    #[arg(long)]
    pub no_optimize: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Svg)]
    pub format: OutputFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl FillArgs {
    fn overrides(&self) -> ParamOverrides {
        ParamOverrides {
            density: self.density,
            angle: self.angle,
            underlay: self.underlay.then_some(true),
            spacing: self.spacing,
            ..Default::default()
        }
    }

    fn jitter(&self) -> Option<JitterConfig> {
        if self.seed.is_none() && self.twist.is_none() {
            return None;
        }
        let seed = self.seed.unwrap_or_else(|| {
            let seed = rand::random::<u64>();
            info!(seed, "twist jitter seed drawn; pass --seed to reproduce");
            seed
        });
        let config = JitterConfig::default().with_seed(seed);
        Some(match self.twist {
            Some(amplitude) => config.with_amplitude(amplitude),
            None => config,
        })
    }

    fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            materialize: MaterializeOptions {
                timestamp: chrono::Utc::now().timestamp_millis(),
                ..Default::default()
            },
            jitter: self.jitter(),
            optimize: (!self.no_optimize).then(OptimizeConfig::default),
        }
    }
}

/// Execute the fill command.
pub fn cmd_fill(args: &FillArgs) -> Result<()> {
    let kind = parse_pattern(&args.pattern)?;
    let svg_content = read_input(&args.input)?;
    let shapes = extract_shapes_from_svg(&svg_content).context("Failed to parse SVG")?;

    let with_holes = shapes.polygons.iter().filter(|p| !p.holes.is_empty()).count();
    info!(
        polygons = shapes.polygons.len(),
        with_holes,
        open_paths = shapes.open_paths.len(),
        "shapes loaded"
    );

    let jobs = build_jobs(&shapes, kind, args.overrides(), args.color.as_deref());

    let start = Instant::now();
    let report = run_batch(&jobs, &args.pipeline_options());
    info!(jobs = jobs.len(), elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "batch finished");
    log_report(&report);

    let viewbox = extract_viewbox(&svg_content);
    let output = render_plan(&report, args.format, None, viewbox.as_deref())?;
    write_output(&output, args.output.as_deref())
}

// ============================================================================
// JOB BUILDING
// ============================================================================

/// Turn imported shapes into pipeline jobs.
///
/// Thread color resolves as `data-color`, then `color`, then the element's
/// own hex fill (or stroke, for columns), then black.
pub fn build_jobs(
    shapes: &SvgShapes,
    kind: PatternKind,
    flags: ParamOverrides,
    color: Option<&str>,
) -> Vec<Job> {
    let mut jobs: Vec<Job> = shapes
        .polygons
        .iter()
        .map(|polygon| region_job(polygon, kind, flags, color))
        .collect();

    if kind == PatternKind::Satin {
        jobs.extend(column_jobs(&shapes.open_paths, flags, color));
    } else if !shapes.open_paths.is_empty() {
        debug!(count = shapes.open_paths.len(), "open paths ignored by {} pattern", kind);
    }

    jobs
}

fn region_job(polygon: &Polygon, kind: PatternKind, flags: ParamOverrides, color: Option<&str>) -> Job {
    let kind = match polygon.data_pattern.as_deref() {
        Some(name) => PatternKind::from_name(name).unwrap_or_else(|| {
            warn!(id = ?polygon.id, pattern = name, "unknown data-pattern, using {}", kind);
            kind
        }),
        None => kind,
    };

    let own = ParamOverrides {
        density: polygon.data_density,
        angle: polygon.data_angle,
        ..Default::default()
    };
    let params = own.or(flags).params_for(kind);

    let thread_color = polygon
        .data_color
        .as_deref()
        .or(color)
        .or(hex_color(polygon.fill_color.as_deref()));

    Job::new(polygon.clone(), params, thread(thread_color))
}

fn column_jobs(open_paths: &[OpenPath], flags: ParamOverrides, color: Option<&str>) -> Vec<Job> {
    let params = flags.params_for(PatternKind::Satin);

    open_paths
        .chunk_by(|a, b| a.id.is_some() && a.id == b.id)
        .filter_map(|group| {
            if group.len() < 3 {
                debug!(id = ?group[0].id, subpaths = group.len(), "open path is not a column");
                return None;
            }
            let rails: Vec<Polyline> = group[..2].iter().map(|p| p.line.clone()).collect();
            let rungs: Vec<Polyline> = group[2..].iter().map(|p| p.line.clone()).collect();
            let thread_color = color.or(hex_color(group[0].stroke_color.as_deref()));
            Some(Job::new(Shape::Column { rails, rungs }, params, thread(thread_color)))
        })
        .collect()
}

/// Only plain colors make a thread; gradients and patterns do not.
fn hex_color(paint: Option<&str>) -> Option<&str> {
    paint.filter(|c| c.starts_with('#'))
}

fn thread(color: Option<&str>) -> ThreadProperties {
    color.map(ThreadProperties::with_color).unwrap_or_default()
}

//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use quick_xml::escape::escape;
use serde::Serialize;
use tracing::info;

use stitch_king::{
    BatchReport, Bounds, ContourParams, FillParams, MeanderParams, PatternKind, PatternParams,
    Point, SatinParams, Stitch, TartanParams,
};

/// Output format for the stitch plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Svg,
}

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        info!("reading from stdin");
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        info!(path, "loading");
        fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
    }
}

/// Write to a file when a path is given, otherwise to stdout.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = content.len(), "plan written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Optional parameter values layered over a family's defaults.
///
/// `spacing` doubles as the tartan stripe spacing when `stripe_spacing` is
/// unset, so `-s` means the same thing for every spaced family.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParamOverrides {
    pub density: Option<f64>,
    pub angle: Option<f64>,
    pub underlay: Option<bool>,
    pub spacing: Option<f64>,
    pub stripe_width: Option<f64>,
    pub stripe_spacing: Option<f64>,
}

impl ParamOverrides {
    /// Values set on `self` win; the rest come from `fallback`.
    pub fn or(self, fallback: ParamOverrides) -> ParamOverrides {
        ParamOverrides {
            density: self.density.or(fallback.density),
            angle: self.angle.or(fallback.angle),
            underlay: self.underlay.or(fallback.underlay),
            spacing: self.spacing.or(fallback.spacing),
            stripe_width: self.stripe_width.or(fallback.stripe_width),
            stripe_spacing: self.stripe_spacing.or(fallback.stripe_spacing),
        }
    }

    pub fn params_for(&self, kind: PatternKind) -> PatternParams {
        match kind {
            PatternKind::Fill => {
                let d = FillParams::default();
                PatternParams::Fill(FillParams {
                    density: self.density.unwrap_or(d.density),
                    angle: self.angle.unwrap_or(d.angle),
                    underlay: self.underlay.unwrap_or(d.underlay),
                })
            }
            PatternKind::Satin => {
                let d = SatinParams::default();
                PatternParams::Satin(SatinParams {
                    density: self.density.unwrap_or(d.density),
                    angle: self.angle.unwrap_or(d.angle),
                    underlay: self.underlay.unwrap_or(d.underlay),
                })
            }
            PatternKind::Contour => {
                let d = ContourParams::default();
                PatternParams::Contour(ContourParams { spacing: self.spacing.unwrap_or(d.spacing) })
            }
            PatternKind::Tartan => {
                let d = TartanParams::default();
                PatternParams::Tartan(TartanParams {
                    stripe_width: self.stripe_width.unwrap_or(d.stripe_width),
                    stripe_spacing: self.stripe_spacing.or(self.spacing).unwrap_or(d.stripe_spacing),
                })
            }
            PatternKind::Meander => {
                let d = MeanderParams::default();
                PatternParams::Meander(MeanderParams { density: self.density.unwrap_or(d.density) })
            }
        }
    }
}

/// Parse a family name, listing the valid ones on failure.
pub fn parse_pattern(name: &str) -> Result<PatternKind> {
    PatternKind::from_name(name).with_context(|| {
        let names: Vec<&str> = PatternKind::all().iter().map(|k| k.name()).collect();
        format!("Unknown pattern: {name}. Available: {}", names.join(", "))
    })
}

// ============================================================================
// PLAN OUTPUT
// ============================================================================

/// JSON document written for a finished plan.
#[derive(Serialize)]
struct PlanDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    generated_at: String,
    #[serde(flatten)]
    report: &'a BatchReport,
}

/// Render a plan as pretty JSON.
pub fn plan_to_json(report: &BatchReport, name: Option<&str>) -> Result<String> {
    let doc = PlanDocument {
        name,
        generated_at: chrono::Utc::now().to_rfc3339(),
        report,
    };
    let mut json = serde_json::to_string_pretty(&doc).context("Failed to serialize plan")?;
    json.push('\n');
    Ok(json)
}

/// Render a plan as an SVG preview: one `<polyline>` per stitch in sewing
/// order, stroked with its thread color. Jumps are drawn thin and dashed.
///
/// Uses `viewbox` when given, otherwise the bounds of the stitches.
/// Attribute values taken from input are XML-escaped.
pub fn plan_to_svg(stitches: &[Stitch], viewbox: Option<&str>) -> String {
    let viewbox = viewbox
        .map(str::to_string)
        .or_else(|| plan_bounds(stitches).map(|b| bounds_to_viewbox(&b)))
        .unwrap_or_else(|| "0 0 100 100".to_string());

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="{}">
<g fill="none" stroke-linecap="round" stroke-linejoin="round">
"#,
        escape(viewbox.as_str())
    ));

    for stitch in stitches {
        if stitch.points.len() < 2 {
            continue;
        }

        let points: String = stitch
            .points
            .iter()
            .map(|p| format!("{:.2},{:.2}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");

        if stitch.is_jump() {
            svg.push_str(&format!(
                "  <polyline id=\"{}\" points=\"{}\" stroke=\"#888888\" stroke-width=\"0.1\" stroke-dasharray=\"0.5,0.5\"/>\n",
                escape(stitch.id.as_str()),
                points
            ));
        } else {
            svg.push_str(&format!(
                "  <polyline id=\"{}\" points=\"{}\" stroke=\"{}\" stroke-width=\"{:.2}\"/>\n",
                escape(stitch.id.as_str()),
                points,
                escape(stitch.color()),
                stitch.thread.thickness.max(0.1)
            ));
        }
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

fn plan_bounds(stitches: &[Stitch]) -> Option<Bounds> {
    let points: Vec<Point> = stitches.iter().flat_map(|s| s.points.iter().map(|p| p.xy())).collect();
    Bounds::from_points(&points)
}

fn bounds_to_viewbox(b: &Bounds) -> String {
    let margin = 1.0;
    format!(
        "{:.2} {:.2} {:.2} {:.2}",
        b.min_x - margin,
        b.min_y - margin,
        b.width() + 2.0 * margin,
        b.height() + 2.0 * margin
    )
}

/// Extract viewBox from SVG content.
pub fn extract_viewbox(svg: &str) -> Option<String> {
    ["viewBox=\"", "viewbox=\""].iter().find_map(|attr| {
        let start = svg.find(attr)? + attr.len();
        let rest = &svg[start..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    })
}

/// Render a plan in the requested format.
pub fn render_plan(
    report: &BatchReport,
    format: OutputFormat,
    name: Option<&str>,
    viewbox: Option<&str>,
) -> Result<String> {
    match format {
        OutputFormat::Json => plan_to_json(report, name),
        OutputFormat::Svg => Ok(plan_to_svg(&report.stitches, viewbox)),
    }
}

/// Log the plan summary and any skipped shapes.
pub fn log_report(report: &BatchReport) {
    let stats = &report.stats;
    info!(
        sewing = stats.sewing_stitches,
        jumps = stats.jump_stitches,
        travel_before = stats.travel_before,
        travel_after = stats.travel_after,
        skipped = report.errors.len(),
        "stitch plan ready"
    );
}

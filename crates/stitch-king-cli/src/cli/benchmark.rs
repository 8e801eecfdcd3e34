//! Benchmark command implementation.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use stitch_king::{
    extract_shapes_from_svg, jump_count, optimize, run_batch, travel_distance, OptimizeConfig,
    PipelineOptions,
};

use super::common::{parse_pattern, ParamOverrides};
use super::fill::build_jobs;

#[derive(Debug, Args)]
pub struct BenchmarkArgs {
    /// SVG file
    #[arg(value_name = "SVG")]
    pub input: PathBuf,

    /// Pattern family to benchmark
    #[arg(short, long, default_value = "fill")]
    pub pattern: String,
}

/// Execute the benchmark command.
pub fn cmd_benchmark(args: &BenchmarkArgs) -> Result<()> {
    let kind = parse_pattern(&args.pattern)?;

    println!("Loading: {}", args.input.display());
    let start_load = Instant::now();
    let svg_content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let shapes = extract_shapes_from_svg(&svg_content).context("Failed to parse SVG")?;
    let load_time = start_load.elapsed();
    println!("Loaded {} polygons in {:?}", shapes.polygons.len(), load_time);

    let jobs = build_jobs(&shapes, kind, ParamOverrides::default(), None);

    println!("\nRunning '{}' pattern...", kind);
    let start_gen = Instant::now();
    let report = run_batch(&jobs, &PipelineOptions { optimize: None, ..Default::default() });
    let gen_time = start_gen.elapsed();

    if !report.is_clean() {
        warn!(skipped = report.errors.len(), "some shapes were skipped");
    }

    let stitch_count = report.stitches.len();
    let travel_before = travel_distance(&report.stitches);

    let start_opt = Instant::now();
    let ordered = optimize(report.stitches, &OptimizeConfig::default());
    let opt_time = start_opt.elapsed();

    let per_job_ms = gen_time.as_secs_f64() * 1000.0 / jobs.len().max(1) as f64;

    println!();
    println!("═══════════════════════════════════════════════");
    println!("  BENCHMARK: {}", kind.name().to_uppercase());
    println!("═══════════════════════════════════════════════");
    println!("  Shapes: {} ({} skipped)", jobs.len(), report.errors.len());
    println!("  Stitches generated: {}", stitch_count);
    println!("  Generation (ms): {:.2}", gen_time.as_secs_f64() * 1000.0);
    println!("  Avg per shape: {:.3}ms", per_job_ms);
    println!("  Optimization (ms): {:.2}", opt_time.as_secs_f64() * 1000.0);
    println!("  Jumps inserted: {}", jump_count(&ordered));
    println!("  Travel: {:.1} -> {:.1} mm", travel_before, travel_distance(&ordered));
    println!("═══════════════════════════════════════════════");

    Ok(())
}

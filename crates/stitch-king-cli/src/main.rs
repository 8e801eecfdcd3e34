//! stitch-king - CLI for embroidery stitch generation
//!
//! Usage:
//!   stitch-king fill <svg|-> -p <pattern>   Stitch every shape in an SVG
//!   stitch-king design <file.yaml>          Stitch a YAML design file
//!   stitch-king patterns                    List pattern families
//!   stitch-king benchmark <svg>             Time generation and optimization
//!
//! Logs go to stderr. Stdout carries only the plan.

mod cli;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "stitch-king", version, about = "Embroidery stitch generation", long_about = None)]
struct Cli {
    /// Log debug events (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stitch every shape in an SVG file ('-' reads stdin)
    Fill(cli::FillArgs),
    /// Stitch a YAML design file
    Design(cli::DesignArgs),
    /// List the pattern families and their parameters
    Patterns,
    /// Time generation and optimization on an SVG file
    Benchmark(cli::BenchmarkArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Fill(args) => cli::cmd_fill(&args),
        Command::Design(args) => cli::cmd_design(&args),
        Command::Patterns => {
            cli::cmd_patterns();
            Ok(())
        }
        Command::Benchmark(args) => cli::cmd_benchmark(&args),
    }
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `-v`.
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

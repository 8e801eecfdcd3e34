//! CLI command implementations.
//!
//! - `fill` - Stitch the shapes of an SVG file
//! - `design` - Stitch a YAML design file
//! - `patterns` - List pattern families
//! - `benchmark` - Time generation and optimization

pub mod benchmark;
pub mod common;
pub mod design;
pub mod fill;

pub use benchmark::{cmd_benchmark, BenchmarkArgs};
pub use design::{cmd_design, DesignArgs};
pub use fill::{cmd_fill, FillArgs};

use stitch_king::PatternKind;

/// Execute the patterns command.
pub fn cmd_patterns() {
    println!("Available patterns:");
    for kind in PatternKind::all() {
        let meta = kind.metadata();
        let rails = if meta.needs_rails { "  [rails + rungs]" } else { "" };
        println!("  {:<8} {}{}", kind.name(), meta.description, rails);
        println!("           spacing: {}, angle: {}", meta.spacing_label, meta.angle_label);
    }
}

//! # stitch-king
//!
//! Embroidery stitch generation: vector shapes in, an ordered stitch plan out.
//!
//! ```text
//! svg / design ─▶ Shape ─▶ patterns::* ─▶ RawPattern ─▶ stitch ─▶ order ─▶ Vec<Stitch>
//! ```
//!
//! ## Rust Lesson #7: Modules
//!
//! - `mod foo;` = load from `foo.rs` or `foo/mod.rs`
//! - `pub mod foo;` = also export it publicly
//! - `pub use foo::Bar;` = re-export Bar at this level
//!
//! Every module must be declared explicitly; nothing is picked up from the
//! directory listing.

pub mod clip;
pub mod error;
pub mod geometry;
pub mod jitter;
pub mod order;
pub mod patterns;
pub mod pipeline;
pub mod stitch;
pub mod svg;

// Re-export common types at crate root for convenience.
pub use clip::{offset_polygon, point_in_polygon, segment_intersection, Intersection};
pub use error::{StitchError, SvgError};
pub use geometry::{Bounds, Line, Point, Point3, Polygon, Polyline};
pub use jitter::{apply_twist_jitter, JitterConfig};
pub use order::{jump_count, optimize, travel_distance, OptimizeConfig, JUMP_THRESHOLD_MM};
pub use patterns::{
    ContourParams, FillParams, MeanderParams, PatternKind, RawPattern, SatinParams, TartanParams,
};
pub use pipeline::{
    generate_raw, run_batch, run_job, BatchReport, Job, PatternParams, PipelineOptions, PlanStats,
    Shape, ShapeError,
};
pub use stitch::{
    normalize_color, FabricProperties, MaterializeOptions, Materializer, Stitch, StitchType,
    ThreadProperties,
};
pub use svg::{extract_shapes_from_svg, OpenPath, SvgShapes};

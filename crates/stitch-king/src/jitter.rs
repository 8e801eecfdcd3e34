//! Thread-twist jitter.
//!
//! Real thread does not lie perfectly flat. Jitter lifts each stitch point
//! by a small random height scaled by the thread's twist factor, so a
//! renderer can show the loft. Randomness always comes from an explicit
//! seed.
//!
//! Every sewing stitch draws from its own generator, keyed by the seed and
//! the stitch's position among sewing stitches. A stitch's heights depend
//! only on that key, never on how many points came before it.
//!
//! # Example
//! ```ignore
//! let config = JitterConfig { seed: 7, twist_amplitude: 0.05 };
//! apply_twist_jitter(&mut stitches, &config);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stitch::Stitch;

/// Odd 64-bit constant spreading consecutive indices across the seed space.
const STREAM_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// Configuration for twist jitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    pub seed: u64,
    /// Maximum height displacement in mm for a thread with twist 1.0
    pub twist_amplitude: f64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self { seed: 0, twist_amplitude: 0.05 }
    }
}

impl JitterConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_amplitude(mut self, twist_amplitude: f64) -> Self {
        self.twist_amplitude = twist_amplitude;
        self
    }
}

/// Displace the `z` of every sewing stitch point.
///
/// `z += u × twist_amplitude × thread.twist` with `u` uniform in [-1, 1),
/// drawn from the stitch's own stream. Jump stitches are skipped and take
/// no stream index, so adding or removing jumps does not shift the others.
pub fn apply_twist_jitter(stitches: &mut [Stitch], config: &JitterConfig) {
    if config.twist_amplitude == 0.0 || !config.twist_amplitude.is_finite() {
        return;
    }

    let mut displaced = 0usize;

    for (index, stitch) in stitches.iter_mut().filter(|s| !s.is_jump()).enumerate() {
        let mut rng = stitch_stream(config.seed, index);
        let scale = config.twist_amplitude * stitch.thread.twist;
        for p in &mut stitch.points {
            p.z += rng.random_range(-1.0..1.0) * scale;
        }
        displaced += stitch.points.len();
    }

    debug!(seed = config.seed, points = displaced, "twist jitter applied");
}

fn stitch_stream(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (index as u64).wrapping_add(1).wrapping_mul(STREAM_STEP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Polygon};
    use crate::patterns::{generate_fill, FillParams};
    use crate::stitch::{materialize, MaterializeOptions, ThreadProperties};

    fn stitches() -> Vec<Stitch> {
        let raws = generate_fill(&Polygon::rectangle(0.0, 0.0, 5.0, 5.0), &FillParams::default()).unwrap();
        materialize(&raws, &ThreadProperties::default(), &MaterializeOptions::default())
    }

    #[test]
    fn same_seed_same_heights() {
        let config = JitterConfig::default().with_seed(99);
        let mut a = stitches();
        let mut b = stitches();
        apply_twist_jitter(&mut a, &config);
        apply_twist_jitter(&mut b, &config);
        assert_eq!(a, b);
        assert!(a.iter().flat_map(|s| &s.points).any(|p| p.z != 0.0));
    }

    #[test]
    fn displacement_is_bounded_by_twist() {
        let config = JitterConfig { seed: 3, twist_amplitude: 0.2 };
        let mut s = stitches();
        apply_twist_jitter(&mut s, &config);
        // default twist is 0.5
        assert!(s.iter().flat_map(|s| &s.points).all(|p| p.z.abs() <= 0.1));
    }

    #[test]
    fn streams_are_independent_per_stitch() {
        let config = JitterConfig::default().with_seed(5);
        let mut a = stitches();
        let mut b = stitches();
        assert!(a.len() >= 2);
        // Lengthen the first stitch; the second must keep its heights
        let extra = b[0].points[0];
        b[0].points.insert(0, extra);

        apply_twist_jitter(&mut a, &config);
        apply_twist_jitter(&mut b, &config);

        let za: Vec<f64> = a[1].points.iter().map(|p| p.z).collect();
        let zb: Vec<f64> = b[1].points.iter().map(|p| p.z).collect();
        assert_eq!(za, zb);
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = stitches();
        let mut b = stitches();
        apply_twist_jitter(&mut a, &JitterConfig::default().with_seed(1));
        apply_twist_jitter(&mut b, &JitterConfig::default().with_seed(2));
        assert_ne!(a, b);
    }

    #[test]
    fn xy_untouched() {
        let before = stitches();
        let mut after = before.clone();
        apply_twist_jitter(&mut after, &JitterConfig::default());
        for (a, b) in before.iter().zip(&after) {
            let xa: Vec<Point> = a.points.iter().map(|p| p.xy()).collect();
            let xb: Vec<Point> = b.points.iter().map(|p| p.xy()).collect();
            assert_eq!(xa, xb);
        }
    }
}

//! Stitch-order optimization for minimizing machine travel.
//!
//! Generators emit stitches in whatever order is natural for their
//! geometry. Before sewing, the whole plan is reordered to keep thread
//! changes together and to shorten the non-sewing moves between stitches.
//!
//! ## Passes
//!
//! 1. **Sort**: color, then type tag, then centroid top-to-bottom,
//!    left-to-right.
//! 2. **Greedy**: nearest-neighbor tour inside each (color, type) group.
//!    O(n²) per group, no backtracking.
//! 3. **Jumps**: an explicit jump stitch wherever consecutive stitches are
//!    still more than the threshold apart.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::geometry::Point;
use crate::stitch::{Stitch, ThreadProperties};

/// Gaps longer than this get a jump stitch, in mm.
pub const JUMP_THRESHOLD_MM: f64 = 5.0;

/// Optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    pub jump_threshold: f64,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self { jump_threshold: JUMP_THRESHOLD_MM }
    }
}

/// Run all three passes and return the final traversal order.
///
/// Jump stitches already in the input are dropped first, so feeding the
/// optimizer its own output gives the same plan back. Empty and
/// single-stitch inputs pass through unchanged.
pub fn optimize(stitches: Vec<Stitch>, config: &OptimizeConfig) -> Vec<Stitch> {
    let mut sewing: Vec<Stitch> = stitches.into_iter().filter(|s| !s.is_jump()).collect();
    if sewing.len() <= 1 {
        return sewing;
    }

    let travel_before = travel_distance(&sewing);

    sort_stitches(&mut sewing);
    let ordered = greedy_reorder(sewing);
    let travel_after = travel_distance(&ordered);
    let planned = insert_jumps(ordered, config.jump_threshold);

    info!(
        stitches = planned.len(),
        jumps = jump_count(&planned),
        travel_before,
        travel_after,
        "stitch order optimized"
    );

    planned
}

// ============================================================================
// PASS 1: SORT
// ============================================================================

/// Sort key for one stitch, computed once.
struct SortKey {
    centroid: Point,
    first: Point,
}

impl SortKey {
    fn of(stitch: &Stitch) -> Self {
        // Empty stitches sort to the end of their group
        let far = Point::new(f64::INFINITY, f64::INFINITY);
        Self {
            centroid: stitch.centroid().unwrap_or(far),
            first: stitch.first_point().map_or(far, |p| p.xy()),
        }
    }
}

fn compare(a: &Stitch, ka: &SortKey, b: &Stitch, kb: &SortKey) -> Ordering {
    a.color()
        .cmp(b.color())
        .then_with(|| a.stitch_type.tag().cmp(b.stitch_type.tag()))
        .then_with(|| ka.centroid.y.total_cmp(&kb.centroid.y))
        .then_with(|| ka.centroid.x.total_cmp(&kb.centroid.x))
        // Exact centroid ties: break on geometry, then identity, so the
        // result never depends on input order
        .then_with(|| ka.first.y.total_cmp(&kb.first.y))
        .then_with(|| ka.first.x.total_cmp(&kb.first.x))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort stitches by color, type tag, then centroid y and x.
pub fn sort_stitches(stitches: &mut Vec<Stitch>) {
    let mut keyed: Vec<(SortKey, Stitch)> = stitches
        .drain(..)
        .map(|s| (SortKey::of(&s), s))
        .collect();

    keyed.sort_by(|(ka, a), (kb, b)| compare(a, ka, b, kb));

    stitches.extend(keyed.into_iter().map(|(_, s)| s));
}

// ============================================================================
// PASS 2: GREEDY NEAREST NEIGHBOR
// ============================================================================

#[inline]
fn same_group(a: &Stitch, b: &Stitch) -> bool {
    a.color() == b.color() && a.stitch_type == b.stitch_type
}

/// Reorder each run of same-group stitches by greedy nearest neighbor.
///
/// Expects sorted input. Each group starts at its first stitch; the next
/// pick is the remaining stitch whose first point is closest to the last
/// point of the one just placed. Ties go to the earliest in sorted order.
pub fn greedy_reorder(stitches: Vec<Stitch>) -> Vec<Stitch> {
    let mut out = Vec::with_capacity(stitches.len());
    let mut group: Vec<Stitch> = Vec::new();

    for stitch in stitches {
        if let Some(head) = group.first() {
            if !same_group(head, &stitch) {
                out.extend(greedy_group(std::mem::take(&mut group)));
            }
        }
        group.push(stitch);
    }
    out.extend(greedy_group(group));

    out
}

fn greedy_group(group: Vec<Stitch>) -> Vec<Stitch> {
    if group.len() <= 2 {
        return group;
    }

    let mut remaining: Vec<Option<Stitch>> = group.into_iter().map(Some).collect();
    let mut order = Vec::with_capacity(remaining.len());

    let Some(first) = remaining[0].take() else {
        return order;
    };
    let mut cursor = first.last_point().map(|p| p.xy());
    order.push(first);

    while order.len() < remaining.len() {
        let mut best: Option<(usize, f64)> = None;

        for (i, slot) in remaining.iter().enumerate() {
            let Some(candidate) = slot else { continue };
            let dist = match (cursor, candidate.first_point()) {
                (Some(from), Some(to)) => from.distance(to.xy()),
                _ => f64::INFINITY,
            };
            // Strict less-than keeps the earliest index on ties
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }

        let Some((index, _)) = best else { break };
        let Some(next) = remaining[index].take() else { break };
        cursor = next.last_point().map(|p| p.xy()).or(cursor);
        order.push(next);
    }

    order
}

// ============================================================================
// PASS 3: JUMP INSERTION
// ============================================================================

/// Insert a jump stitch between every consecutive pair more than
/// `threshold` apart. Jumps are numbered `jump-0`, `jump-1`, ... in order.
pub fn insert_jumps(stitches: Vec<Stitch>, threshold: f64) -> Vec<Stitch> {
    let jump_thread = Arc::new(ThreadProperties::jump());
    let mut out: Vec<Stitch> = Vec::with_capacity(stitches.len() * 2);
    let mut jumps = 0usize;

    for stitch in stitches {
        let from = out.last().and_then(Stitch::last_point);
        if let (Some(from), Some(to)) = (from, stitch.first_point()) {
            if from.xy().distance(to.xy()) > threshold {
                let fabric = Arc::clone(&stitch.fabric);
                out.push(Stitch::jump(jumps, from, to, Arc::clone(&jump_thread), fabric));
                jumps += 1;
            }
        }
        out.push(stitch);
    }

    out
}

// ============================================================================
// METRICS
// ============================================================================

/// Total gap between consecutive sewing stitches, jumps ignored.
///
/// Measured from the last point of each stitch to the first point of the
/// next, in the XY plane.
pub fn travel_distance(stitches: &[Stitch]) -> f64 {
    let mut total = 0.0;
    let mut cursor: Option<Point> = None;

    for stitch in stitches.iter().filter(|s| !s.is_jump()) {
        if let (Some(from), Some(to)) = (cursor, stitch.first_point()) {
            total += from.distance(to.xy());
        }
        if let Some(last) = stitch.last_point() {
            cursor = Some(last.xy());
        }
    }

    total
}

pub fn jump_count(stitches: &[Stitch]) -> usize {
    stitches.iter().filter(|s| s.is_jump()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point3, Polyline};
    use crate::patterns::RawPattern;
    use crate::stitch::{Materializer, MaterializeOptions, StitchType};

    fn line(m: &mut Materializer, color: &str, from: (f64, f64), to: (f64, f64)) -> Stitch {
        let raw = RawPattern::Fill {
            line: Polyline::new(vec![from.into(), to.into()]),
            angle: 0.0,
            density: 2.0,
            underlay: false,
        };
        m.materialize(&raw, &Arc::new(ThreadProperties::with_color(color)), None)
    }

    #[test]
    fn empty_and_single_are_noops() {
        assert!(optimize(Vec::new(), &OptimizeConfig::default()).is_empty());

        let mut m = Materializer::new(MaterializeOptions::default());
        let one = vec![line(&mut m, "#000000", (0.0, 0.0), (1.0, 0.0))];
        let out = optimize(one.clone(), &OptimizeConfig::default());
        assert_eq!(out, one);
    }

    #[test]
    fn eight_mm_gap_gets_one_jump() {
        let mut m = Materializer::new(MaterializeOptions::default());
        let stitches = vec![
            line(&mut m, "#000000", (0.0, 0.0), (1.0, 0.0)),
            line(&mut m, "#000000", (9.0, 0.0), (10.0, 0.0)),
        ];
        let out = insert_jumps(stitches, JUMP_THRESHOLD_MM);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].stitch_type, StitchType::Jump);
        assert_eq!(out[1].length, 8.0);
        assert_eq!(out[1].id, "jump-0");
        assert_eq!(out[1].points[0], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(out[1].points[1], Point3::new(9.0, 0.0, 0.0));
    }

    #[test]
    fn gap_at_threshold_is_contiguous() {
        let mut m = Materializer::new(MaterializeOptions::default());
        let stitches = vec![
            line(&mut m, "#000000", (0.0, 0.0), (1.0, 0.0)),
            line(&mut m, "#000000", (6.0, 0.0), (7.0, 0.0)),
        ];
        assert_eq!(jump_count(&insert_jumps(stitches, 5.0)), 0);
    }

    #[test]
    fn colors_grouped_then_raster_order() {
        let mut m = Materializer::new(MaterializeOptions::default());
        let mut stitches = vec![
            line(&mut m, "#FF0000", (0.0, 5.0), (1.0, 5.0)),
            line(&mut m, "#0000FF", (0.0, 9.0), (1.0, 9.0)),
            line(&mut m, "#FF0000", (0.0, 1.0), (1.0, 1.0)),
            line(&mut m, "#0000FF", (0.0, 2.0), (1.0, 2.0)),
        ];
        sort_stitches(&mut stitches);
        let keys: Vec<(&str, f64)> = stitches.iter().map(|s| (s.color(), s.points[0].y)).collect();
        assert_eq!(
            keys,
            vec![("#0000FF", 2.0), ("#0000FF", 9.0), ("#FF0000", 1.0), ("#FF0000", 5.0)]
        );
    }

    #[test]
    fn underlay_flag_does_not_affect_sort() {
        let mut m = Materializer::new(MaterializeOptions::default());
        let thread = Arc::new(ThreadProperties::default());
        let top = RawPattern::Fill {
            line: Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
            angle: 0.0, density: 2.0, underlay: false,
        };
        let under = RawPattern::Fill {
            line: Polyline::new(vec![Point::new(0.0, 9.0), Point::new(1.0, 9.0)]),
            angle: 90.0, density: 4.0, underlay: true,
        };
        let mut stitches = vec![m.materialize(&top, &thread, None), m.materialize(&under, &thread, None)];
        sort_stitches(&mut stitches);
        assert!(!stitches[0].underlay);
        assert_eq!(stitches[0].points[0].y, 0.0);
        assert_eq!(stitches[1].points[0].y, 9.0);
    }

    #[test]
    fn greedy_follows_nearest_first_point() {
        let mut m = Materializer::new(MaterializeOptions::default());
        // Sorted by centroid y: a, b, c. From a's end (10, 0), c starts closer than b.
        let a = line(&mut m, "#000000", (0.0, 0.0), (10.0, 0.0));
        let b = line(&mut m, "#000000", (0.0, 1.0), (10.0, 1.0));
        let c = line(&mut m, "#000000", (10.0, 2.0), (0.0, 2.0));
        let out = greedy_reorder(vec![a.clone(), b.clone(), c.clone()]);
        let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), c.id.as_str(), b.id.as_str()]);
    }

    #[test]
    fn existing_jumps_are_stripped() {
        let mut m = Materializer::new(MaterializeOptions::default());
        let stitches = vec![
            line(&mut m, "#000000", (0.0, 0.0), (1.0, 0.0)),
            line(&mut m, "#000000", (20.0, 0.0), (21.0, 0.0)),
        ];
        let once = optimize(stitches, &OptimizeConfig::default());
        let twice = optimize(once.clone(), &OptimizeConfig::default());
        assert_eq!(jump_count(&once), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn travel_ignores_jumps() {
        let mut m = Materializer::new(MaterializeOptions::default());
        let stitches = vec![
            line(&mut m, "#000000", (0.0, 0.0), (1.0, 0.0)),
            line(&mut m, "#000000", (4.0, 4.0), (5.0, 4.0)),
        ];
        let with_jumps = insert_jumps(stitches.clone(), 1.0);
        assert_eq!(jump_count(&with_jumps), 1);
        assert_eq!(travel_distance(&stitches), 5.0);
        assert_eq!(travel_distance(&with_jumps), 5.0);
    }
}

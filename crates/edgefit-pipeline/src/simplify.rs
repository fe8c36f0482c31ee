//! Path simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces point count in a path by removing points that lie within a
//! tolerance of the chord between retained neighbours. The split/merge
//! order is the textbook recursive one, driven by an explicit work stack
//! of index ranges so that long, nearly straight paths cannot exhaust the
//! call stack.
//!
//! This is step 3 in the pipeline, between segmentation and fitting.

use crate::types::{Point, Polyline};

/// Simplify a single polyline using the Ramer-Douglas-Peucker algorithm.
///
/// The first and last points are always kept, and every kept point is a
/// vertex of the input. An interior point survives only if, within its
/// enclosing range, it is the farthest from the chord and farther than
/// `epsilon`. When a range's endpoints coincide its chord has no
/// direction; distances are taken as zero and the range collapses.
/// A range only splits at a point strictly off its chord, so a negative
/// `epsilon` keeps every such point and still drops on-chord ones.
///
/// Polylines with fewer than 3 points are returned unchanged.
#[must_use = "returns the simplified polyline"]
pub fn simplify(polyline: &Polyline, epsilon: f64) -> Polyline {
    let points = polyline.points();
    if points.len() < 3 {
        return polyline.clone();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in (start + 1)..end {
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_idx > start && max_dist > epsilon {
            kept[max_idx] = true;
            stack.push((max_idx, end));
            stack.push((start, max_idx));
        }
    }

    let simplified: Vec<Point> = points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    Polyline::new(simplified)
}

/// Simplify multiple polylines, applying RDP to each independently.
#[must_use = "returns the simplified polylines"]
pub fn simplify_paths(polylines: &[Polyline], epsilon: f64) -> Vec<Polyline> {
    polylines.iter().map(|pl| simplify(pl, epsilon)).collect()
}

/// Perpendicular distance from point `p` to the line through `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide the line is undefined and the distance is 0.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return 0.0;
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

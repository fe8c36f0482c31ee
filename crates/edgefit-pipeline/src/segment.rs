//! Path segmentation: group edge points into ordered paths.
//!
//! This module defines the [`PathSegmenter`] trait for pluggable
//! segmentation strategies and the [`PathSegmenterKind`] enum for
//! selecting one at runtime, plus [`select_top`] which keeps the longest
//! paths.
//!
//! # Greedy chaining and its failure modes
//!
//! The default [`GreedyChain`](PathSegmenterKind::GreedyChain) strategy
//! sorts points by x only and chains each point to the last one appended.
//! It can merge unrelated structures that sit at the same x, and it splits
//! a single curve that bends back in x or runs vertically next to another
//! structure. That is the accepted heuristic; the
//! [`ConnectedComponents`](PathSegmenterKind::ConnectedComponents)
//! strategy is available when proper grouping matters more than
//! reproducing the greedy shape.
//!
//! This is step 2 in the pipeline, between edge extraction and
//! simplification.

use petgraph::unionfind::UnionFind;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

use crate::types::{Point, Polyline};

/// Paths with this many points or fewer are discarded.
pub const MIN_PATH_POINTS: usize = 20;

/// Selects which segmentation strategy groups edge points into paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathSegmenterKind {
    /// Single left-to-right greedy chain over x-sorted points.
    ///
    /// A point joins the current path when it is strictly closer than
    /// `max_gap` to the last point appended; otherwise the current path is
    /// committed (if long enough) and a new one starts at that point.
    #[default]
    GreedyChain,

    /// Connected components of the "closer than `max_gap`" relation.
    ///
    /// Neighbours are found with an R\*-tree radius query and merged with
    /// union-find. Each component becomes one path ordered by x. Unlike
    /// the greedy chain, consecutive points of a path are not guaranteed
    /// to be within `max_gap` of each other.
    ConnectedComponents,
}

/// Trait for segmentation strategies.
///
/// Input: unordered edge points. Output: paths with more than
/// [`MIN_PATH_POINTS`] points each, ordered by ascending x.
///
/// Only [`GreedyChain`](PathSegmenterKind::GreedyChain) guarantees that
/// consecutive points of a path are strictly closer than `max_gap`.
/// [`ConnectedComponents`](PathSegmenterKind::ConnectedComponents)
/// guarantees only that each path is one linked component, so its
/// x-ordered points may jump farther than `max_gap`.
pub trait PathSegmenter {
    /// Group `edges` into paths using `max_gap` as the linking distance.
    fn segment(&self, edges: &[Point], max_gap: f64) -> Vec<Polyline>;
}

impl PathSegmenter for PathSegmenterKind {
    fn segment(&self, edges: &[Point], max_gap: f64) -> Vec<Polyline> {
        let paths = match *self {
            Self::GreedyChain => segment_greedy(edges, max_gap),
            Self::ConnectedComponents => segment_components(edges, max_gap),
        };
        log::debug!(
            "segmentation ({:?}): {} edge points -> {} paths",
            self,
            edges.len(),
            paths.len(),
        );
        paths
    }
}

/// Segment with the default greedy chain.
#[must_use = "returns the segmented paths"]
pub fn segment(edges: &[Point], max_gap: f64) -> Vec<Polyline> {
    PathSegmenterKind::GreedyChain.segment(edges, max_gap)
}

/// Keep the `n` longest paths, longest first.
///
/// Paths of equal length keep their relative input order.
#[must_use = "returns the selected paths"]
pub fn select_top(paths: &[Polyline], n: usize) -> Vec<Polyline> {
    let mut ranked: Vec<&Polyline> = paths.iter().collect();
    ranked.sort_by_key(|p| std::cmp::Reverse(p.len()));
    ranked.into_iter().take(n).cloned().collect()
}

/// Stable sort by ascending x; ties keep scan order.
fn sorted_by_x(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
    sorted
}

fn commit(paths: &mut Vec<Polyline>, points: Vec<Point>) {
    if points.len() > MIN_PATH_POINTS {
        paths.push(Polyline::new(points));
    }
}

fn segment_greedy(edges: &[Point], max_gap: f64) -> Vec<Polyline> {
    let sorted = sorted_by_x(edges);
    let Some((&first, rest)) = sorted.split_first() else {
        return Vec::new();
    };

    let mut paths = Vec::new();
    let mut current = vec![first];
    let mut last = first;

    for &p in rest {
        if p.distance(last) < max_gap {
            current.push(p);
        } else {
            let finished = std::mem::replace(&mut current, vec![p]);
            commit(&mut paths, finished);
        }
        last = p;
    }
    commit(&mut paths, current);

    paths
}

fn segment_components(edges: &[Point], max_gap: f64) -> Vec<Polyline> {
    let sorted = sorted_by_x(edges);
    let n = sorted.len();
    if n == 0 {
        return Vec::new();
    }

    let tree = RTree::bulk_load(
        sorted
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new([p.x, p.y], i))
            .collect(),
    );

    let mut uf = UnionFind::<usize>::new(n);
    let radius_sq = max_gap * max_gap;
    for (i, &p) in sorted.iter().enumerate() {
        for neighbour in tree.locate_within_distance([p.x, p.y], radius_sq) {
            let j = neighbour.data;
            // The radius query is inclusive; the linking relation is strict.
            if j > i && p.distance(sorted[j]) < max_gap {
                uf.union(i, j);
            }
        }
    }
    let labels = uf.into_labeling();

    // Components appear in order of their first x-sorted point.
    let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
    let mut groups: Vec<Vec<Point>> = Vec::new();
    for (i, p) in sorted.into_iter().enumerate() {
        let root = labels[i];
        let slot = if let Some(slot) = slot_of_root[root] {
            slot
        } else {
            groups.push(Vec::new());
            slot_of_root[root] = Some(groups.len() - 1);
            groups.len() - 1
        };
        groups[slot].push(p);
    }

    let mut paths = Vec::new();
    for group in groups {
        commit(&mut paths, group);
    }
    paths
}

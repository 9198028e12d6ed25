//! Depth-bounded backtracking over the segment graph.
//!
//! A search starts at one segment and follows child links four times. A
//! walk that returns to its start is a candidate loop; its corners are the
//! intersections of consecutive segment lines and it is accepted only if it
//! passes the checks in [`validate_loop`].
//!
//! Every 4-cycle is reachable from each of its segments. Children are only
//! followed when their `theta` does not exceed the start segment's `theta`,
//! so a cycle is reported once, from its segment with the largest `theta`.

use crate::params::QuadSearchParams;
use crate::quad::Quad;
use nalgebra::Point2;
use std::ops::AddAssign;
use tagquad_core::{
    direction_angle, distance, intersect_lines, mod2pi, Segment, SegmentGraph, SegmentId,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Number of segments in a closed loop.
const LOOP_LEN: usize = 4;
/// Acceptance window for the summed turning angle, around -2π.
const WINDING_MIN: f32 = -7.0;
const WINDING_MAX: f32 = -5.0;

/// Why a closed loop was not turned into a [`Quad`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuadRejection {
    /// Lines of segments `corner` and `corner + 1` are (nearly) parallel.
    NoIntersection { corner: usize },
    /// Turning-angle sum outside `[-7, -5]`: self-intersecting or wound the
    /// wrong way.
    Winding { total: f32 },
    /// An edge or diagonal is shorter than `min_edge_length`.
    EdgeTooShort { length: f32 },
    /// Longest over shortest edge exceeds `max_aspect_ratio`.
    AspectRatio { ratio: f32 },
}

/// Counters collected while searching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub closed_loops: usize,
    pub accepted: usize,
    pub no_intersection: usize,
    pub winding: usize,
    pub edge_too_short: usize,
    pub aspect_ratio: usize,
}

impl SearchStats {
    fn record(&mut self, outcome: &Result<Quad, QuadRejection>) {
        self.closed_loops += 1;
        match outcome {
            Ok(_) => self.accepted += 1,
            Err(QuadRejection::NoIntersection { .. }) => self.no_intersection += 1,
            Err(QuadRejection::Winding { .. }) => self.winding += 1,
            Err(QuadRejection::EdgeTooShort { .. }) => self.edge_too_short += 1,
            Err(QuadRejection::AspectRatio { .. }) => self.aspect_ratio += 1,
        }
    }

    pub fn rejected(&self) -> usize {
        self.closed_loops - self.accepted
    }
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.closed_loops += rhs.closed_loops;
        self.accepted += rhs.accepted;
        self.no_intersection += rhs.no_intersection;
        self.winding += rhs.winding;
        self.edge_too_short += rhs.edge_too_short;
        self.aspect_ratio += rhs.aspect_ratio;
    }
}

/// Check a closed loop of four segments and build its quad.
///
/// Corner `i` is the intersection of the lines through `segs[i]` and
/// `segs[(i + 1) % 4]`.
pub fn validate_loop(
    segs: [&Segment; 4],
    params: &QuadSearchParams,
) -> Result<Quad, QuadRejection> {
    let mut p = [Point2::origin(); LOOP_LEN];
    let mut perimeter = 0.0;
    for i in 0..LOOP_LEN {
        let a = segs[i];
        let b = segs[(i + 1) % LOOP_LEN];
        p[i] = intersect_lines(a.p0(), a.p1(), b.p0(), b.p1())
            .ok_or(QuadRejection::NoIntersection { corner: i })?;
        perimeter += a.length();
    }

    let t = [
        direction_angle(p[0], p[1]),
        direction_angle(p[1], p[2]),
        direction_angle(p[2], p[3]),
        direction_angle(p[3], p[0]),
    ];
    let total = mod2pi(t[1] - t[0])
        + mod2pi(t[2] - t[1])
        + mod2pi(t[3] - t[2])
        + mod2pi(t[0] - t[3]);
    if !(WINDING_MIN..=WINDING_MAX).contains(&total) {
        return Err(QuadRejection::Winding { total });
    }

    let edges = [
        distance(p[0], p[1]),
        distance(p[1], p[2]),
        distance(p[2], p[3]),
        distance(p[3], p[0]),
    ];
    let diagonals = [distance(p[0], p[2]), distance(p[1], p[3])];
    let shortest = edges
        .iter()
        .chain(diagonals.iter())
        .copied()
        .fold(f32::INFINITY, f32::min);
    if shortest < params.min_edge_length {
        return Err(QuadRejection::EdgeTooShort { length: shortest });
    }

    let dmax = edges.iter().copied().fold(0.0, f32::max);
    let dmin = edges.iter().copied().fold(f32::INFINITY, f32::min);
    if dmax > dmin * params.max_aspect_ratio {
        return Err(QuadRejection::AspectRatio { ratio: dmax / dmin });
    }

    let ids = [segs[0].id(), segs[1].id(), segs[2].id(), segs[3].id()];
    Ok(Quad::with_segments(p, ids, perimeter))
}

/// Quad search over a read-only [`SegmentGraph`].
#[derive(Clone, Copy, Debug)]
pub struct QuadSearch<'g> {
    graph: &'g SegmentGraph,
    params: &'g QuadSearchParams,
}

impl<'g> QuadSearch<'g> {
    pub fn new(graph: &'g SegmentGraph, params: &'g QuadSearchParams) -> Self {
        Self { graph, params }
    }

    #[inline]
    pub fn params(&self) -> &QuadSearchParams {
        self.params
    }

    /// Append every quad whose loop starts at `start` to `quads`.
    ///
    /// Unknown start ids yield no quads.
    pub fn search_from(&self, start: SegmentId, quads: &mut Vec<Quad>) -> SearchStats {
        let mut stats = SearchStats::default();
        if let Some(seg) = self.graph.get(start) {
            let mut path = [seg; LOOP_LEN + 1];
            self.descend(&mut path, 0, quads, &mut stats);
        }
        stats
    }

    fn descend(
        &self,
        path: &mut [&'g Segment; LOOP_LEN + 1],
        depth: usize,
        quads: &mut Vec<Quad>,
        stats: &mut SearchStats,
    ) {
        if depth == LOOP_LEN {
            if path[LOOP_LEN].id() != path[0].id() {
                return;
            }
            let outcome = validate_loop([path[0], path[1], path[2], path[3]], self.params);
            stats.record(&outcome);
            match outcome {
                Ok(quad) => quads.push(quad),
                Err(reason) => log::trace!(
                    "loop {:?} rejected: {:?}",
                    [path[0].id(), path[1].id(), path[2].id(), path[3].id()],
                    reason
                ),
            }
            return;
        }

        let start_theta = path[0].theta();
        for &child_id in path[depth].children() {
            let Some(child) = self.graph.get(child_id) else {
                continue;
            };
            if child.theta() > start_theta {
                continue;
            }
            path[depth + 1] = child;
            self.descend(path, depth + 1, quads, stats);
        }
    }

    /// Run the search from every segment of the graph, in id order.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self), fields(segments = self.graph.len()))
    )]
    pub fn search_all(&self) -> (Vec<Quad>, SearchStats) {
        let mut quads = Vec::new();
        let mut stats = SearchStats::default();
        for id in self.graph.ids() {
            stats += self.search_from(id, &mut quads);
        }
        log::debug!(
            "quad search: {} segments, {} closed loops, {} accepted",
            self.graph.len(),
            stats.closed_loops,
            stats.accepted
        );
        (quads, stats)
    }

    /// Parallel [`QuadSearch::search_all`]: one path buffer and output list
    /// per start segment, merged in id order.
    #[cfg(feature = "rayon")]
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self), fields(segments = self.graph.len()))
    )]
    pub fn search_all_par(&self) -> (Vec<Quad>, SearchStats) {
        use rayon::prelude::*;

        let ids: Vec<SegmentId> = self.graph.ids().collect();
        let per_start: Vec<(Vec<Quad>, SearchStats)> = ids
            .par_iter()
            .map(|&id| {
                let mut quads = Vec::new();
                let stats = self.search_from(id, &mut quads);
                (quads, stats)
            })
            .collect();

        let mut quads = Vec::new();
        let mut stats = SearchStats::default();
        for (q, s) in per_start {
            quads.extend(q);
            stats += s;
        }
        log::debug!(
            "parallel quad search: {} segments, {} closed loops, {} accepted",
            ids.len(),
            stats.closed_loops,
            stats.accepted
        );
        (quads, stats)
    }
}

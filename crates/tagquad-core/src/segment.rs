//! Arena-backed segment-adjacency graph.
//!
//! Segments are addressed by stable [`SegmentId`] indices; child links are
//! plain index lists, so the graph is `Send + Sync` and can be traversed from
//! several threads at once while nobody mutates it.

use crate::geometry::{direction_angle, distance, mod2pi};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Index of a segment inside its [`SegmentGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

impl SegmentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentGraphError {
    #[error("unknown segment {0:?}")]
    UnknownSegment(SegmentId),
}

/// Directed line segment with cached length and orientation.
#[derive(Clone, Debug)]
pub struct Segment {
    id: SegmentId,
    p0: Point2<f32>,
    p1: Point2<f32>,
    length: f32,
    theta: f32,
    children: Vec<SegmentId>,
}

impl Segment {
    #[inline]
    pub fn id(&self) -> SegmentId {
        self.id
    }

    #[inline]
    pub fn p0(&self) -> Point2<f32> {
        self.p0
    }

    #[inline]
    pub fn p1(&self) -> Point2<f32> {
        self.p1
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Orientation of `p0 -> p1` in `(-π, π]`.
    #[inline]
    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Segments reachable from this one by a handedness-consistent turn.
    #[inline]
    pub fn children(&self) -> &[SegmentId] {
        &self.children
    }
}

/// Thresholds for [`SegmentGraph::link_children`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkParams {
    /// Allowed gap between a parent's end and a child's start, relative to
    /// the parent length.
    pub max_gap_rel: f32,
    /// Constant slack added to the gap threshold, in pixels.
    pub max_gap_px: f32,
    /// Segments shorter than this never take part in links.
    pub min_segment_length: f32,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            max_gap_rel: 0.5,
            max_gap_px: 2.0,
            min_segment_length: 4.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SegmentGraph {
    segments: Vec<Segment>,
}

impl SegmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment from `p0` to `p1` and return its id.
    pub fn push(&mut self, p0: Point2<f32>, p1: Point2<f32>) -> SegmentId {
        let id = SegmentId(self.segments.len() as u32);
        self.segments.push(Segment {
            id,
            p0,
            p1,
            length: distance(p0, p1),
            theta: direction_angle(p0, p1),
            children: Vec::new(),
        });
        id
    }

    /// Record `child` as reachable from `parent`.
    pub fn add_child(
        &mut self,
        parent: SegmentId,
        child: SegmentId,
    ) -> Result<(), SegmentGraphError> {
        if self.get(child).is_none() {
            return Err(SegmentGraphError::UnknownSegment(child));
        }
        let seg = self
            .segments
            .get_mut(parent.index())
            .ok_or(SegmentGraphError::UnknownSegment(parent))?;
        seg.children.push(child);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments.iter().map(|s| s.id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Drop every child link.
    pub fn clear_children(&mut self) {
        for seg in &mut self.segments {
            seg.children.clear();
        }
    }

    /// Link every pair `parent -> child` where the child starts near the
    /// parent's end and turns clockwise in angle (`mod2pi(child - parent) < 0`).
    ///
    /// Returns the number of links added. Quadratic in the segment count.
    pub fn link_children(&mut self, params: &LinkParams) -> usize {
        let mut links = Vec::new();
        for parent in &self.segments {
            if parent.length < params.min_segment_length {
                continue;
            }
            let max_gap = params.max_gap_rel * parent.length + params.max_gap_px;
            for child in &self.segments {
                if child.id == parent.id || child.length < params.min_segment_length {
                    continue;
                }
                if mod2pi(child.theta - parent.theta) >= 0.0 {
                    continue;
                }
                if distance(parent.p1, child.p0) > max_gap {
                    continue;
                }
                links.push((parent.id, child.id));
            }
        }

        let count = links.len();
        for (parent, child) in links {
            self.segments[parent.index()].children.push(child);
        }
        log::debug!(
            "linked {} segment pairs over {} segments",
            count,
            self.segments.len()
        );
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn cached_length_and_theta() {
        let mut g = SegmentGraph::new();
        let a = g.push(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        let b = g.push(Point2::new(0.0, 0.0), Point2::new(-2.0, 0.0));
        let sa = g.get(a).expect("segment a");
        assert_relative_eq!(sa.length(), 5.0);
        assert_relative_eq!(sa.theta(), (4.0f32).atan2(3.0));
        assert_relative_eq!(g.get(b).expect("segment b").theta(), PI);
    }

    #[test]
    fn add_child_rejects_unknown_ids() {
        let mut g = SegmentGraph::new();
        let a = g.push(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        assert_eq!(
            g.add_child(a, SegmentId(7)),
            Err(SegmentGraphError::UnknownSegment(SegmentId(7)))
        );
        assert_eq!(
            g.add_child(SegmentId(3), a),
            Err(SegmentGraphError::UnknownSegment(SegmentId(3)))
        );
        g.add_child(a, a).expect("self link");
        assert_eq!(g.get(a).expect("a").children(), &[a]);
    }

    #[test]
    fn links_follow_handedness_and_gap() {
        let mut g = SegmentGraph::new();
        // Heading +x, then a turn to -y (clockwise in angle) and one to +y.
        let a = g.push(Point2::new(0.0, 10.0), Point2::new(10.0, 10.0));
        let cw = g.push(Point2::new(10.5, 9.5), Point2::new(10.5, 0.0));
        let ccw = g.push(Point2::new(10.5, 10.5), Point2::new(10.5, 20.0));
        let far = g.push(Point2::new(30.0, 10.0), Point2::new(30.0, 0.0));

        let n = g.link_children(&LinkParams::default());
        assert_eq!(n, 1);
        assert_eq!(g.get(a).expect("a").children(), &[cw]);
        assert!(g.get(ccw).expect("ccw").children().is_empty());
        assert!(!g.get(a).expect("a").children().contains(&far));
        assert_relative_eq!(
            mod2pi(g.get(cw).expect("cw").theta() - g.get(a).expect("a").theta()),
            -FRAC_PI_2,
            epsilon = 1e-6
        );

        g.clear_children();
        assert!(g.iter().all(|s| s.children().is_empty()));
    }

    #[test]
    fn segment_id_serializes_transparently() {
        let json = serde_json::to_string(&SegmentId(42)).expect("serialize");
        assert_eq!(json, "42");
    }
}

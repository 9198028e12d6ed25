//! JSON configuration and report helpers for quad detection runs.

use crate::decode::{DecodeError, TagCode};
use crate::params::{QuadSearchParams, TagLayout};
use crate::quad::Quad;
use crate::search::{QuadSearch, SearchStats};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tagquad_core::{LinkParams, LumaImage, SegmentGraph, SegmentId};

#[derive(thiserror::Error, Debug)]
pub enum QuadIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One input segment, `p0 -> p1` in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
}

/// Configuration for a detection run over a precomputed segment list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadDetectConfig {
    pub image_path: String,
    pub segments: Vec<SegmentSpec>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub search: QuadSearchParams,
    #[serde(default)]
    pub link: LinkParams,
    #[serde(default)]
    pub layout: TagLayout,
}

impl QuadDetectConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, QuadIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), QuadIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("quad_detect_report.json"))
    }

    /// Segment graph with handedness links built from `link`.
    pub fn build_graph(&self) -> SegmentGraph {
        let mut graph = SegmentGraph::new();
        for s in &self.segments {
            graph.push(Point2::from(s.p0), Point2::from(s.p1));
        }
        graph.link_children(&self.link);
        graph
    }

    /// Search the configured segments and decode every accepted quad.
    pub fn run<I: LumaImage + ?Sized>(&self, image: &I) -> QuadDetectReport {
        let graph = self.build_graph();
        let (quads, stats) = QuadSearch::new(&graph, &self.search).search_all();
        let quads = quads
            .iter()
            .map(|q| QuadReport::new(q, q.to_tag_code(image, self.layout)))
            .collect();
        QuadDetectReport {
            image_path: self.image_path.clone(),
            layout: self.layout,
            stats: stats.into(),
            quads,
        }
    }
}

/// Serializable mirror of [`SearchStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatsReport {
    pub closed_loops: usize,
    pub accepted: usize,
    pub no_intersection: usize,
    pub winding: usize,
    pub edge_too_short: usize,
    pub aspect_ratio: usize,
}

impl From<SearchStats> for SearchStatsReport {
    fn from(s: SearchStats) -> Self {
        Self {
            closed_loops: s.closed_loops,
            accepted: s.accepted,
            no_intersection: s.no_intersection,
            winding: s.winding,
            edge_too_short: s.edge_too_short,
            aspect_ratio: s.aspect_ratio,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadReport {
    pub corners: [[f32; 2]; 4],
    pub segments: Option<[SegmentId; 4]>,
    pub observed_perimeter: Option<f32>,
    pub code: Option<TagCode>,
    /// Decode failure reason when `code` is `None`.
    pub decode_error: Option<String>,
}

impl QuadReport {
    pub fn new(quad: &Quad, decoded: Result<TagCode, DecodeError>) -> Self {
        let (code, decode_error) = match decoded {
            Ok(code) => (Some(code), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            corners: (*quad.corners()).map(|p| [p.x, p.y]),
            segments: quad.segments().copied(),
            observed_perimeter: quad.observed_perimeter(),
            code,
            decode_error,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuadDetectReport {
    pub image_path: String,
    pub layout: TagLayout,
    pub stats: SearchStatsReport,
    pub quads: Vec<QuadReport>,
}

impl QuadDetectReport {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), QuadIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

//! Quad search and payload decoding for square fiducial tags.
//!
//! This crate focuses on:
//! - finding closed four-segment loops in a [`SegmentGraph`] and turning them
//!   into [`Quad`] candidates,
//! - mapping tag-normalized coordinates into the image through a quad,
//! - fitting an illumination-aware [`GrayModel`] from the tag border,
//! - thresholding the payload cells into a raw [`TagCode`].
//!
//! It does **not** extract segments from images and does not match codes
//! against a tag family. Callers provide the segments and interpret the bits.

mod decode;
mod gray_model;
mod io;
mod params;
mod quad;
mod search;

pub use decode::{DecodeError, TagCode};
pub use gray_model::{GrayModel, GrayModelBuilder, GrayModelError, ObsClass, ThresholdModel};
pub use io::{
    QuadDetectConfig, QuadDetectReport, QuadIoError, QuadReport, SearchStatsReport, SegmentSpec,
};
pub use params::{QuadSearchParams, TagLayout};
pub use quad::Quad;
pub use search::{validate_loop, QuadRejection, QuadSearch, SearchStats};

pub use tagquad_core::{
    FloatImage, GrayImage, GrayImageView, LinkParams, LumaImage, Segment, SegmentGraph,
    SegmentGraphError, SegmentId,
};

//! Core types for square fiducial detection.
//!
//! This crate is small and purely geometric: 2D helpers, a read-only
//! luminance image abstraction, and the arena-backed segment graph the quad
//! search walks. It does not extract segments from images.

mod geometry;
mod image;
mod logger;
mod segment;

pub use geometry::{direction_angle, distance, intersect_lines, mod2pi};
pub use image::{FloatImage, GrayImage, GrayImageView, ImageError, LumaImage};
pub use segment::{LinkParams, Segment, SegmentGraph, SegmentGraphError, SegmentId};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_env, LOG_ENV};

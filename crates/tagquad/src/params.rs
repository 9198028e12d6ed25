use serde::{Deserialize, Serialize};

/// Geometric acceptance thresholds for closed segment loops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadSearchParams {
    /// Minimum length of every edge and both diagonals, in pixels.
    pub min_edge_length: f32,
    /// Maximum ratio between the longest and the shortest edge.
    pub max_aspect_ratio: f32,
}

impl Default for QuadSearchParams {
    fn default() -> Self {
        Self {
            min_edge_length: 6.0,
            max_aspect_ratio: 32.0,
        }
    }
}

/// Cell layout of a square tag.
///
/// One side of the tag spans `2 * black_border + dimension_bits` cells; the
/// payload is the inner `dimension_bits × dimension_bits` block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagLayout {
    pub dimension_bits: u32,
    pub black_border: u32,
}

impl TagLayout {
    pub fn new(dimension_bits: u32, black_border: u32) -> Self {
        Self {
            dimension_bits,
            black_border,
        }
    }

    /// Total cell count along one side, both border rings included.
    /// `None` on overflow.
    #[inline]
    pub fn length_bits(&self) -> Option<u32> {
        self.black_border
            .checked_mul(2)?
            .checked_add(self.dimension_bits)
    }

    #[inline]
    pub fn payload_bits(&self) -> Option<u32> {
        self.dimension_bits.checked_mul(self.dimension_bits)
    }
}

impl Default for TagLayout {
    fn default() -> Self {
        Self {
            dimension_bits: 6,
            black_border: 1,
        }
    }
}

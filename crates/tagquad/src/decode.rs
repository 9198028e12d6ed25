//! Payload decoding: border sampling into a [`GrayModel`], then a threshold
//! scan over the payload cells.

use crate::gray_model::{GrayModel, GrayModelBuilder, GrayModelError, ThresholdModel};
use crate::params::TagLayout;
use crate::quad::Quad;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tagquad_core::LumaImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Raw payload bits, first scanned bit in the most significant position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagCode(pub u64);

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum DecodeError {
    #[error("payload of {bits} bits does not fit in 64")]
    PayloadTooWide { bits: u32 },
    #[error("tag layout has no payload cells")]
    EmptyLayout,
    #[error("tag layout {dimension_bits}x{dimension_bits} with border {black_border} overflows")]
    LayoutOverflow {
        dimension_bits: u32,
        black_border: u32,
    },
    #[error("payload sample ({x}, {y}) lies outside the image")]
    SampleOutsideImage { x: i32, y: i32 },
    #[error(transparent)]
    GrayModel(#[from] GrayModelError),
}

/// Cell on the white quiet-zone ring just outside the tag.
#[inline]
pub(crate) fn is_on_outer_border(xb: i32, yb: i32, lb: i32) -> bool {
    xb == -1 || yb == -1 || xb == lb || yb == lb
}

/// Cell on the outermost black ring of the tag.
#[inline]
pub(crate) fn is_on_inner_border(xb: i32, yb: i32, lb: i32) -> bool {
    let inside = (0..lb).contains(&xb) && (0..lb).contains(&yb);
    inside && (xb == 0 || yb == 0 || xb == lb - 1 || yb == lb - 1)
}

/// Cell strictly inside the outermost black ring.
#[inline]
pub(crate) fn is_inside_inner_border(xb: i32, yb: i32, lb: i32) -> bool {
    xb > 0 && yb > 0 && xb < lb - 1 && yb < lb - 1
}

/// Layout checked to fit a `u64` code, with cell counts as `i32`.
#[derive(Clone, Copy, Debug)]
struct CellGrid {
    dim: i32,
    border: i32,
    length: i32,
}

impl CellGrid {
    fn new(layout: TagLayout) -> Result<Self, DecodeError> {
        let overflow = DecodeError::LayoutOverflow {
            dimension_bits: layout.dimension_bits,
            black_border: layout.black_border,
        };
        let bits = layout.payload_bits().ok_or(overflow)?;
        if bits == 0 {
            return Err(DecodeError::EmptyLayout);
        }
        if bits > u64::BITS {
            return Err(DecodeError::PayloadTooWide { bits });
        }
        let length = layout
            .length_bits()
            .and_then(|l| i32::try_from(l).ok())
            .ok_or(overflow)?;
        // bits <= 64 keeps dim <= 8; length fits i32, so border does too.
        Ok(Self {
            dim: layout.dimension_bits as i32,
            border: layout.black_border as i32,
            length,
        })
    }
}

#[inline]
fn round_px(p: Point2<f32>) -> (i32, i32) {
    ((p.x + 0.5).floor() as i32, (p.y + 0.5).floor() as i32)
}

impl Quad {
    /// Sample the quiet zone (white) and the outermost black ring around a
    /// `length_bits`-cell grid and fit a [`GrayModel`].
    ///
    /// Border cells that map outside the image are skipped.
    pub fn make_gray_model<I: LumaImage + ?Sized>(
        &self,
        image: &I,
        length_bits: u32,
    ) -> Result<GrayModel, GrayModelError> {
        let lb = i32::try_from(length_bits)
            .map_err(|_| GrayModelError::GridTooLarge { length_bits })?;
        let mut model = GrayModelBuilder::new();

        for yb in -1..=lb {
            let yn = (yb as f32 + 0.5) / lb as f32;
            for xb in -1..=lb {
                if is_inside_inner_border(xb, yb, lb) {
                    continue;
                }
                let xn = (xb as f32 + 0.5) / lb as f32;
                let (xi, yi) = round_px(self.interpolate01(xn, yn));
                let Some(v) = image.luma_at(xi, yi) else {
                    continue;
                };
                if is_on_outer_border(xb, yb, lb) {
                    model.add_white_obs(xn, yn, v);
                } else if is_on_inner_border(xb, yb, lb) {
                    model.add_black_obs(xn, yn, v);
                }
            }
        }

        log::trace!(
            "gray model over {}x{} cells: {} white, {} black observations",
            lb,
            lb,
            model.white_count(),
            model.black_count()
        );
        model.fit()
    }

    /// Threshold every payload cell against `model`.
    ///
    /// Rows are scanned from `yb = dimension_bits - 1` down to `0`, left to
    /// right inside a row; the first bit ends up most significant. Returns
    /// `None` as soon as a sample falls outside the image, and for layouts
    /// whose payload does not fit in 64 bits.
    pub fn decode_payload<I, M>(
        &self,
        image: &I,
        model: &M,
        layout: TagLayout,
    ) -> Option<TagCode>
    where
        I: LumaImage + ?Sized,
        M: ThresholdModel + ?Sized,
    {
        self.scan_payload(image, model, layout).ok()
    }

    fn scan_payload<I, M>(
        &self,
        image: &I,
        model: &M,
        layout: TagLayout,
    ) -> Result<TagCode, DecodeError>
    where
        I: LumaImage + ?Sized,
        M: ThresholdModel + ?Sized,
    {
        let grid = CellGrid::new(layout)?;
        let dim = grid.dim;
        let border = grid.border as f32;
        let lb = grid.length as f32;
        let mut code = 0u64;

        for yb in (0..dim).rev() {
            let yn = (border + yb as f32 + 0.5) / lb;
            for xb in 0..dim {
                let xn = (border + xb as f32 + 0.5) / lb;
                let (xi, yi) = round_px(self.interpolate01(xn, yn));
                let v = image
                    .luma_at(xi, yi)
                    .ok_or(DecodeError::SampleOutsideImage { x: xi, y: yi })?;
                code <<= 1;
                if v > model.threshold(xn, yn) {
                    code |= 1;
                }
            }
        }
        Ok(TagCode(code))
    }

    /// Build the gray model for `layout` and decode the payload.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, image)))]
    pub fn to_tag_code<I: LumaImage + ?Sized>(
        &self,
        image: &I,
        layout: TagLayout,
    ) -> Result<TagCode, DecodeError> {
        let grid = CellGrid::new(layout)?;
        let model = self.make_gray_model(image, grid.length as u32)?;
        self.scan_payload(image, &model, layout)
    }
}

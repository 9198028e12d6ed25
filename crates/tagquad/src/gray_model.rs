//! Adaptive black/white threshold surface over normalized tag coordinates.
//!
//! Each luminance class is modelled as a bilinear surface
//! `v(x, y) = a·x + b·y + c·x·y + d`, fitted by least squares over the
//! observations collected on the tag border. The decision threshold at any
//! point is the midpoint between the two surfaces, which tracks lighting
//! gradients across the tag.

use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};

/// Below this many observations a class is modelled by its mean only.
const MIN_OBS_FOR_SURFACE: usize = 6;
/// Smallest accepted eigenvalue ratio of the normal matrix.
const MIN_RCOND: f64 = 1e-10;

/// Luminance class of a border observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObsClass {
    White,
    Black,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrayModelError {
    #[error("no {class:?} observations to fit")]
    NoObservations { class: ObsClass },
    #[error("{length_bits}-cell grid is too large to sample")]
    GridTooLarge { length_bits: u32 },
}

/// Anything that can answer a luminance threshold at a normalized coordinate.
pub trait ThresholdModel {
    fn threshold(&self, xn: f32, yn: f32) -> f32;
}

#[derive(Clone, Debug)]
struct SurfaceAccumulator {
    ata: Matrix4<f64>,
    atb: Vector4<f64>,
    sum: f64,
    count: usize,
}

impl Default for SurfaceAccumulator {
    fn default() -> Self {
        Self {
            ata: Matrix4::zeros(),
            atb: Vector4::zeros(),
            sum: 0.0,
            count: 0,
        }
    }
}

impl SurfaceAccumulator {
    fn add(&mut self, x: f32, y: f32, v: f32) {
        let (x, y, v) = (x as f64, y as f64, v as f64);
        let row = Vector4::new(x, y, x * y, 1.0);
        self.ata += row * row.transpose();
        self.atb += row * v;
        self.sum += v;
        self.count += 1;
    }

    fn fit(&self, class: ObsClass) -> Result<BilinearSurface, GrayModelError> {
        if self.count == 0 {
            return Err(GrayModelError::NoObservations { class });
        }
        let mean = self.sum / self.count as f64;
        let constant = BilinearSurface {
            coeffs: Vector4::new(0.0, 0.0, 0.0, mean),
        };
        if self.count < MIN_OBS_FOR_SURFACE {
            return Ok(constant);
        }
        let eig = self.ata.symmetric_eigenvalues();
        let (lo, hi) = (eig.min(), eig.max());
        if hi <= 0.0 || lo <= hi * MIN_RCOND {
            log::trace!("{class:?} surface is rank deficient, using mean {mean:.2}");
            return Ok(constant);
        }
        match self.ata.try_inverse() {
            Some(inv) => Ok(BilinearSurface {
                coeffs: inv * self.atb,
            }),
            None => Ok(constant),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BilinearSurface {
    coeffs: Vector4<f64>,
}

impl BilinearSurface {
    #[inline]
    fn eval(&self, x: f32, y: f32) -> f64 {
        let (x, y) = (x as f64, y as f64);
        self.coeffs.dot(&Vector4::new(x, y, x * y, 1.0))
    }
}

/// Collects white/black observations; [`GrayModelBuilder::fit`] turns it
/// into a queryable [`GrayModel`].
#[derive(Clone, Debug, Default)]
pub struct GrayModelBuilder {
    white: SurfaceAccumulator,
    black: SurfaceAccumulator,
}

impl GrayModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_white_obs(&mut self, xn: f32, yn: f32, value: f32) {
        self.white.add(xn, yn, value);
    }

    pub fn add_black_obs(&mut self, xn: f32, yn: f32, value: f32) {
        self.black.add(xn, yn, value);
    }

    pub fn add_obs(&mut self, class: ObsClass, xn: f32, yn: f32, value: f32) {
        match class {
            ObsClass::White => self.add_white_obs(xn, yn, value),
            ObsClass::Black => self.add_black_obs(xn, yn, value),
        }
    }

    pub fn white_count(&self) -> usize {
        self.white.count
    }

    pub fn black_count(&self) -> usize {
        self.black.count
    }

    pub fn fit(self) -> Result<GrayModel, GrayModelError> {
        Ok(GrayModel {
            white: self.white.fit(ObsClass::White)?,
            black: self.black.fit(ObsClass::Black)?,
        })
    }
}

/// Fitted white and black luminance surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrayModel {
    white: BilinearSurface,
    black: BilinearSurface,
}

impl GrayModel {
    pub fn white_at(&self, xn: f32, yn: f32) -> f32 {
        self.white.eval(xn, yn) as f32
    }

    pub fn black_at(&self, xn: f32, yn: f32) -> f32 {
        self.black.eval(xn, yn) as f32
    }
}

impl ThresholdModel for GrayModel {
    #[inline]
    fn threshold(&self, xn: f32, yn: f32) -> f32 {
        (0.5 * (self.white.eval(xn, yn) + self.black.eval(xn, yn))) as f32
    }
}

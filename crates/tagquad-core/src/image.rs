//! Read-only luminance images.
//!
//! The quad pipeline only needs integer-pixel reads plus the image bounds, so
//! everything goes through [`LumaImage`]. Three buffers implement it: an
//! owned 8-bit [`GrayImage`], a borrowed [`GrayImageView`], and an owned
//! floating-point [`FloatImage`].

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("buffer has {actual} pixels, expected {width}x{height}")]
    BufferSize {
        width: usize,
        height: usize,
        actual: usize,
    },
}

/// Pixel-sampling abstraction consumed by gray-model construction and decoding.
pub trait LumaImage {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Luminance at `(x, y)`. Callers guarantee the pixel is inside the image.
    fn luma(&self, x: usize, y: usize) -> f32;

    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    /// Bounds-checked read; `None` outside the image.
    #[inline]
    fn luma_at(&self, x: i32, y: i32) -> Option<f32> {
        if self.contains(x, y) {
            Some(self.luma(x as usize, y as usize))
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Row-major `f32` luminance buffer.
#[derive(Clone, Debug)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

fn check_len(width: usize, height: usize, actual: usize) -> Result<(), ImageError> {
    if width.checked_mul(height) != Some(actual) {
        return Err(ImageError::BufferSize {
            width,
            height,
            actual,
        });
    }
    Ok(())
}

impl<'a> GrayImageView<'a> {
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

impl GrayImage {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Image filled with a single value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

impl FloatImage {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self, ImageError> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert an 8-bit view, scaling luminance into `[0, 1]`.
    pub fn from_gray(src: &GrayImageView<'_>) -> Self {
        Self {
            width: src.width,
            height: src.height,
            data: src.data.iter().map(|&v| v as f32 / 255.0).collect(),
        }
    }
}

impl LumaImage for GrayImageView<'_> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn luma(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x] as f32
    }
}

impl LumaImage for GrayImage {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn luma(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x] as f32
    }
}

impl LumaImage for FloatImage {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn luma(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = GrayImage::new(4, 4, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            ImageError::BufferSize {
                width: 4,
                height: 4,
                actual: 15
            }
        );
    }

    #[test]
    fn bounds_checked_reads() {
        let mut img = GrayImage::filled(3, 2, 10);
        img.set(2, 1, 200);
        assert_eq!(img.luma_at(2, 1), Some(200.0));
        assert_eq!(img.luma_at(3, 1), None);
        assert_eq!(img.luma_at(-1, 0), None);
        assert_eq!(img.view().luma_at(0, 0), Some(10.0));

        let f = FloatImage::from_gray(&img.view());
        assert_eq!(f.luma_at(2, 1), Some(200.0 / 255.0));
        assert_eq!(f.luma_at(0, 2), None);
    }
}

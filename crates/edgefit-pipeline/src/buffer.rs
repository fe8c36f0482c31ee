//! Read-only pixel sources the pipeline consumes.
//!
//! The pipeline never owns or mutates image data. Callers hand it anything
//! implementing [`PixelBuffer`]: a decoded [`RgbaImage`], or an
//! [`RgbaView`] over a raw RGBA byte slice such as a canvas `ImageData`
//! buffer.

use image::RgbaImage;

use crate::types::{Dimensions, PipelineError};

/// A rectangular grid of RGBA samples.
pub trait PixelBuffer {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// The `[r, g, b, a]` sample at `(x, y)`.
    ///
    /// Callers only ask for coordinates inside `width x height`.
    fn pixel(&self, x: u32, y: u32) -> [u8; 4];

    /// Width and height as [`Dimensions`].
    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }
}

impl PixelBuffer for RgbaImage {
    fn width(&self) -> u32 {
        Self::width(self)
    }

    fn height(&self) -> u32 {
        Self::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.get_pixel(x, y).0
    }
}

/// Borrowed view over tightly packed RGBA bytes, row-major.
#[derive(Debug, Clone, Copy)]
pub struct RgbaView<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> RgbaView<'a> {
    /// Wrap `data` as a `width x height` RGBA grid.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidBuffer`] if `data.len()` is not
    /// `width * height * 4`.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self, PipelineError> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(PipelineError::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

impl PixelBuffer for RgbaView<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        match self.data.get(offset..offset + 4) {
            Some(&[r, g, b, a]) => [r, g, b, a],
            _ => [0, 0, 0, 0],
        }
    }
}

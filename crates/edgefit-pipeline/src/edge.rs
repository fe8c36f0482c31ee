//! Gradient-magnitude edge extraction.
//!
//! Converts a [`PixelBuffer`] to luminance (mean of R, G and B, alpha
//! ignored) and emits every interior pixel whose central-difference
//! gradient magnitude exceeds a threshold. This is a single local test,
//! not a full Canny chain: no smoothing, no non-maximum suppression, no
//! hysteresis.
//!
//! This is step 1 in the pipeline, before path segmentation.

use crate::buffer::PixelBuffer;
use crate::types::{EdgeSet, Point};

/// Luminance of every pixel as the mean of its colour channels, row-major.
#[must_use = "returns the luminance map"]
pub fn luminance<B: PixelBuffer + ?Sized>(buffer: &B) -> Vec<f64> {
    let (width, height) = (buffer.width(), buffer.height());
    let mut out = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
        for x in 0..width {
            let [r, g, b, _] = buffer.pixel(x, y);
            out.push(f64::from(u16::from(r) + u16::from(g) + u16::from(b)) / 3.0);
        }
    }
    out
}

/// Extract the pixels whose gradient magnitude exceeds `threshold`.
///
/// Only pixels with `x` in `1..=W-2` and `y` in `1..=H-2` are tested, so
/// no neighbour lookup ever leaves the buffer; border pixels are never
/// emitted. Buffers narrower or shorter than 3 pixels yield an empty set.
///
/// For each candidate, `gx = L(x+1, y) - L(x-1, y)` and
/// `gy = L(x, y+1) - L(x, y-1)`; the pixel is an edge when
/// `sqrt(gx^2 + gy^2) > threshold`. Output is in row-major scan order.
#[must_use = "returns the edge set"]
pub fn extract<B: PixelBuffer + ?Sized>(buffer: &B, threshold: f64) -> EdgeSet {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    if width < 3 || height < 3 {
        return EdgeSet::default();
    }

    let lum = luminance(buffer);
    let at = |x: usize, y: usize| lum[y * width + x];

    let mut points = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let gx = at(x + 1, y) - at(x - 1, y);
            let gy = at(x, y + 1) - at(x, y - 1);
            if gx.hypot(gy) > threshold {
                #[allow(clippy::cast_precision_loss)]
                points.push(Point::new(x as f64, y as f64));
            }
        }
    }

    log::debug!(
        "edge extraction: {} of {} interior pixels above threshold {threshold}",
        points.len(),
        (width - 2) * (height - 2),
    );

    EdgeSet::new(points)
}

//! Convenience decoding for callers holding encoded image bytes.
//!
//! The core pipeline works on [`PixelBuffer`](crate::PixelBuffer)s and
//! never touches files or formats. This helper turns PNG, JPEG, BMP or
//! WebP bytes into an [`RgbaImage`] so command-line and test callers can
//! feed the pipeline without depending on `image` themselves.

use image::RgbaImage;

use crate::types::PipelineError;

/// Decode raw image bytes into an RGBA image.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: encode an RGBA image as PNG bytes.
    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode_rgba(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode_rgba(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn png_round_trips_pixels_and_dimensions() {
        let img = RgbaImage::from_fn(17, 31, |x, _| {
            if x < 8 {
                image::Rgba([10, 20, 30, 255])
            } else {
                image::Rgba([200, 100, 50, 255])
            }
        });
        let decoded = decode_rgba(&encode_png(&img)).unwrap();
        assert_eq!(decoded.dimensions(), (17, 31));
        assert_eq!(decoded.as_raw(), img.as_raw());
    }
}

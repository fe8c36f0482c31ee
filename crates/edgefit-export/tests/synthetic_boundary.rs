//! Integration test: encode a synthetic image, decode it, run the full
//! pipeline, and export the overlay SVG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use edgefit_export::{FIT_COLORS, GUIDE_COLOR, SvgMetadata, to_overlay_svg};
use edgefit_pipeline::{PipelineConfig, RgbaImage, decode::decode_rgba, process_staged};

/// 200x100 PNG, black above row 50 and white below.
fn boundary_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(200, 100, |_x, y| {
        if y < 50 {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    });
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
fn boundary_png_pipeline_to_overlay_svg() {
    let image = decode_rgba(&boundary_png()).unwrap();
    let config = PipelineConfig {
        polynomial_degree: 1,
        ..PipelineConfig::default()
    };
    let staged = process_staged(&image, &config).expect("pipeline should succeed");

    assert_eq!(staged.fits.len(), 1);
    assert!(staged.fits[0].is_fitted());

    let config_json = serde_json::to_string(&config).unwrap();
    let metadata = SvgMetadata {
        title: Some("boundary"),
        description: Some("synthetic horizontal boundary"),
        config_json: Some(&config_json),
    };
    let svg = to_overlay_svg(
        &staged.fits,
        &staged.simplified,
        staged.dimensions,
        &metadata,
    );

    assert!(svg.contains(r#"viewBox="0 0 200 100""#));
    assert!(svg.contains(&format!(r#"stroke="{GUIDE_COLOR}""#)));
    assert!(svg.contains(&format!(r#"stroke="{}""#, FIT_COLORS[0])));
    // Guide plus curve.
    assert_eq!(svg.matches("<path").count(), 2);
    // Slope and intercept of the fitted line in normalized space.
    assert!(svg.contains(">0.01x + 0.49</text>"), "{svg}");
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn insufficient_fit_still_draws_guides() {
    // The default cubic needs 4 points; the simplified boundary keeps 2.
    let image = decode_rgba(&boundary_png()).unwrap();
    let staged = process_staged(&image, &PipelineConfig::default()).unwrap();
    let svg = to_overlay_svg(
        &staged.fits,
        &staged.simplified,
        staged.dimensions,
        &SvgMetadata::default(),
    );

    assert_eq!(svg.matches("<path").count(), 1);
    assert!(!svg.contains("<text"));
}

//! edgefit-pipeline: pure edge-to-curve pipeline (sans-IO).
//!
//! Turns a read-only pixel buffer into fitted polynomial curves through:
//! gradient edge extraction -> path segmentation -> longest-path
//! selection -> Douglas-Peucker simplification -> least-squares fitting.
//!
//! This crate performs no I/O and installs no logger. It emits `log`
//! records (per-stage `debug`, `warn` on singular fits) that a binary may
//! route wherever it likes. Every stage is a pure function of its inputs,
//! so independent buffers can be processed in parallel.

pub mod buffer;
pub mod decode;
pub mod diagnostics;
pub mod edge;
pub mod fit;
pub mod segment;
pub mod simplify;
pub mod solve;
pub mod types;

pub use buffer::{PixelBuffer, RgbaView};
pub use fit::{FitError, MAX_DEGREE, fit};
pub use segment::{PathSegmenter, PathSegmenterKind};
pub use solve::SolveError;
pub use types::{
    Coefficients, Dimensions, EdgeSet, FitKind, FitStatus, FittingResult, PipelineConfig,
    PipelineError, Point, Polyline, ProcessResult, RgbaImage, StagedResult,
};

/// Run the full pipeline and return one fit per selected path.
///
/// Results are ordered by descending original path length, so index 0
/// always belongs to the longest path. A buffer with no edges, or with no
/// path longer than [`segment::MIN_PATH_POINTS`], yields an empty list.
///
/// # Pipeline steps
///
/// 1. Gradient edge extraction
/// 2. Path segmentation (pluggable strategy)
/// 3. Keep the `max_paths` longest paths
/// 4. Path simplification (Ramer-Douglas-Peucker)
/// 5. Polynomial fit of each simplified path
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// [`PipelineConfig::validate`].
pub fn process<B: PixelBuffer + ?Sized>(
    buffer: &B,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    process_staged(buffer, config).map(StagedResult::into_process_result)
}

/// Run the full pipeline, preserving every intermediate stage output.
///
/// Same stages as [`process`]; the extra outputs feed overlays and
/// diagnostics.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// [`PipelineConfig::validate`].
pub fn process_staged<B: PixelBuffer + ?Sized>(
    buffer: &B,
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    config.validate()?;
    let dimensions = buffer.dimensions();

    let edges = edge::extract(buffer, config.edge_threshold);
    let paths = config.segmenter.segment(edges.points(), config.max_gap);
    let selected = segment::select_top(&paths, config.max_paths);
    let simplified = simplify::simplify_paths(&selected, config.simplify_epsilon);
    let fits = fit_paths(&simplified, config, dimensions)?;

    Ok(StagedResult {
        edges,
        paths,
        selected,
        simplified,
        fits,
        dimensions,
    })
}

/// Fit every path inside the buffer frame.
///
/// A singular system becomes the [`FittingResult::singular`] sentinel so
/// each result stays aligned with its path.
pub(crate) fn fit_paths(
    paths: &[Polyline],
    config: &PipelineConfig,
    dimensions: Dimensions,
) -> Result<Vec<FittingResult>, PipelineError> {
    let width = f64::from(dimensions.width);
    let height = f64::from(dimensions.height);

    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            match fit::fit_with_sample_step(
                path.points(),
                config.polynomial_degree,
                width,
                height,
                config.sample_step,
            ) {
                Ok(result) => Ok(result),
                Err(FitError::Singular(err)) => {
                    log::warn!(
                        "path {index} ({} points): {err}; emitting singular sentinel",
                        path.len(),
                    );
                    Ok(FittingResult::singular())
                }
                Err(err) => Err(PipelineError::InvalidConfig(err.to_string())),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Black above row 50, white from row 50 down. Edge pixels land on
    /// rows 49 and 50 across the interior columns.
    fn horizontal_boundary() -> RgbaImage {
        RgbaImage::from_fn(200, 100, |_x, y| {
            if y < 50 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    /// Two boundaries: a long one at row 30 and a short one at row 70
    /// that spans only part of the width.
    fn two_boundaries() -> RgbaImage {
        RgbaImage::from_fn(200, 100, |x, y| {
            let dark = y < 30 || (y >= 70 && x < 60);
            if dark {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn uniform_image_has_no_fits() {
        let img = RgbaImage::from_pixel(50, 40, image::Rgba([128, 128, 128, 255]));
        let result = process(&img, &PipelineConfig::default()).unwrap();
        assert!(result.fits.is_empty());
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 50,
                height: 40
            }
        );
    }

    #[test]
    fn small_step_image_has_no_long_paths() {
        // 16 edge points never reach the minimum path length.
        let img = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let staged = process_staged(&img, &PipelineConfig::default()).unwrap();
        assert_eq!(staged.edges.len(), 16);
        assert!(staged.paths.is_empty());
        assert!(staged.fits.is_empty());
    }

    #[test]
    fn horizontal_boundary_fits_a_flat_line() {
        let config = PipelineConfig {
            polynomial_degree: 1,
            ..PipelineConfig::default()
        };
        let staged = process_staged(&horizontal_boundary(), &config).unwrap();

        assert_eq!(staged.edges.len(), 2 * 198);
        assert_eq!(staged.paths.len(), 1);
        assert_eq!(staged.paths[0].len(), 396);
        assert_eq!(staged.selected, staged.paths);
        assert_eq!(staged.simplified[0].len(), 2);

        assert_eq!(staged.fits.len(), 1);
        let fit = &staged.fits[0];
        assert!(fit.is_fitted());
        assert_eq!(fit.curve.len(), 41);
        for p in fit.curve.points() {
            assert!(p.y > 48.5 && p.y < 50.5, "curve strays to y={}", p.y);
        }
    }

    #[test]
    fn too_few_simplified_points_yield_sentinel() {
        // The simplified path keeps 2 points; a cubic needs 4.
        let staged = process_staged(&horizontal_boundary(), &PipelineConfig::default()).unwrap();
        assert_eq!(staged.fits, vec![FittingResult::insufficient_data()]);
    }

    #[test]
    fn results_are_ordered_longest_first() {
        let config = PipelineConfig {
            polynomial_degree: 1,
            segmenter: PathSegmenterKind::ConnectedComponents,
            ..PipelineConfig::default()
        };
        let staged = process_staged(&two_boundaries(), &config).unwrap();

        assert!(staged.selected.len() >= 2);
        for pair in staged.selected.windows(2) {
            assert!(pair[0].len() >= pair[1].len());
        }
        // The long boundary sits around row 30.
        let first = &staged.fits[0];
        assert!(first.is_fitted());
        let mid = first.curve.points()[first.curve.len() / 2];
        assert!((mid.y - 29.5).abs() < 1.5, "got y={}", mid.y);
    }

    #[test]
    fn max_paths_limits_results() {
        let config = PipelineConfig {
            max_paths: 1,
            segmenter: PathSegmenterKind::ConnectedComponents,
            ..PipelineConfig::default()
        };
        let result = process(&two_boundaries(), &config).unwrap();
        assert_eq!(result.fits.len(), 1);

        let none = PipelineConfig {
            max_paths: 0,
            ..config
        };
        assert!(process(&two_boundaries(), &none).unwrap().fits.is_empty());
    }

    #[test]
    fn every_committed_path_is_long_enough() {
        let staged = process_staged(&two_boundaries(), &PipelineConfig::default()).unwrap();
        for path in &staged.paths {
            assert!(path.len() > segment::MIN_PATH_POINTS);
        }
    }

    #[test]
    fn raw_view_matches_decoded_image() {
        let img = horizontal_boundary();
        let view = RgbaView::new(img.width(), img.height(), img.as_raw()).unwrap();
        let config = PipelineConfig::default();
        assert_eq!(
            process_staged(&view, &config).unwrap(),
            process_staged(&img, &config).unwrap()
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            edge_threshold: -1.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            process(&horizontal_boundary(), &config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn runs_are_repeatable() {
        let img = two_boundaries();
        let config = PipelineConfig::default();
        assert_eq!(
            process(&img, &config).unwrap(),
            process(&img, &config).unwrap()
        );
    }

    #[test]
    fn fit_paths_maps_singular_fits_to_sentinel() {
        // A vertical path: every point shares one x.
        let path = Polyline::new((0..30).map(|y| Point::new(50.0, f64::from(y))).collect());
        let config = PipelineConfig {
            polynomial_degree: 1,
            ..PipelineConfig::default()
        };
        let fits = fit_paths(
            &[path],
            &config,
            Dimensions {
                width: 100,
                height: 100,
            },
        )
        .unwrap();
        assert_eq!(fits, vec![FittingResult::singular()]);
    }
}

//! Least-squares polynomial fitting.
//!
//! Points are normalized into `[0,1] x [0,1]` (x by the frame width, y by
//! its height) before fitting; powers of raw pixel coordinates lose
//! precision quickly at higher degrees. The coefficients solve the normal
//! equations `(X^T X) c = X^T y` built from the Vandermonde matrix, which is
//! adequate for paths of tens to a few hundred points and degree at most
//! [`MAX_DEGREE`], but is not an orthogonal-basis (QR) method.
//!
//! This is step 4 in the pipeline, after simplification.

use serde::{Deserialize, Serialize};

use crate::solve::{Matrix, SolveError, solve};
use crate::types::{
    Coefficients, FitKind, FitStatus, FittingResult, PipelineConfig, Point, Polyline,
};

/// Highest supported polynomial degree.
pub const MAX_DEGREE: usize = 12;

/// Errors from [`fit`].
///
/// Too few points is not an error; it yields the
/// [`FittingResult::insufficient_data`] sentinel.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum FitError {
    /// The requested degree is above [`MAX_DEGREE`].
    #[error("polynomial degree {degree} exceeds the maximum of {max}")]
    DegreeTooHigh {
        /// Requested degree.
        degree: usize,
        /// [`MAX_DEGREE`].
        max: usize,
    },

    /// The normalization frame is not a positive, finite rectangle.
    #[error("invalid frame {width}x{height}: width and height must be positive and finite")]
    InvalidFrame {
        /// Frame width.
        width: f64,
        /// Frame height.
        height: f64,
    },

    /// The curve sampling step is zero.
    #[error("sample step must be at least 1 pixel")]
    InvalidSampleStep,

    /// The normal equations are rank-deficient, e.g. every point shares
    /// one x coordinate.
    #[error("normal equations could not be solved: {0}")]
    Singular(#[from] SolveError),
}

/// Fit a polynomial of `degree` to `points` inside a `width x height` frame.
///
/// The curve is sampled every [`PipelineConfig::DEFAULT_SAMPLE_STEP`]
/// pixels; see [`fit_with_sample_step`].
///
/// # Errors
///
/// See [`fit_with_sample_step`].
pub fn fit(
    points: &[Point],
    degree: usize,
    width: f64,
    height: f64,
) -> Result<FittingResult, FitError> {
    fit_with_sample_step(
        points,
        degree,
        width,
        height,
        PipelineConfig::DEFAULT_SAMPLE_STEP,
    )
}

/// Fit a polynomial of `degree` to `points`, sampling the curve every
/// `sample_step` pixels from `x = 0` to `x = width` inclusive.
///
/// Returns the insufficient-data sentinel when there are fewer than
/// `degree + 1` points.
///
/// # Errors
///
/// Returns [`FitError::DegreeTooHigh`], [`FitError::InvalidFrame`] or
/// [`FitError::InvalidSampleStep`] for bad arguments, and
/// [`FitError::Singular`] when the normal equations cannot be solved to
/// finite coefficients.
pub fn fit_with_sample_step(
    points: &[Point],
    degree: usize,
    width: f64,
    height: f64,
    sample_step: u32,
) -> Result<FittingResult, FitError> {
    if degree > MAX_DEGREE {
        return Err(FitError::DegreeTooHigh {
            degree,
            max: MAX_DEGREE,
        });
    }
    if !(is_positive_finite(width) && is_positive_finite(height)) {
        return Err(FitError::InvalidFrame { width, height });
    }
    if sample_step == 0 {
        return Err(FitError::InvalidSampleStep);
    }
    if points.len() < degree + 1 {
        return Ok(FittingResult::insufficient_data());
    }

    let normalized: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.x / width, p.y / height))
        .collect();
    let (a, b) = normal_equations(&normalized, degree);
    let coefficients = Coefficients::new(solve(a, b)?);

    Ok(FittingResult {
        formula: format_formula(&coefficients),
        curve: sample_curve(&coefficients, width, height, sample_step),
        rms_error: rms_residual(points, &coefficients, width, height),
        coefficients,
        kind: FitKind::Polynomial,
        status: FitStatus::Fitted,
    })
}

/// Format coefficients highest power first, two decimals each, joined
/// with `" + "`: `x^i` for `i >= 2`, `x` for the linear term, and a bare
/// constant. Negative coefficients keep their sign (`"2.00x + -1.50"`).
#[must_use]
pub fn format_formula(coefficients: &Coefficients) -> String {
    coefficients
        .as_slice()
        .iter()
        .enumerate()
        .rev()
        .map(|(i, c)| match i {
            0 => format!("{c:.2}"),
            1 => format!("{c:.2}x"),
            _ => format!("{c:.2}x^{i}"),
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Sample the polynomial in pixel space at `x = 0, step, 2*step, ...`
/// up to and including `width`.
///
/// Each x is normalized by `width`, evaluated, and scaled back by
/// `height`. Returns an empty polyline for a non-positive or non-finite
/// width or a zero step.
#[must_use]
pub fn sample_curve(coefficients: &Coefficients, width: f64, height: f64, step: u32) -> Polyline {
    if !is_positive_finite(width) || step == 0 {
        return Polyline::default();
    }
    let step = f64::from(step);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (width / step).floor() as u64 + 1;

    #[allow(clippy::cast_precision_loss)]
    let points = (0..count)
        .map(|k| {
            let x = k as f64 * step;
            Point::new(x, coefficients.evaluate(x / width) * height)
        })
        .collect();
    Polyline::new(points)
}

/// Build `A[i][j] = sum x^(i+j)` and `B[i] = sum x^i * y`.
fn normal_equations(samples: &[(f64, f64)], degree: usize) -> (Matrix, Vec<f64>) {
    let terms = degree + 1;
    let mut power_sums = vec![0.0; 2 * degree + 1];
    let mut moments = vec![0.0; terms];

    for &(x, y) in samples {
        let mut power: f64 = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += power;
            if let Some(m) = moments.get_mut(k) {
                *m = power.mul_add(y, *m);
            }
            power *= x;
        }
    }

    let mut a = Matrix::zeros(terms);
    for i in 0..terms {
        for j in 0..terms {
            a[(i, j)] = power_sums[i + j];
        }
    }
    (a, moments)
}

/// Root-mean-square vertical residual in pixels.
fn rms_residual(points: &[Point], coefficients: &Coefficients, width: f64, height: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let sse: f64 = points
        .iter()
        .map(|p| {
            let r = p.y - coefficients.evaluate(p.x / width) * height;
            r * r
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    (sse / n).sqrt()
}

fn is_positive_finite(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

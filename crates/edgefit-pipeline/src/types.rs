//! Shared types for the edgefit pipeline.

use serde::{Deserialize, Serialize};

use crate::fit::MAX_DEGREE;
use crate::segment::PathSegmenterKind;

/// Re-export `RgbaImage` so downstream crates can hand decoded images to
/// the pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An ordered sequence of points: a segmented edge path, its simplified
/// form, or a sampled curve.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Edge pixels found by [`crate::edge::extract`], in row-major scan order.
///
/// The order carries no meaning beyond reproducibility; segmentation
/// re-sorts the points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeSet(Vec<Point>);

impl EdgeSet {
    /// Wrap a vector of edge points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if no edge pixel passed the threshold.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of edge pixels.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all edge points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Polynomial coefficients in normalized `[0,1] x [0,1]` space.
///
/// Index `i` holds the coefficient of `x^i`, so a fit of degree `d`
/// has `d + 1` entries. Sentinel results carry no coefficients.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coefficients(Vec<f64>);

impl Coefficients {
    /// Wrap a coefficient vector (lowest power first).
    #[must_use]
    pub const fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Returns `true` for the empty coefficient vector of a sentinel result.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of coefficients (`degree + 1`).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Polynomial degree, or `None` when there are no coefficients.
    #[must_use]
    pub const fn degree(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    /// Coefficients, lowest power first.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Evaluate the polynomial at normalized `t` by direct power summation.
    ///
    /// The empty polynomial evaluates to `0.0`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        let mut power = 1.0;
        let mut sum = 0.0;
        for &c in &self.0 {
            sum = c.mul_add(power, sum);
            power *= t;
        }
        sum
    }
}

/// The family of curve a [`FittingResult`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitKind {
    /// Least-squares polynomial in normalized coordinates.
    #[default]
    Polynomial,
}

/// Whether a [`FittingResult`] holds a usable curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStatus {
    /// Coefficients, formula and curve are all populated.
    Fitted,
    /// Fewer points than `degree + 1`. Formula is
    /// [`FittingResult::INSUFFICIENT_DATA`], curve and coefficients are empty.
    InsufficientData,
    /// The normal equations were singular. Formula is
    /// [`FittingResult::SINGULAR`], curve and coefficients are empty.
    Singular,
}

/// A fitted curve for one selected path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingResult {
    /// Display formula, highest power first (e.g. `"1.25x^2 + -0.50x + 3.00"`).
    pub formula: String,
    /// Curve sampled across the image width, in pixel space.
    pub curve: Polyline,
    /// Normalized-space coefficients, lowest power first.
    pub coefficients: Coefficients,
    /// Curve family.
    pub kind: FitKind,
    /// Whether the fields above describe a real fit or a sentinel.
    pub status: FitStatus,
    /// Root-mean-square vertical residual in pixels over the fitted points.
    pub rms_error: f64,
}

impl FittingResult {
    /// Marker formula of the insufficient-data sentinel.
    pub const INSUFFICIENT_DATA: &'static str = "insufficient data";

    /// Marker formula of the singular-system sentinel.
    pub const SINGULAR: &'static str = "singular fit";

    /// Sentinel for a path with fewer points than `degree + 1`.
    #[must_use]
    pub fn insufficient_data() -> Self {
        Self::sentinel(Self::INSUFFICIENT_DATA, FitStatus::InsufficientData)
    }

    /// Sentinel for a path whose normal equations could not be solved.
    #[must_use]
    pub fn singular() -> Self {
        Self::sentinel(Self::SINGULAR, FitStatus::Singular)
    }

    fn sentinel(formula: &str, status: FitStatus) -> Self {
        Self {
            formula: formula.to_owned(),
            curve: Polyline::default(),
            coefficients: Coefficients::default(),
            kind: FitKind::Polynomial,
            status,
            rms_error: 0.0,
        }
    }

    /// Returns `true` when this result holds a real curve.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.status == FitStatus::Fitted
    }
}

/// Configuration for one pipeline run.
///
/// Missing fields fall back to their defaults when deserializing, so a
/// partial JSON object such as `{"polynomial_degree": 2}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Gradient magnitude a pixel must exceed to count as an edge.
    pub edge_threshold: f64,

    /// Two points chain into the same path only when closer than this
    /// distance in pixels.
    pub max_gap: f64,

    /// Douglas-Peucker tolerance in pixels.
    pub simplify_epsilon: f64,

    /// Degree of the fitted polynomial, at most [`MAX_DEGREE`].
    pub polynomial_degree: usize,

    /// How many of the longest paths are simplified and fitted.
    pub max_paths: usize,

    /// Horizontal spacing in pixels between sampled curve points.
    pub sample_step: u32,

    /// Which segmentation strategy groups edge points into paths.
    pub segmenter: PathSegmenterKind,
}

impl PipelineConfig {
    /// Default [`edge_threshold`](Self::edge_threshold).
    pub const DEFAULT_EDGE_THRESHOLD: f64 = 30.0;
    /// Default [`max_gap`](Self::max_gap).
    pub const DEFAULT_MAX_GAP: f64 = 5.0;
    /// Default [`simplify_epsilon`](Self::simplify_epsilon).
    pub const DEFAULT_SIMPLIFY_EPSILON: f64 = 2.0;
    /// Default [`polynomial_degree`](Self::polynomial_degree).
    pub const DEFAULT_POLYNOMIAL_DEGREE: usize = 3;
    /// Default [`max_paths`](Self::max_paths).
    pub const DEFAULT_MAX_PATHS: usize = 5;
    /// Default [`sample_step`](Self::sample_step).
    pub const DEFAULT_SAMPLE_STEP: u32 = 5;

    /// Check the parameter ranges the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.edge_threshold.is_finite() && self.edge_threshold > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "edge_threshold must be positive, got {}",
                self.edge_threshold
            )));
        }
        if !(self.max_gap.is_finite() && self.max_gap > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "max_gap must be positive, got {}",
                self.max_gap
            )));
        }
        if !(self.simplify_epsilon.is_finite() && self.simplify_epsilon >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "simplify_epsilon must be non-negative, got {}",
                self.simplify_epsilon
            )));
        }
        if self.polynomial_degree > MAX_DEGREE {
            return Err(PipelineError::InvalidConfig(format!(
                "polynomial_degree must be at most {MAX_DEGREE}, got {}",
                self.polynomial_degree
            )));
        }
        if self.sample_step == 0 {
            return Err(PipelineError::InvalidConfig(
                "sample_step must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            edge_threshold: Self::DEFAULT_EDGE_THRESHOLD,
            max_gap: Self::DEFAULT_MAX_GAP,
            simplify_epsilon: Self::DEFAULT_SIMPLIFY_EPSILON,
            polynomial_degree: Self::DEFAULT_POLYNOMIAL_DEGREE,
            max_paths: Self::DEFAULT_MAX_PATHS,
            sample_step: Self::DEFAULT_SAMPLE_STEP,
            segmenter: PathSegmenterKind::default(),
        }
    }
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// One result per selected path, longest path first.
    pub fits: Vec<FittingResult>,

    /// Dimensions of the source buffer in pixels.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with all intermediate stage outputs preserved.
///
/// Used for overlays (simplified paths under fitted curves) and for
/// diagnostics. Every field is a value produced by one stage; nothing is
/// shared with the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Stage 1: edge pixels above the gradient threshold.
    pub edges: EdgeSet,
    /// Stage 2: every committed path, in segmentation order.
    pub paths: Vec<Polyline>,
    /// Stage 2b: the longest paths, longest first.
    pub selected: Vec<Polyline>,
    /// Stage 3: Douglas-Peucker simplification of each selected path.
    pub simplified: Vec<Polyline>,
    /// Stage 4: one fit per simplified path.
    pub fits: Vec<FittingResult>,
    /// Source buffer dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Drop the intermediates, keeping what [`crate::process`] returns.
    #[must_use]
    pub fn into_process_result(self) -> ProcessResult {
        ProcessResult {
            fits: self.fits,
            dimensions: self.dimensions,
        }
    }
}

/// Errors that can occur during pipeline processing.
///
/// Finding nothing is not an error: an image without edges produces an
/// empty fit list. Uses custom `Serialize`/`Deserialize` because
/// `image::ImageError` does not implement serde traits.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A raw pixel slice does not match its declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    InvalidBuffer {
        /// `width * height * 4`.
        expected: usize,
        /// Length of the supplied slice.
        actual: usize,
    },

    /// The encoded image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Serde-compatible proxy for `PipelineError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    InvalidConfig(String),
    InvalidBuffer { expected: usize, actual: usize },
    EmptyInput,
    ImageDecode(String),
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
            Self::InvalidBuffer { expected, actual } => PipelineErrorProxy::InvalidBuffer {
                expected: *expected,
                actual: *actual,
            },
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            PipelineErrorProxy::InvalidBuffer { expected, actual } => {
                Self::InvalidBuffer { expected, actual }
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            // The typed image error cannot be rebuilt; keep its message.
            PipelineErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
        })
    }
}

//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! parameter tuning (edge threshold, gap, tolerance, degree). They are
//! collected by [`process_staged_with_diagnostics`], which runs the same
//! stages as [`process_staged`](crate::process_staged) and times each one.
//!
//! The pipeline does not read the system clock itself: callers provide a
//! [`Clock`], so the core stays free of platform time sources.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::segment::{PathSegmenter, select_top};
use crate::simplify::simplify_paths;
use crate::types::{FitStatus, FittingResult, PipelineConfig, PipelineError, Polyline, StagedResult};

/// Time source used to measure stage durations.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Capture the current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: gradient edge extraction.
    pub edge_extraction: StageDiagnostics,
    /// Stage 2: grouping edge points into paths.
    pub segmentation: StageDiagnostics,
    /// Stage 2b: keeping the longest paths.
    pub selection: StageDiagnostics,
    /// Stage 3: Douglas-Peucker simplification.
    pub simplification: StageDiagnostics,
    /// Stage 4: polynomial fitting.
    pub fitting: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Edge extraction metrics.
    EdgeExtraction {
        /// Gradient magnitude threshold.
        threshold: f64,
        /// Pixels above the threshold.
        edge_pixel_count: u64,
        /// Pixels tested (the interior of the buffer).
        interior_pixel_count: u64,
    },
    /// Path segmentation metrics.
    Segmentation {
        /// Which segmenter strategy was used.
        strategy: String,
        /// Linking distance in pixels.
        max_gap: f64,
        /// Number of committed paths.
        path_count: usize,
        /// Total points across all committed paths.
        total_point_count: usize,
        /// Minimum points in any single path.
        min_path_points: usize,
        /// Maximum points in any single path.
        max_path_points: usize,
        /// Mean points per path.
        mean_path_points: f64,
    },
    /// Longest-path selection metrics.
    Selection {
        /// Configured `max_paths`.
        requested: usize,
        /// Paths actually kept.
        selected: usize,
        /// Total points in the kept paths.
        point_count: usize,
    },
    /// Path simplification metrics.
    Simplification {
        /// Douglas-Peucker tolerance in pixels.
        epsilon: f64,
        /// Total points before simplification.
        points_before: usize,
        /// Total points after simplification.
        points_after: usize,
        /// Reduction ratio: `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
    /// Polynomial fitting metrics.
    Fitting {
        /// Configured polynomial degree.
        degree: usize,
        /// Results holding a real curve.
        fitted: usize,
        /// Insufficient-data sentinels.
        insufficient: usize,
        /// Singular-system sentinels.
        singular: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source buffer width in pixels.
    pub image_width: u32,
    /// Source buffer height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of edge pixels.
    pub edge_count: usize,
    /// Number of committed paths.
    pub path_count: usize,
    /// Number of results holding a real curve.
    pub fitted_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let stages: [(&str, &StageDiagnostics); 5] = [
            ("Edge Extraction", &self.edge_extraction),
            ("Segmentation", &self.segmentation),
            ("Selection", &self.selection),
            ("Simplification", &self.simplification),
            ("Fitting", &self.fitting),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Edges: {}  |  Paths: {}  |  Fitted curves: {}",
            self.summary.edge_count, self.summary.path_count, self.summary.fitted_count,
        ));

        lines.join("\n")
    }
}

/// Run the pipeline like [`process_staged`](crate::process_staged),
/// timing every stage with `clock`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
pub fn process_staged_with_diagnostics<B, C>(
    buffer: &B,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError>
where
    B: PixelBuffer + ?Sized,
    C: Clock,
{
    config.validate()?;
    let total_start = clock.now();
    let dimensions = buffer.dimensions();

    let start = clock.now();
    let edges = crate::edge::extract(buffer, config.edge_threshold);
    let edge_extraction = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::EdgeExtraction {
            threshold: config.edge_threshold,
            edge_pixel_count: edges.len() as u64,
            interior_pixel_count: u64::from(dimensions.width.saturating_sub(2))
                * u64::from(dimensions.height.saturating_sub(2)),
        },
    };

    let start = clock.now();
    let paths = config.segmenter.segment(edges.points(), config.max_gap);
    let stats = path_stats(&paths);
    let segmentation = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Segmentation {
            strategy: format!("{:?}", config.segmenter),
            max_gap: config.max_gap,
            path_count: paths.len(),
            total_point_count: stats.total,
            min_path_points: stats.min,
            max_path_points: stats.max,
            mean_path_points: stats.mean,
        },
    };

    let start = clock.now();
    let selected = select_top(&paths, config.max_paths);
    let selection = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Selection {
            requested: config.max_paths,
            selected: selected.len(),
            point_count: total_points(&selected),
        },
    };

    let start = clock.now();
    let simplified = simplify_paths(&selected, config.simplify_epsilon);
    let points_before = total_points(&selected);
    let points_after = total_points(&simplified);
    #[allow(clippy::cast_precision_loss)]
    let reduction_ratio = if points_before > 0 {
        1.0 - points_after as f64 / points_before as f64
    } else {
        0.0
    };
    let simplification = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Simplification {
            epsilon: config.simplify_epsilon,
            points_before,
            points_after,
            reduction_ratio,
        },
    };

    let start = clock.now();
    let fits = crate::fit_paths(&simplified, config, dimensions)?;
    let fitting = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Fitting {
            degree: config.polynomial_degree,
            fitted: count_status(&fits, FitStatus::Fitted),
            insufficient: count_status(&fits, FitStatus::InsufficientData),
            singular: count_status(&fits, FitStatus::Singular),
        },
    };

    let summary = PipelineSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count: u64::from(dimensions.width) * u64::from(dimensions.height),
        edge_count: edges.len(),
        path_count: paths.len(),
        fitted_count: count_status(&fits, FitStatus::Fitted),
    };

    let diagnostics = PipelineDiagnostics {
        edge_extraction,
        segmentation,
        selection,
        simplification,
        fitting,
        total_duration: clock.elapsed(&total_start),
        summary,
    };

    let staged = StagedResult {
        edges,
        paths,
        selected,
        simplified,
        fits,
        dimensions,
    };

    Ok((staged, diagnostics))
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::EdgeExtraction {
            threshold,
            edge_pixel_count,
            interior_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *interior_pixel_count > 0 {
                *edge_pixel_count as f64 / *interior_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("threshold={threshold:.1} edges={edge_pixel_count} ({density:.1}%)")
        }
        StageMetrics::Segmentation {
            strategy,
            max_gap,
            path_count,
            total_point_count,
            min_path_points,
            max_path_points,
            mean_path_points,
        } => {
            format!(
                "{strategy} gap={max_gap:.1} {path_count} paths, {total_point_count} pts (min={min_path_points} max={max_path_points} mean={mean_path_points:.1})",
            )
        }
        StageMetrics::Selection {
            requested,
            selected,
            point_count,
        } => format!("{selected}/{requested} paths, {point_count} pts"),
        StageMetrics::Simplification {
            epsilon,
            points_before,
            points_after,
            reduction_ratio,
        } => {
            format!(
                "eps={epsilon:.2} {points_before}->{points_after} pts ({:.1}% reduction)",
                reduction_ratio * 100.0,
            )
        }
        StageMetrics::Fitting {
            degree,
            fitted,
            insufficient,
            singular,
        } => format!(
            "degree={degree} fitted={fitted} insufficient={insufficient} singular={singular}"
        ),
    }
}

/// Statistics for a set of paths.
struct PathStats {
    total: usize,
    min: usize,
    max: usize,
    mean: f64,
}

fn path_stats(paths: &[Polyline]) -> PathStats {
    let total = total_points(paths);
    let min = paths.iter().map(Polyline::len).min().unwrap_or(0);
    let max = paths.iter().map(Polyline::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if paths.is_empty() {
        0.0
    } else {
        total as f64 / paths.len() as f64
    };
    PathStats {
        total,
        min,
        max,
        mean,
    }
}

fn total_points(polylines: &[Polyline]) -> usize {
    polylines.iter().map(Polyline::len).sum()
}

fn count_status(fits: &[FittingResult], status: FitStatus) -> usize {
    fits.iter().filter(|f| f.status == status).count()
}

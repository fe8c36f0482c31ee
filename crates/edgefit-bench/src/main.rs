//! edgefit-bench: CLI tool for pipeline parameter experimentation and diagnostics.
//!
//! Decodes an image file, runs the edge-to-curve pipeline with
//! configurable parameters, and prints the fitted formulas alongside
//! detailed per-stage diagnostics. Useful for:
//!
//! - Comparing segmentation strategies (`greedy` vs `components`)
//! - Tuning edge threshold, gap, simplification tolerance and degree
//! - Measuring per-stage durations to identify bottlenecks
//!
//! Log output goes to stderr through `env_logger`; the default filter is
//! `warn` and `RUST_LOG` overrides it.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin edgefit-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use edgefit_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use edgefit_pipeline::{FittingResult, PathSegmenterKind, PipelineConfig};

/// Pipeline parameter experimentation and diagnostics for edgefit.
///
/// Runs the pipeline on a given image with configurable parameters and
/// prints the fitted curves plus per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "edgefit-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Gradient magnitude a pixel must exceed to count as an edge.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_EDGE_THRESHOLD)]
    edge_threshold: f64,

    /// Largest distance in pixels between chained edge points (exclusive).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MAX_GAP)]
    max_gap: f64,

    /// Douglas-Peucker simplification tolerance in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SIMPLIFY_EPSILON)]
    simplify_epsilon: f64,

    /// Degree of the fitted polynomials (0-12).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_POLYNOMIAL_DEGREE)]
    degree: usize,

    /// How many of the longest paths to fit.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MAX_PATHS)]
    max_paths: usize,

    /// Horizontal spacing in pixels between sampled curve points.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SAMPLE_STEP, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    sample_step: u32,

    /// Path segmentation strategy.
    #[arg(long, value_enum, default_value_t = Segmenter::Greedy)]
    segmenter: Segmenter,

    /// Write an SVG overlay (fitted curves over simplified paths) to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics and fits as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// Missing fields take their default values.
    #[arg(long)]
    config_json: Option<String>,
}

/// Path segmentation strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Segmenter {
    /// Single greedy chain over x-sorted points.
    Greedy,
    /// Connected components of the "closer than max-gap" relation.
    Components,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        PipelineConfig {
            edge_threshold: cli.edge_threshold,
            max_gap: cli.max_gap,
            simplify_epsilon: cli.simplify_epsilon,
            polynomial_degree: cli.degree,
            max_paths: cli.max_paths,
            sample_step: cli.sample_step,
            segmenter: match cli.segmenter {
                Segmenter::Greedy => PathSegmenterKind::GreedyChain,
                Segmenter::Components => PathSegmenterKind::ConnectedComponents,
            },
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match edgefit_pipeline::decode::decode_rgba(&image_bytes) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.image_path.display(),
        image_bytes.len(),
        image.width(),
        image.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match edgefit_pipeline::diagnostics::process_staged_with_diagnostics(
            &image, &config, &StdClock,
        ) {
            Ok((staged, diagnostics)) => {
                if cli.json {
                    let output = serde_json::json!({
                        "diagnostics": &diagnostics,
                        "fits": &staged.fits,
                    });
                    match serde_json::to_string_pretty(&output) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                    println!();
                    print_fits(&staged.fits);
                }

                // Write SVG on the first run only.
                if run == 0
                    && let Some(ref svg_path) = cli.svg
                {
                    let title = cli
                        .image_path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("bench");
                    let desc = format!("{config:#?}");
                    let config_json = serde_json::to_string(&config).ok();
                    let metadata = edgefit_export::SvgMetadata {
                        title: Some(title),
                        description: Some(&desc),
                        config_json: config_json.as_deref(),
                    };
                    let svg = edgefit_export::to_overlay_svg(
                        &staged.fits,
                        &staged.simplified,
                        staged.dimensions,
                        &metadata,
                    );
                    match std::fs::write(svg_path, &svg) {
                        Ok(()) => {
                            eprintln!(
                                "SVG written to {} ({} bytes)",
                                svg_path.display(),
                                svg.len(),
                            );
                        }
                        Err(e) => {
                            eprintln!("Error writing SVG to {}: {e}", svg_path.display());
                        }
                    }
                }

                log::info!(
                    "run {}/{}: {} fits in {:.3}ms",
                    run + 1,
                    cli.runs,
                    staged.fits.len(),
                    diagnostics.total_duration.as_secs_f64() * 1000.0,
                );
                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print one line per fit, longest path first.
fn print_fits(fits: &[FittingResult]) {
    println!("Fits ({})\n{}", fits.len(), "=".repeat(60));
    if fits.is_empty() {
        println!("(no path longer than the minimum length)");
        return;
    }
    for (index, fit) in fits.iter().enumerate() {
        if fit.is_fitted() {
            println!(
                "#{index}: y = {}  (rms {:.3}px, {} curve points)",
                fit.formula,
                fit.rms_error,
                fit.curve.len(),
            );
        } else {
            println!("#{index}: {}", fit.formula);
        }
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Edge Extraction", |d| d.edge_extraction.duration),
        ("Segmentation", |d| d.segmentation.duration),
        ("Selection", |d| d.selection.duration),
        ("Simplification", |d| d.simplification.duration),
        ("Fitting", |d| d.fitting.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("edgefit-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_defaults_match_pipeline_defaults() {
        let cli = parse(&["image.png"]);
        assert_eq!(config_from_cli(&cli).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "image.png",
            "--degree",
            "2",
            "--max-paths",
            "3",
            "--segmenter",
            "components",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.polynomial_degree, 2);
        assert_eq!(config.max_paths, 3);
        assert_eq!(config.segmenter, PathSegmenterKind::ConnectedComponents);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "image.png",
            "--degree",
            "7",
            "--config-json",
            r#"{"polynomial_degree": 1}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.polynomial_degree, 1);
        assert_eq!(config.max_paths, PipelineConfig::DEFAULT_MAX_PATHS);
    }

    #[test]
    fn invalid_config_is_reported() {
        let cli = parse(&["image.png", "--degree", "13"]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.contains("polynomial_degree"), "got {err}");

        let cli = parse(&["image.png", "--config-json", "{not json"]);
        assert!(config_from_cli(&cli).unwrap_err().contains("--config-json"));
    }

    #[test]
    fn zero_sample_step_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["edgefit-bench", "image.png", "--sample-step", "0"]);
        assert!(result.is_err());
    }
}

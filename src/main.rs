use anyhow::{Context, Result};
use clap::Parser;
use silhouette_compare::capture::ImageDirectory;
use silhouette_compare::output::{JsonReport, ReportSink};
use silhouette_compare::segmentation::{masks_from_source, MatteThreshold};
use silhouette_compare::{
    ComparisonEngine, ComparisonResult, EngineConfig, FeedbackThresholds, RawMask,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of reference (instructor) mask images, one per sampled frame
    #[arg(short, long)]
    reference: PathBuf,

    /// Directories of candidate (learner) mask images; several are compared concurrently
    #[arg(short, long, required = true, num_args = 1..)]
    candidate: Vec<PathBuf>,

    /// Canonical mask width
    #[arg(long, default_value_t = 480)]
    canonical_width: u32,

    /// Canonical mask height
    #[arg(long, default_value_t = 480)]
    canonical_height: u32,

    /// Sampling interval between consecutive masks, in seconds
    #[arg(long, default_value_t = 3.0)]
    seconds_per_frame: f64,

    /// Resting metabolic rate, calories per minute
    #[arg(long, default_value_t = 1.2)]
    resting_rate: f64,

    /// Flow magnitude to intensity scale
    #[arg(long, default_value_t = 8.0)]
    intensity_scale: f64,

    /// Lower intensity clamp
    #[arg(long, default_value_t = 1.0)]
    intensity_min: f64,

    /// Upper intensity clamp
    #[arg(long, default_value_t = 5.0)]
    intensity_max: f64,

    /// Flow similarity denominator floor
    #[arg(long, default_value_t = 0.001)]
    epsilon: f64,

    /// Per-frame worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Luma above which a mask image pixel counts as foreground
    #[arg(long, default_value_t = 127)]
    matte_threshold: u8,

    /// Average similarity below which form feedback is given
    #[arg(long, default_value_t = 0.7)]
    form_threshold: f64,

    /// Frame lag above which pace feedback is given
    #[arg(long, default_value_t = 10)]
    lag_threshold: usize,

    /// Speed ratio below which movements are reported as too slow
    #[arg(long, default_value_t = 0.8)]
    slow_ratio: f64,

    /// Speed ratio above which movements are reported as too fast
    #[arg(long, default_value_t = 1.2)]
    fast_ratio: f64,

    /// Flow magnitude difference above which movement patterns are reported as mismatched
    #[arg(long, default_value_t = 0.5)]
    pattern_threshold: f64,

    /// Pretty-print JSON output (multi-line, not line-delimited)
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            canonical_width: self.canonical_width,
            canonical_height: self.canonical_height,
            seconds_per_frame: self.seconds_per_frame,
            resting_rate: self.resting_rate,
            intensity_scale: self.intensity_scale,
            intensity_min: self.intensity_min,
            intensity_max: self.intensity_max,
            epsilon: self.epsilon,
            worker_threads: self.threads,
            feedback: FeedbackThresholds {
                min_similarity: self.form_threshold,
                max_delay: self.lag_threshold,
                slow_speed_ratio: self.slow_ratio,
                fast_speed_ratio: self.fast_ratio,
                max_flow_difference: self.pattern_threshold,
            },
            ..EngineConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Silhouette compare starting");
    tracing::info!("Canonical size: {}x{}", args.canonical_width, args.canonical_height);
    tracing::info!("Seconds per frame: {}", args.seconds_per_frame);

    let engine = ComparisonEngine::new(args.engine_config())
        .context("Invalid comparison settings")?;

    let producer = MatteThreshold::new(args.matte_threshold);
    let reference = load_masks(&args.reference, producer)
        .context("Failed to load reference masks")?;

    let mut candidates = Vec::with_capacity(args.candidate.len());
    for dir in &args.candidate {
        let masks = load_masks(dir, producer)
            .with_context(|| format!("Failed to load candidate masks from {}", dir.display()))?;
        candidates.push((dir.display().to_string(), masks));
    }

    let reference_key = args.reference.display().to_string();
    let results = run_comparisons(&engine, &reference_key, &reference, &candidates)?;

    let mut report = JsonReport::new(std::io::stdout().lock(), args.pretty);
    let labelled = results.len() > 1;
    for (label, result) in &results {
        for item in &result.feedback {
            tracing::info!("{}: {}", label, item);
        }
        report.write_report(labelled.then_some(label.as_str()), result)?;
    }

    Ok(())
}

fn load_masks(dir: &Path, mut producer: MatteThreshold) -> Result<Vec<RawMask>> {
    let mut source = ImageDirectory::open(dir)?;
    let masks = masks_from_source(&mut source, &mut producer)?;
    tracing::info!("Loaded {} masks from {}", masks.len(), dir.display());
    Ok(masks)
}

/// Compare every candidate against the shared reference, one thread per
/// candidate; the reference profile is computed once and reused
fn run_comparisons(
    engine: &ComparisonEngine,
    reference_key: &str,
    reference: &[RawMask],
    candidates: &[(String, Vec<RawMask>)],
) -> Result<Vec<(String, ComparisonResult)>> {
    let start = Instant::now();

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = candidates
            .iter()
            .map(|(label, masks)| {
                scope.spawn(move || {
                    let result =
                        engine.compare_with_reference(reference_key, || reference.to_vec(), masks);
                    (label.clone(), result)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });

    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let (label, result) = outcome
            .map_err(|_| anyhow::anyhow!("Comparison worker panicked"))?;
        let result = result.with_context(|| format!("Failed to compare {}", label))?;
        results.push((label, result));
    }

    tracing::info!(
        "Compared {} candidate(s) in {:.1}ms",
        results.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(results)
}

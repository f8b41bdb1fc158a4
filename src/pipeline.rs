//! End-to-end run: readiness, loading, pairing, resume, batched routing.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::coord::BoundingBox;
use crate::error::PipelineError;
use crate::health::wait_until_ready;
use crate::resume::load_processed;
use crate::router::{BatchPath, BatchRouter, RoutingStrategy};
use crate::traits::RoutingService;
use crate::trips::{pair_trips, read_address_rows};
use crate::writer::IncrementalWriter;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub batch_size: usize,
    /// Sleep between batches.
    pub batch_pause: Duration,
    /// Sleep after a batch in which the service signalled overload.
    pub overload_pause: Duration,
    pub health_attempts: u32,
    pub health_interval: Duration,
    pub bbox: BoundingBox,
    pub strategy: RoutingStrategy,
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/rideaddress_v1.csv"),
            output_path: PathBuf::from("data/ors_local_coords_only_results.csv"),
            batch_size: 50,
            batch_pause: Duration::ZERO,
            overload_pause: Duration::from_secs(30),
            health_attempts: 20,
            health_interval: Duration::from_secs(5),
            bbox: BoundingBox::default(),
            strategy: RoutingStrategy::default(),
            show_progress: true,
        }
    }
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub trips: usize,
    pub unparseable_rows: usize,
    pub malformed_trips: usize,
    pub out_of_bounds_trips: usize,
    pub batches_skipped: usize,
    pub batches_matrix: usize,
    pub batches_fallback: usize,
    pub batches_direct: usize,
    /// Rows appended during this run.
    pub results_written: usize,
    /// Rows appended during this run without an error tag.
    pub routed: usize,
    /// Trips recorded in the output file after this run.
    pub total_processed: usize,
}

/// Run the whole pipeline against `service`.
///
/// Only a routing service that never becomes ready, or a local I/O problem,
/// makes this return an error.
pub fn run<S: RoutingService>(config: &PipelineConfig, service: S) -> Result<RunSummary, PipelineError> {
    run_with_pause(config, service, thread::sleep)
}

/// Like [`run`], with inter-batch pauses handed to `pause` instead of sleeping.
///
/// No pause follows skipped batches or the last batch.
pub fn run_with_pause<S, P>(config: &PipelineConfig, service: S, mut pause: P) -> Result<RunSummary, PipelineError>
where
    S: RoutingService,
    P: FnMut(Duration),
{
    if config.batch_size == 0 {
        return Err(PipelineError::Config("batch size must be at least 1".to_string()));
    }

    wait_until_ready(&service, config.health_attempts, config.health_interval)?;

    let (rows, garbled) = read_address_rows(&config.input_path)?;
    let (trips, stats) = pair_trips(rows, &config.bbox);
    let mut summary = RunSummary {
        trips: trips.len(),
        unparseable_rows: stats.unparseable_rows + garbled,
        malformed_trips: stats.malformed,
        out_of_bounds_trips: stats.out_of_bounds,
        ..RunSummary::default()
    };

    let mut processed = load_processed(&config.output_path)?;
    let remaining = trips.iter().filter(|trip| !processed.contains(&trip.id)).count();
    info!(total = trips.len(), remaining, batch_size = config.batch_size, "routing trips in batches");

    let mut writer = IncrementalWriter::new(&config.output_path)?;
    let router = BatchRouter::new(service, config.strategy);

    let batch_count = trips.len().div_ceil(config.batch_size);
    let progress = progress_bar(batch_count, config.show_progress);

    for (index, batch) in trips.chunks(config.batch_size).enumerate() {
        let outcome = router.route_batch(batch, &processed);
        match outcome.path {
            BatchPath::Skipped => {
                summary.batches_skipped += 1;
                progress.inc(1);
                continue;
            }
            BatchPath::Matrix => summary.batches_matrix += 1,
            BatchPath::Fallback => summary.batches_fallback += 1,
            BatchPath::Direct => summary.batches_direct += 1,
        }

        writer.append_batch(&outcome.results)?;
        summary.results_written += outcome.results.len();
        summary.routed += outcome.results.iter().filter(|r| r.is_routed()).count();
        processed.extend(outcome.results.into_iter().map(|r| r.ride_id));
        progress.inc(1);

        if index + 1 == batch_count {
            continue;
        }
        if outcome.overloaded {
            warn!(batch = index, pause_secs = config.overload_pause.as_secs_f64(), "routing service overloaded, backing off");
            pause(config.overload_pause);
        } else if !config.batch_pause.is_zero() {
            pause(config.batch_pause);
        }
    }
    progress.finish_and_clear();

    summary.total_processed = processed.len();
    info!(
        written = summary.results_written,
        routed = summary.routed,
        skipped_batches = summary.batches_skipped,
        fallback_batches = summary.batches_fallback,
        total = summary.total_processed,
        "processing finished"
    );
    Ok(summary)
}

fn progress_bar(batches: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(batches as u64);
    if let Ok(style) = ProgressStyle::with_template("Batches {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}]") {
        bar.set_style(style);
    }
    bar
}

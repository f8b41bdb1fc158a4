//! # ride-router CLI
//!
//! Computes road distance and duration for every trip in an address export,
//! appending results to a file that also serves as the resume checkpoint.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ride_router::coord::BoundingBox;
use ride_router::ors::{OrsClient, OrsConfig};
use ride_router::pipeline::{self, PipelineConfig};
use ride_router::router::RoutingStrategy;

#[derive(Parser)]
#[command(name = "ride-router", version)]
#[command(about = "Resumable batch routing of trip origin/destination pairs")]
struct Cli {
    /// Semicolon-delimited address export (Lat;Lng;RideAddressTypeID;RideID)
    #[arg(short, long, default_value = "data/rideaddress_v1.csv")]
    input: PathBuf,

    /// Result file, appended to and used to resume
    #[arg(short, long, default_value = "data/ors_local_coords_only_results.csv")]
    output: PathBuf,

    /// Routing service base URL
    #[arg(long, default_value = "http://localhost:8082/ors")]
    base_url: String,

    /// Routing profile
    #[arg(long, default_value = "driving-car")]
    profile: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Trips per matrix request
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    /// Pause between batches in seconds
    #[arg(long, default_value_t = 0.0)]
    pause: f64,

    /// Pause after an overloaded batch in seconds
    #[arg(long, default_value_t = 30.0)]
    overload_pause: f64,

    /// Health check attempts before giving up
    #[arg(long, default_value_t = 20)]
    health_attempts: u32,

    /// Seconds between health checks
    #[arg(long, default_value_t = 5)]
    health_interval: u64,

    #[arg(long, default_value_t = -74.0, allow_negative_numbers = true)]
    min_lng: f64,
    #[arg(long, default_value_t = -34.0, allow_negative_numbers = true)]
    max_lng: f64,
    #[arg(long, default_value_t = -35.0, allow_negative_numbers = true)]
    min_lat: f64,
    #[arg(long, default_value_t = 6.0, allow_negative_numbers = true)]
    max_lat: f64,

    /// Route every trip individually instead of using matrix requests
    #[arg(long)]
    direct_only: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let pause = seconds(cli.pause).context("invalid --pause")?;
    let overload_pause = seconds(cli.overload_pause).context("invalid --overload-pause")?;

    let client = OrsClient::new(OrsConfig {
        base_url: cli.base_url,
        profile: cli.profile,
        timeout_secs: cli.timeout,
        ..OrsConfig::default()
    })
    .context("failed to build HTTP client")?;

    let config = PipelineConfig {
        input_path: cli.input,
        output_path: cli.output,
        batch_size: usize::try_from(cli.batch_size).context("batch size too large")?,
        batch_pause: pause,
        overload_pause,
        health_attempts: cli.health_attempts,
        health_interval: Duration::from_secs(cli.health_interval),
        bbox: BoundingBox {
            min_lng: cli.min_lng,
            max_lng: cli.max_lng,
            min_lat: cli.min_lat,
            max_lat: cli.max_lat,
        },
        strategy: if cli.direct_only {
            RoutingStrategy::DirectOnly
        } else {
            RoutingStrategy::MatrixWithFallback
        },
        show_progress: !cli.no_progress,
    };

    pipeline::run(&config, &client)
        .with_context(|| format!("routing {} failed", config.input_path.display()))?;
    Ok(())
}

fn seconds(value: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|err| anyhow::anyhow!("{value}: {err}"))
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

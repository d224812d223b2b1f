use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tripstream_core::config::{JobConfig, TimeMode};
use tripstream_core::pipeline::run_job;
use tripstream_core::sink::{AnalyticsSink, DeliveryStreamSink};
use tripstream_core::source::JsonLinesSource;

/// How many hotspot lines to buffer before a delivery flush.
const DELIVERY_BATCH_SIZE: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "tripstream")]
#[command(about = "Taxi trip hotspot and airport-duration analytics", long_about = None)]
struct Cli {
    /// Newline-delimited JSON event file, or '-' for stdin.
    #[arg(long)]
    input: String,

    /// Destination for pickup hotspot lines ('-' for stdout).
    #[arg(long, default_value = "-")]
    pickups_out: String,

    /// Destination for trip-duration JSON records ('-' for stdout).
    #[arg(long, default_value = "-")]
    durations_out: String,

    #[arg(long, default_value_t = 10)]
    window_minutes: u64,

    #[arg(long, default_value_t = 6)]
    geohash_precision: usize,

    /// Minimum pickups per cell and window before a hotspot is reported.
    #[arg(long, default_value_t = 2)]
    min_pickup_count: u64,

    /// Minimum trips per cell, airport, and window before duration stats
    /// are reported.
    #[arg(long, default_value_t = 2)]
    min_trip_count: u64,

    #[arg(long, default_value_t = 2)]
    parallelism: usize,

    /// Use wall-clock arrival time instead of event time.
    #[arg(long)]
    no_event_time: bool,

    /// Derive watermarks from a bounded out-of-orderness delay instead of
    /// punctuation records embedded in the stream.
    #[arg(long)]
    max_out_of_orderness_ms: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.no_event_time && cli.max_out_of_orderness_ms.is_some() {
        bail!("--no-event-time and --max-out-of-orderness-ms are mutually exclusive");
    }
    let time_mode = if cli.no_event_time {
        TimeMode::ProcessingTime
    } else if let Some(delay_ms) = cli.max_out_of_orderness_ms {
        TimeMode::BoundedOutOfOrder(Duration::from_millis(delay_ms))
    } else {
        TimeMode::EventTime
    };

    let config = JobConfig {
        window_length: Duration::from_secs(cli.window_minutes * 60),
        geohash_precision: cli.geohash_precision,
        min_pickup_count: cli.min_pickup_count,
        min_trip_count: cli.min_trip_count,
        time_mode,
        parallelism: cli.parallelism,
        ..JobConfig::default()
    };

    let source = JsonLinesSource::new(open_input(&cli.input)?);
    let pickup_sink = DeliveryStreamSink::new(open_output(&cli.pickups_out)?, DELIVERY_BATCH_SIZE);
    let duration_sink = AnalyticsSink::new(open_output(&cli.durations_out)?);

    tracing::info!(input = %cli.input, ?time_mode, "starting to consume events");
    let summary = run_job(&config, source, pickup_sink, duration_sink)?;

    println!(
        "ingested={} accepted={} filtered={} late={} discarded_open={} hotspots={} durations={}",
        summary.events_ingested,
        summary.classifier.accepted,
        summary.classifier.dropped(),
        summary.late_drops,
        summary.open_windows_discarded,
        summary.pickup_windows_emitted,
        summary.duration_windows_emitted,
    );
    Ok(())
}

fn open_input(path: &str) -> Result<Box<dyn BufRead + Send>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(PathBuf::from(path))
        .with_context(|| format!("cannot open event input {path}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &str) -> Result<Box<dyn Write + Send>> {
    if path == "-" {
        return Ok(Box::new(io::stdout()));
    }
    let file =
        File::create(PathBuf::from(path)).with_context(|| format!("cannot create output {path}"))?;
    Ok(Box::new(BufWriter::new(file)))
}

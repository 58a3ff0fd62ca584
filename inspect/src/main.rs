//! Dataset inspection tool
//!
//! Loads a reader configuration, reports the row count of every backing
//! file, then walks one full epoch through the batch feed and reports the
//! number of batches and the shape of the last one.
//!
//! # Usage
//!
//! ```bash
//! # Walk one epoch using the configured batch size
//! rowstream-inspect --config rowstream.toml
//!
//! # Override batch geometry
//! rowstream-inspect --config rowstream.toml --batch-size 50 --buffer-batches 4
//! ```

use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rowstream_core::{Dataset, ReaderConfig};

/// Batched row reader inspector
#[derive(Parser, Debug)]
#[command(name = "rowstream-inspect")]
#[command(about = "Walk one epoch of a configured dataset and report batch shapes")]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: String,

    /// Rows per batch (overrides loader.batch_size)
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Batches read per storage access (overrides loader.buffer_batches)
    #[arg(long)]
    buffer_batches: Option<usize>,

    /// Stop after this many batches
    #[arg(long)]
    max_batches: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ReaderConfig::from_file(&args.config)?.with_env_overrides();
    if let Some(batch_size) = args.batch_size {
        config.loader.batch_size = batch_size;
    }
    if let Some(buffer_batches) = args.buffer_batches {
        config.loader.buffer_batches = buffer_batches;
    }
    let dataset = Dataset::from_config(config)?;

    tracing::info!("Inspecting dataset");
    tracing::info!("  Features: {:?}", dataset.config().dataset.features);
    tracing::info!("  Label: {}", dataset.config().dataset.label);
    tracing::info!("  Batch size: {}", dataset.config().loader.batch_size);
    tracing::info!("  Buffer batches: {}", dataset.config().loader.buffer_batches);

    let mut total_rows = 0;
    for path in &dataset.config().dataset.files {
        let rows = dataset.backend().open(path)?.row_count();
        tracing::info!("  {}: {} rows", path.display(), rows);
        total_rows += rows;
    }

    let mut feed = dataset.feed()?;
    let expected_batches = feed.num_batches()?;

    let started = Instant::now();
    let mut batches = 0;
    let mut rows = 0;
    let mut last_shape = None;
    for events in feed.by_ref() {
        let (features, labels) = events?;
        batches += 1;
        rows += features.num_rows();
        last_shape = Some((
            (features.num_rows(), features.num_columns()),
            (labels.num_rows(), labels.num_columns()),
        ));
        if args.max_batches.is_some_and(|max| batches >= max) {
            tracing::info!("Stopping after {} batches", batches);
            break;
        }
    }
    let elapsed = started.elapsed();

    if batches == expected_batches && rows != total_rows {
        tracing::warn!("Read {} rows but files report {}", rows, total_rows);
    }

    println!("files:   {}", dataset.config().dataset.files.len());
    println!("rows:    {rows} of {total_rows}");
    println!("batches: {batches} of {expected_batches}");
    if let Some((features, labels)) = last_shape {
        println!("last batch: features {features:?}, labels {labels:?}");
    }
    println!("elapsed: {:.3}s", elapsed.as_secs_f64());

    Ok(())
}

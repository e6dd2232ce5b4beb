use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use nearest_tz::{Config, ResolverBuilder, ThresholdMetric};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Metric {
    Chord,
    GreatCircle,
}

impl From<Metric> for ThresholdMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Chord => ThresholdMetric::Chord,
            Metric::GreatCircle => ThresholdMetric::GreatCircle,
        }
    }
}

/// Fill in missing timezones from the nearest labelled record.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Record file, `lat,lon[,timezone,...]` per line (`.gz` accepted)
    input: PathBuf,

    /// Maximum distance in km to the nearest labelled record
    threshold_km: f64,

    #[arg(short, long)]
    workers: Option<usize>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Timezone token marking a record as unlabelled
    #[arg(long)]
    marker: Option<String>,

    #[arg(long, value_enum)]
    metric: Option<Metric>,

    /// JSON (or TOML) file with default settings
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let mut builder = ResolverBuilder::new()
        .config(config)
        .threshold_km(args.threshold_km);
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    if let Some(dir) = args.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(marker) = args.marker {
        builder = builder.undefined_marker(marker);
    }
    if let Some(metric) = args.metric {
        builder = builder.metric(metric.into());
    }

    let report = builder
        .run(&args.input)
        .with_context(|| format!("processing {}", args.input.display()))?;

    info!(
        "{} of {} lines written to {} partition(s)",
        report.stats.labeled + report.stats.resolved,
        report.stats.total,
        report.outputs.len()
    );
    Ok(())
}

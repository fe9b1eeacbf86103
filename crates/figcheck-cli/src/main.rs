//! figcheck - figure regression testing CLI
//!
//! Compares images, prints fingerprints and turns worker fragments into
//! JSON and HTML reports.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use figcheck_core::RunConfig;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;

#[derive(Parser)]
#[command(name = "figcheck")]
#[command(author, version, about = "Figure regression testing CLI")]
#[command(long_about = "
Compare rendered figures against baselines and report the results.

Examples:
  figcheck compare baseline/test_line.png result.png     # RMS comparison
  figcheck compare a.png b.png -t 5 --diff diff.png
  figcheck hash result.png --kernel phash                # Print a fingerprint
  figcheck merge figcheck-results --summary json,html    # Merge worker fragments
  figcheck summary figcheck-results/results.json --out report
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run configuration (YAML). Defaults to $FIGCHECK_CONFIG
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two images by RMS difference
    #[command(visible_alias = "c")]
    Compare(CompareArgs),

    /// Print the fingerprint of one or more artifacts
    #[command(visible_alias = "h")]
    Hash(HashArgs),

    /// Merge worker fragments and write summaries
    #[command(visible_alias = "m")]
    Merge(MergeArgs),

    /// Re-render summaries from a JSON summary
    #[command(visible_alias = "s")]
    Summary(SummaryArgs),
}

#[derive(Args)]
struct CompareArgs {
    /// Baseline image
    baseline: PathBuf,

    /// Result image
    result: PathBuf,

    /// RMS tolerance (defaults to the configured tolerance)
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Where to write the diff image on failure
    #[arg(short, long)]
    diff: Option<PathBuf>,
}

#[derive(Args)]
struct HashArgs {
    /// Artifacts or glob patterns
    #[arg(required = true)]
    input: Vec<String>,

    /// Kernel: sha256, phash
    #[arg(short, long)]
    kernel: Option<String>,

    /// Hash size for phash (bits per side)
    #[arg(long)]
    hash_size: Option<u32>,

    /// High-frequency factor for phash
    #[arg(long)]
    high_freq_factor: Option<u32>,
}

#[derive(Args)]
struct MergeArgs {
    /// Results directory containing worker fragments
    results_dir: PathBuf,

    /// Summary formats, comma separated: json, html, basic-html
    #[arg(short, long, value_delimiter = ',')]
    summary: Vec<String>,

    /// Write the merged fingerprints to this hash library
    #[arg(long)]
    hash_library: Option<PathBuf>,
}

#[derive(Args)]
struct SummaryArgs {
    /// JSON summary written by a previous merge
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    out: PathBuf,

    /// Summary formats, comma separated: json, html, basic-html
    #[arg(short, long, value_delimiter = ',')]
    summary: Vec<String>,
}

fn init_logging(verbose: u8, log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let dir = dir.map_or_else(|| PathBuf::from("."), PathBuf::from);
            let name = path
                .file_name()
                .context("--log-file needs a file name")?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_ref())?;

    let config = RunConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Compare(args) => commands::compare::run(args, &config, cli.verbose),
        Commands::Hash(args) => commands::hash::run(args, &config),
        Commands::Merge(args) => commands::merge::run(args, &config),
        Commands::Summary(args) => commands::summary::run(args, &config),
    }
}

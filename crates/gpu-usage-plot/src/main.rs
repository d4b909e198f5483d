//! gpu-usage-plot - Plot GPU utilization from nvidia-smi CSV dumps

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod output;

use config::PlotConfig;
use gpu_usage_plot::{pipeline, summarize, PlotError};
use output::{OutputFormat, OutputFormatter};

/// Plot GPU compute and memory utilization recorded by nvidia-smi
#[derive(Debug, Parser)]
#[command(name = "gpu-usage-plot")]
#[command(about = "Plot GPU compute and memory utilization recorded by nvidia-smi")]
#[command(version)]
pub struct Cli {
    /// CSV file written by `nvidia-smi --query-gpu=... --format=csv`
    statfile: PathBuf,

    /// If given, only display GPUs with these ids (numbered after bus id)
    #[arg(long, num_args = 1.., value_name = "ID")]
    filter_ids: Option<Vec<usize>>,

    /// Output image path [default: gpu_usage.png]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Image resolution in dots per inch
    #[arg(long)]
    dpi: Option<u32>,

    /// Summary output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Enable JSON output (overrides --format)
    #[arg(long)]
    json: bool,

    /// Do not print the per-GPU summary
    #[arg(long)]
    no_summary: bool,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    save_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.verbose);
    debug!("Starting gpu-usage-plot with {:?}", cli);

    let mut config = PlotConfig::load(cli.config.as_deref())?;
    info!("Loaded configuration from {:?}", config.source());
    config.apply_overrides(cli.output.clone(), cli.dpi)?;

    if cli.save_config {
        config.save()?;
        info!("Saved configuration to {:?}", config.source());
    }

    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        cli.format
    };

    let dataset = pipeline::plot(
        &cli.statfile,
        &config.columns,
        cli.filter_ids.as_deref(),
        &config.render,
        &config.output,
    )
    .map_err(|err| {
        let context = failure_context(&err, &cli.statfile);
        anyhow::Error::new(err).context(context)
    })?;

    let formatter = OutputFormatter::new(output_format);
    formatter.print_success(&format!("Saved {}", config.output.display()));

    if !cli.no_summary {
        let summary = summarize(&dataset, &config.columns.name);
        formatter.print_list(&summary)?;
    }

    Ok(())
}

/// Top-level message for a failed run, blaming the input file for data errors
fn failure_context(err: &PlotError, statfile: &Path) -> String {
    if err.is_data_error() {
        format!("Failed to read GPU stats from {}", statfile.display())
    } else {
        format!("Failed to plot {}", statfile.display())
    }
}

fn init_tracing(log_level: &str, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        match log_level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::WARN,
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gpu_usage_plot={}", level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

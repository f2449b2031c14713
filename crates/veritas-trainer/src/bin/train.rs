use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use veritas_core::default_device;
use veritas_trainer::{CsvCurves, LogCurves, Pipeline, PipelineConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Arch {
    Dense,
    Lstm,
    All,
}

/// Train the fake-news classifiers and persist the best one
#[derive(Parser)]
#[command(name = "train")]
#[command(version)]
struct Cli {
    /// Dataset with title, text, date and label columns (.csv, .jsonl or .json)
    #[arg(short, long)]
    data: PathBuf,

    /// Directory for the model, vectorizer, histories and report
    #[arg(short, long, default_value = "models/veritas")]
    out: PathBuf,

    /// JSON file overriding the default pipeline configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Architectures to train
    #[arg(short, long, value_enum, default_value_t = Arch::All)]
    arch: Arch,

    /// Override the epoch budget of every candidate
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Do not write learning-curve CSV files
    #[arg(long)]
    no_curves: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if cli.arch != Arch::All {
        let keep = match cli.arch {
            Arch::Dense => "dense",
            _ => "lstm",
        };
        config.candidates.retain(|c| c.architecture.name() == keep);
    }
    if let Some(epochs) = cli.epochs {
        config = config.with_epochs(epochs);
    }

    let device = default_device();
    info!(?device, "starting training pipeline");

    let mut pipeline = Pipeline::new(config, device)?.with_renderer(LogCurves);
    if !cli.no_curves {
        pipeline = pipeline.with_renderer(CsvCurves::new(&cli.out));
    }

    let report = pipeline.run(&cli.data, &cli.out)?;
    info!(
        winner = %report.winner,
        dir = %report.artifacts.display(),
        "training complete"
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = run(cli) {
        error!("Training failed: {:#}", e);
        std::process::exit(1);
    }
}

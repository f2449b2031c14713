use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::error;
use veritas_core::predictor::DEFAULT_THRESHOLD;
use veritas_core::{default_device, Label, Predictor};

/// Read one article per line from stdin and print a JSON prediction per line
#[derive(Parser)]
#[command(name = "veritas-predict")]
#[command(version)]
struct Cli {
    /// Directory written by the `train` binary
    #[arg(short, long, default_value = "models/veritas")]
    model_dir: PathBuf,

    /// Probability at or above which an article is reported as fake
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictOutput {
    pub input: String,
    pub probability: Option<f32>,
    pub fake: Option<bool>,
    pub error: Option<String>,
}

fn predict_line(predictor: &Predictor, line: &str) -> PredictOutput {
    match predictor.classify(line) {
        Ok(p) => PredictOutput {
            input: line.to_string(),
            probability: Some(p.probability),
            fake: Some(p.label == Label::Fake),
            error: None,
        },
        Err(e) => PredictOutput {
            input: line.to_string(),
            probability: None,
            fake: None,
            error: Some(e.to_string()),
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    let predictor = Predictor::load(&cli.model_dir, &default_device())
        .with_context(|| format!("failed to load model from {}", cli.model_dir.display()))?
        .with_threshold(cli.threshold);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let output = predict_line(&predictor, line.trim());
        writeln!(stdout, "{}", serde_json::to_string(&output)?)?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    if let Err(e) = run(Cli::parse()) {
        error!("Prediction failed: {:#}", e);
        std::process::exit(1);
    }
}

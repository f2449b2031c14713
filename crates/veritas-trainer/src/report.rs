//! # Learning Curves
//!
//! Rendering of a [`History`] is delegated to a [`CurveRenderer`]. The
//! pipeline calls it once per trained candidate with a title such as
//! `"dense"` or `"lstm"`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::history::{History, Metric};

/// Something that can present train/validation series per epoch.
pub trait CurveRenderer {
    fn render(&self, history: &History, title: &str) -> Result<()>;
}

/// Writes `curves-<title>.csv` with one row per epoch and a train and a
/// validation column for every [`Metric`].
#[derive(Debug, Clone)]
pub struct CsvCurves {
    dir: PathBuf,
}

impl CsvCurves {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir.join(format!("curves-{}.csv", title))
    }
}

impl CurveRenderer for CsvCurves {
    fn render(&self, history: &History, title: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path_for(title);
        write_curves(&path, history)
            .with_context(|| format!("failed to write curves to {}", path.display()))?;
        info!(path = %path.display(), epochs = history.len(), "wrote learning curves");
        Ok(())
    }
}

fn write_curves(path: &Path, history: &History) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["epoch".to_string()];
    for metric in Metric::ALL {
        header.push(format!("train_{}", metric.name()));
        header.push(format!("val_{}", metric.name()));
    }
    writer.write_record(&header)?;

    for record in &history.epochs {
        let mut row = vec![record.epoch.to_string()];
        for metric in Metric::ALL {
            row.push(metric.of(&record.train).to_string());
            row.push(metric.of(&record.validation).to_string());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Logs every series as a compact line per metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCurves;

impl CurveRenderer for LogCurves {
    fn render(&self, history: &History, title: &str) -> Result<()> {
        for metric in Metric::ALL {
            let (train, validation) = history.series(metric);
            info!(
                "{} {}: train [{}] val [{}]",
                title,
                metric.title(),
                format_series(&train),
                format_series(&validation)
            );
        }
        Ok(())
    }
}

fn format_series(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.4}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

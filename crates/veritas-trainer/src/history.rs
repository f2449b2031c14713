//! Per-epoch training history.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::metrics::BinaryMetrics;

/// Metrics of one epoch on the training and validation sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// 1-based epoch number.
    pub epoch: usize,
    pub train: BinaryMetrics,
    pub validation: BinaryMetrics,
}

/// A series that can be plotted against the epoch number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
    Auc,
    Loss,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Accuracy,
        Metric::Precision,
        Metric::Recall,
        Metric::Auc,
        Metric::Loss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::Auc => "auc",
            Metric::Loss => "loss",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Accuracy => "Accuracy",
            Metric::Precision => "Precision",
            Metric::Recall => "Recall",
            Metric::Auc => "AUC",
            Metric::Loss => "Loss",
        }
    }

    pub fn of(self, metrics: &BinaryMetrics) -> f64 {
        match self {
            Metric::Accuracy => metrics.accuracy,
            Metric::Precision => metrics.precision,
            Metric::Recall => metrics.recall,
            Metric::Auc => metrics.auc,
            Metric::Loss => metrics.loss,
        }
    }
}

/// Training and validation series of one fit, in epoch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub architecture: String,
    pub epochs: Vec<EpochRecord>,
    /// Epoch whose weights were restored at the end of training.
    pub best_epoch: Option<usize>,
    pub stopped_early: bool,
}

impl History {
    pub fn new(architecture: impl Into<String>) -> Self {
        Self {
            architecture: architecture.into(),
            epochs: Vec::new(),
            best_epoch: None,
            stopped_early: false,
        }
    }

    pub fn push(&mut self, record: EpochRecord) {
        self.epochs.push(record);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// `(train, validation)` values of `metric` for every epoch.
    pub fn series(&self, metric: Metric) -> (Vec<f64>, Vec<f64>) {
        self.epochs
            .iter()
            .map(|r| (metric.of(&r.train), metric.of(&r.validation)))
            .unzip()
    }

    /// Record of the epoch whose weights the model ended with.
    pub fn best(&self) -> Option<&EpochRecord> {
        let epoch = self.best_epoch?;
        self.epochs.iter().find(|r| r.epoch == epoch)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(loss: f64, accuracy: f64) -> BinaryMetrics {
        BinaryMetrics {
            loss,
            accuracy,
            ..BinaryMetrics::default()
        }
    }

    fn history() -> History {
        let mut history = History::new("dense");
        history.push(EpochRecord {
            epoch: 1,
            train: metrics(0.7, 0.5),
            validation: metrics(0.69, 0.55),
        });
        history.push(EpochRecord {
            epoch: 2,
            train: metrics(0.5, 0.8),
            validation: metrics(0.6, 0.7),
        });
        history.best_epoch = Some(2);
        history
    }

    #[test]
    fn series_follow_epoch_order() {
        let (train, val) = history().series(Metric::Loss);
        assert_eq!(train, vec![0.7, 0.5]);
        assert_eq!(val, vec![0.69, 0.6]);
    }

    #[test]
    fn best_returns_restored_epoch() {
        let h = history();
        assert_eq!(h.best().map(|r| r.epoch), Some(2));
        assert_eq!(History::new("lstm").best(), None);
    }

    #[test]
    fn saves_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        history().save(&path).unwrap();

        let loaded: History = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, history());
    }
}

//! # Veritas Trainer
//!
//! Training and model selection for the Veritas fake-news classifier.
//! Fits every candidate architecture with RMSprop and early stopping,
//! scores each on the held-out test set, persists the winner and checks
//! that the reloaded artifacts predict what the trained model predicted.

pub mod early_stop;
pub mod evaluate;
pub mod history;
pub mod loss;
pub mod metrics;
pub mod optim;
pub mod pipeline;
pub mod report;
pub mod trainer;

pub use early_stop::{EarlyStopping, StopDecision};
pub use evaluate::evaluate;
pub use history::{EpochRecord, History, Metric};
pub use metrics::{roc_auc, BinaryMetrics, ConfusionMatrix};
pub use optim::{ParamsRmsProp, RmsProp};
pub use pipeline::{
    select_winner, CandidateConfig, CandidateReport, Pipeline, PipelineConfig, PipelineReport,
    PreparedData,
};
pub use report::{CsvCurves, CurveRenderer, LogCurves};
pub use trainer::{TrainConfig, TrainedModel, Trainer};

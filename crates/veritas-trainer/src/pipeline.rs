//! # Training Pipeline
//!
//! `load -> split test -> fit vectorizer -> encode -> split validation ->
//! train candidates -> evaluate on test -> select winner -> persist -> probe`.
//!
//! Every stage is a function that takes its inputs by value or reference and
//! returns new values, so stages can be run and tested on their own.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use candle_core::Device;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use veritas_core::data::split::{random_split, stratified_split};
use veritas_core::{
    load_corpus, Architecture, ArtifactStore, Corpus, Document, EncodedDocument,
    LabelDistribution, ModelDescriptor, Partition, Predictor, SplitConfig, Vectorizer,
    VectorizerConfig, VeritasError,
};

use crate::evaluate::evaluate;
use crate::metrics::BinaryMetrics;
use crate::report::CurveRenderer;
use crate::trainer::{TrainConfig, TrainedModel, Trainer};

/// Sentence scored by the reloaded winner after persisting.
pub const DEFAULT_PROBE_TEXT: &str = "this is outrageous, trump is dead!";

/// Largest difference tolerated between in-memory and reloaded predictions.
const ROUND_TRIP_TOLERANCE: f32 = 1e-5;

pub const REPORT_FILE: &str = "report.json";

/// One architecture to train and how long to train it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    pub architecture: Architecture,
    pub epochs: usize,
}

impl CandidateConfig {
    pub fn new(architecture: Architecture, epochs: usize) -> Self {
        Self {
            architecture,
            epochs,
        }
    }
}

/// Everything the pipeline needs besides the dataset path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub split: SplitConfig,
    pub vectorizer: VectorizerConfig,
    pub training: TrainConfig,
    pub candidates: Vec<CandidateConfig>,
    pub probe_text: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            split: SplitConfig::default(),
            vectorizer: VectorizerConfig::default(),
            training: TrainConfig::default(),
            candidates: vec![
                CandidateConfig::new(Architecture::dense(), 30),
                CandidateConfig::new(Architecture::lstm(), 20),
            ],
            probe_text: DEFAULT_PROBE_TEXT.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config; missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> veritas_core::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_candidates(mut self, candidates: Vec<CandidateConfig>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Train every candidate for `epochs` epochs.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        for candidate in &mut self.candidates {
            candidate.epochs = epochs;
        }
        self
    }

    pub fn validate(&self) -> veritas_core::Result<()> {
        self.split.validate()?;
        self.vectorizer.validate()?;
        self.training.validate()?;

        if self.candidates.is_empty() {
            return Err(VeritasError::Configuration(
                "at least one candidate architecture is required".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for candidate in &self.candidates {
            candidate.architecture.validate()?;
            if candidate.epochs == 0 {
                return Err(VeritasError::Configuration(format!(
                    "{}: epochs must be positive",
                    candidate.architecture.name()
                )));
            }
            if !names.insert(candidate.architecture.name()) {
                return Err(VeritasError::Configuration(format!(
                    "architecture {} is listed more than once",
                    candidate.architecture.name()
                )));
            }
        }
        if self.probe_text.trim().is_empty() {
            return Err(VeritasError::Configuration(
                "probe_text must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stratified train/test split of the whole corpus.
pub fn split_corpus(corpus: Corpus, config: &SplitConfig) -> Result<Partition<Document>> {
    let partition = stratified_split(
        corpus.into_documents(),
        config.test_size,
        config.seed,
        |d: &Document| d.label,
    )?;
    info!(
        "train: {} | test: {}",
        LabelDistribution::from_labels(partition.train.iter().map(|d| d.label)),
        LabelDistribution::from_labels(partition.test.iter().map(|d| d.label))
    );
    Ok(partition)
}

/// Fit the vectorizer on training documents only.
pub fn fit_vectorizer(config: &VectorizerConfig, train: &[Document]) -> Result<Vectorizer> {
    Ok(Vectorizer::fit(
        config.clone(),
        train.iter().map(|d| d.text.as_str()),
    )?)
}

/// Hold out part of the encoded training set for early stopping.
pub fn split_validation(
    train: Vec<EncodedDocument>,
    config: &SplitConfig,
) -> Result<Partition<EncodedDocument>> {
    let partition = if config.stratify_validation {
        stratified_split(
            train,
            config.validation_size,
            config.validation_seed,
            |d: &EncodedDocument| d.label,
        )?
    } else {
        random_split(train, config.validation_size, config.validation_seed)?
    };
    info!(
        train = partition.train.len(),
        validation = partition.test.len(),
        stratified = config.stratify_validation,
        "validation split"
    );
    Ok(partition)
}

/// Encoded sets ready for training.
pub struct PreparedData {
    pub vectorizer: Vectorizer,
    pub train: Vec<EncodedDocument>,
    pub validation: Vec<EncodedDocument>,
    pub test: Vec<EncodedDocument>,
}

impl PreparedData {
    pub fn descriptor(&self, architecture: Architecture) -> ModelDescriptor {
        ModelDescriptor::new(
            architecture,
            self.vectorizer.num_ids(),
            self.vectorizer.max_len(),
        )
    }

    /// `(rows, max_len)` of the train, validation and test tensors.
    pub fn shapes(&self) -> [(usize, usize); 3] {
        let max_len = self.vectorizer.max_len();
        [
            (self.train.len(), max_len),
            (self.validation.len(), max_len),
            (self.test.len(), max_len),
        ]
    }
}

/// Outcome of one candidate on the held-out test set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub architecture: String,
    pub epochs_trained: usize,
    pub best_epoch: Option<usize>,
    pub stopped_early: bool,
    pub test: BinaryMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub candidates: Vec<CandidateReport>,
    pub winner: String,
    pub artifacts: PathBuf,
    pub probe_text: String,
    pub probe_probability: f32,
}

/// Index of the candidate with the highest test AUC; lower test loss breaks ties.
pub fn select_winner(reports: &[CandidateReport]) -> Option<usize> {
    reports
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.test
                .auc
                .total_cmp(&b.test.auc)
                .then_with(|| b.test.loss.total_cmp(&a.test.loss))
        })
        .map(|(idx, _)| idx)
}

pub struct Pipeline {
    config: PipelineConfig,
    device: Device,
    renderers: Vec<Box<dyn CurveRenderer>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, device: Device) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            device,
            renderers: Vec::new(),
        })
    }

    pub fn with_renderer(mut self, renderer: impl CurveRenderer + 'static) -> Self {
        self.renderers.push(Box::new(renderer));
        self
    }

    /// Load, split and encode a dataset.
    pub fn prepare<P: AsRef<Path>>(&self, data_path: P) -> Result<PreparedData> {
        let corpus = load_corpus(data_path.as_ref())
            .with_context(|| format!("failed to load {}", data_path.as_ref().display()))?;
        self.prepare_corpus(corpus)
    }

    pub fn prepare_corpus(&self, corpus: Corpus) -> Result<PreparedData> {
        let split = split_corpus(corpus, &self.config.split)?;
        let vectorizer = fit_vectorizer(&self.config.vectorizer, &split.train)?;

        let train = vectorizer.encode_documents(&split.train);
        let test = vectorizer.encode_documents(&split.test);
        let Partition {
            train,
            test: validation,
        } = split_validation(train, &self.config.split)?;

        let data = PreparedData {
            vectorizer,
            train,
            validation,
            test,
        };
        let [train, validation, test] = data.shapes();
        debug!(?train, ?validation, ?test, "encoded set shapes");
        Ok(data)
    }

    /// Train one candidate and score it on the test set.
    pub fn train_candidate(
        &self,
        candidate: &CandidateConfig,
        data: &PreparedData,
    ) -> Result<(TrainedModel, CandidateReport)> {
        let trainer = Trainer::new(self.config.training.clone(), self.device.clone());
        let trained = trainer.fit(
            data.descriptor(candidate.architecture.clone()),
            candidate.epochs,
            &data.train,
            &data.validation,
        )?;

        let test = evaluate(&trained.model, &data.test, self.config.training.batch_size)?;
        let report = CandidateReport {
            architecture: candidate.architecture.name().to_string(),
            epochs_trained: trained.history.len(),
            best_epoch: trained.history.best_epoch,
            stopped_early: trained.history.stopped_early,
            test,
        };
        info!("{} test - {}", report.architecture, test);
        Ok((trained, report))
    }

    /// Run every stage and leave the winner's artifacts in `out_dir`.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        data_path: P,
        out_dir: Q,
    ) -> Result<PipelineReport> {
        let data = self.prepare(data_path)?;
        self.run_prepared(data, out_dir)
    }

    pub fn run_prepared<Q: AsRef<Path>>(
        &self,
        data: PreparedData,
        out_dir: Q,
    ) -> Result<PipelineReport> {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;

        let mut models = Vec::with_capacity(self.config.candidates.len());
        let mut reports = Vec::with_capacity(self.config.candidates.len());
        for candidate in &self.config.candidates {
            let (trained, report) = self.train_candidate(candidate, &data)?;
            let name = candidate.architecture.name();

            trained
                .history
                .save(out_dir.join(format!("history-{}.json", name)))?;
            for renderer in &self.renderers {
                renderer
                    .render(&trained.history, name)
                    .with_context(|| format!("failed to render {} curves", name))?;
            }

            models.push(trained.model);
            reports.push(report);
        }

        let winner = select_winner(&reports).context("no candidate was trained")?;
        let model = models.swap_remove(winner);
        info!(
            architecture = %reports[winner].architecture,
            auc = reports[winner].test.auc,
            loss = reports[winner].test.loss,
            "selected winner"
        );

        let store = ArtifactStore::new(out_dir);
        store.save(&model, &data.vectorizer)?;

        let probe = &self.config.probe_text;
        let in_memory = model
            .predict_proba(&[data.vectorizer.encode(probe)])?
            .first()
            .copied()
            .context("model returned no prediction")?;
        let reloaded = Predictor::load(out_dir, &self.device)?.predict(probe)?;
        if (in_memory - reloaded).abs() > ROUND_TRIP_TOLERANCE {
            bail!(
                "reloaded model disagrees with the trained one on the probe: {} vs {}",
                in_memory,
                reloaded
            );
        }
        info!(
            "the model predicts this news to be fake with a {:.3} percent confidence: {:?}",
            reloaded * 100.0,
            probe
        );

        let report = PipelineReport {
            winner: reports[winner].architecture.clone(),
            candidates: reports,
            artifacts: out_dir.to_path_buf(),
            probe_text: probe.clone(),
            probe_probability: reloaded,
        };
        let report_path = out_dir.join(REPORT_FILE);
        fs::write(&report_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("failed to write {}", report_path.display()))?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, auc: f64, loss: f64) -> CandidateReport {
        CandidateReport {
            architecture: name.to_string(),
            epochs_trained: 1,
            best_epoch: Some(1),
            stopped_early: false,
            test: BinaryMetrics {
                auc,
                loss,
                ..BinaryMetrics::default()
            },
        }
    }

    #[test]
    fn winner_has_highest_auc() {
        let reports = [report("dense", 0.91, 0.2), report("lstm", 0.95, 0.4)];
        assert_eq!(select_winner(&reports), Some(1));
    }

    #[test]
    fn equal_auc_prefers_lower_loss() {
        let reports = [report("dense", 0.9, 0.2), report("lstm", 0.9, 0.4)];
        assert_eq!(select_winner(&reports), Some(0));
        assert_eq!(select_winner(&[]), None);
    }

    #[test]
    fn default_config_trains_both_architectures() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        let names: Vec<_> = config
            .candidates
            .iter()
            .map(|c| (c.architecture.name(), c.epochs))
            .collect();
        assert_eq!(names, vec![("dense", 30), ("lstm", 20)]);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(PipelineConfig::default()
            .with_candidates(vec![])
            .validate()
            .is_err());
        assert!(PipelineConfig::default().with_epochs(0).validate().is_err());
        assert!(PipelineConfig::default()
            .with_candidates(vec![
                CandidateConfig::new(Architecture::dense(), 1),
                CandidateConfig::new(Architecture::dense(), 2),
            ])
            .validate()
            .is_err());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "vectorizer": {"max_len": 50},
                "training": {"batch_size": 8},
                "candidates": [{"architecture": {"kind": "lstm"}, "epochs": 3}]
            }"#,
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.vectorizer.max_len, 50);
        assert_eq!(config.vectorizer.max_features, 10_000);
        assert_eq!(config.training.batch_size, 8);
        assert_eq!(config.training.patience, 15);
        assert_eq!(config.candidates.len(), 1);
        assert_eq!(config.candidates[0].architecture, Architecture::lstm());
        assert_eq!(config.probe_text, DEFAULT_PROBE_TEXT);
    }
}

//! # Model Trainer
//!
//! Mini-batch RMSprop on cross-entropy plus L2, one seeded shuffle per epoch,
//! early stopping on validation loss. The weights of the best validation
//! epoch are restored before the model is returned.

use anyhow::{bail, Result};
use candle_core::{Device, Tensor};
use candle_nn::Optimizer;
use oorandom::Rand64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use veritas_core::data::split::shuffle;
use veritas_core::{EncodedDocument, Label, ModelDescriptor, NewsClassifier};

use crate::early_stop::{EarlyStopping, StopDecision};
use crate::evaluate::evaluate;
use crate::history::{EpochRecord, History};
use crate::loss::binary_cross_entropy_with_logits;
use crate::metrics::BinaryMetrics;
use crate::optim::{ParamsRmsProp, RmsProp};

/// Optimizer and stopping settings shared by every candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub batch_size: usize,
    /// Epochs without validation-loss improvement before stopping.
    pub patience: usize,
    /// Smallest decrease of the validation loss that counts as improvement.
    pub min_delta: f64,
    pub learning_rate: f64,
    pub rho: f64,
    pub epsilon: f64,
    /// Seed of the per-epoch batch shuffle.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            patience: 15,
            min_delta: 0.0,
            learning_rate: 0.001,
            rho: 0.9,
            epsilon: 1e-7,
            seed: 1340,
        }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_min_delta(mut self, min_delta: f64) -> Self {
        self.min_delta = min_delta;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> veritas_core::Result<()> {
        let invalid = |msg: String| Err(veritas_core::VeritasError::Configuration(msg));
        if self.batch_size == 0 {
            return invalid("batch_size must be positive".to_string());
        }
        if self.patience == 0 {
            return invalid("patience must be positive".to_string());
        }
        if !(self.min_delta >= 0.0 && self.min_delta.is_finite()) {
            return invalid(format!("min_delta must be non-negative, got {}", self.min_delta));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return invalid(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(0.0..1.0).contains(&self.rho) {
            return invalid(format!("rho must be in [0, 1), got {}", self.rho));
        }
        if !(self.epsilon > 0.0) {
            return invalid(format!("epsilon must be positive, got {}", self.epsilon));
        }
        Ok(())
    }

    fn optimizer_params(&self) -> ParamsRmsProp {
        ParamsRmsProp {
            lr: self.learning_rate,
            rho: self.rho,
            eps: self.epsilon,
        }
    }
}

/// A fitted classifier and the history of its fit.
pub struct TrainedModel {
    pub model: NewsClassifier,
    pub history: History,
}

pub struct Trainer {
    config: TrainConfig,
    device: Device,
}

impl Trainer {
    pub fn new(config: TrainConfig, device: Device) -> Self {
        Self { config, device }
    }

    /// Train a fresh network described by `descriptor` for at most `epochs` epochs.
    pub fn fit(
        &self,
        descriptor: ModelDescriptor,
        epochs: usize,
        train: &[EncodedDocument],
        validation: &[EncodedDocument],
    ) -> Result<TrainedModel> {
        self.config.validate()?;
        if epochs == 0 {
            bail!("epochs must be positive");
        }
        if train.is_empty() || validation.is_empty() {
            bail!(
                "training needs non-empty train and validation sets (got {} and {})",
                train.len(),
                validation.len()
            );
        }

        let model = NewsClassifier::new(descriptor, &self.device)?;
        let arch = model.architecture().name();
        info!(
            architecture = arch,
            parameters = model.num_parameters(),
            train = train.len(),
            validation = validation.len(),
            epochs,
            "training"
        );

        let mut optimizer = RmsProp::new(model.trainable_vars(), self.config.optimizer_params())?;
        let mut rng = Rand64::new(u128::from(self.config.seed));
        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut stopper = EarlyStopping::new(self.config.patience, self.config.min_delta);
        let mut best_weights = None;
        let mut history = History::new(arch);

        for epoch in 1..=epochs {
            shuffle(&mut order, &mut rng);
            let train_metrics = self.train_epoch(&model, &mut optimizer, train, &order)?;
            let val_metrics = evaluate(&model, validation, self.config.batch_size)?;

            info!(
                "{} epoch {}/{} - train {} - val {}",
                arch, epoch, epochs, train_metrics, val_metrics
            );
            history.push(EpochRecord {
                epoch,
                train: train_metrics,
                validation: val_metrics,
            });

            match stopper.observe(epoch, val_metrics.loss) {
                StopDecision::Improved => {
                    best_weights = Some(model.snapshot()?);
                    debug!(epoch, val_loss = val_metrics.loss, "validation loss improved");
                }
                StopDecision::Wait { wait } => {
                    debug!(epoch, wait, "validation loss did not improve");
                }
                StopDecision::Stop => {
                    info!(
                        epoch,
                        patience = self.config.patience,
                        "early stopping"
                    );
                    history.stopped_early = true;
                    break;
                }
            }
        }

        if let Some(weights) = &best_weights {
            model.restore(weights)?;
        }
        history.best_epoch = stopper.best_epoch();
        if let Some(best) = history.best() {
            info!(
                architecture = arch,
                best_epoch = best.epoch,
                val_loss = best.validation.loss,
                "restored best weights"
            );
        }

        Ok(TrainedModel { model, history })
    }

    fn train_epoch(
        &self,
        model: &NewsClassifier,
        optimizer: &mut RmsProp,
        train: &[EncodedDocument],
        order: &[usize],
    ) -> Result<BinaryMetrics> {
        let mut probabilities = Vec::with_capacity(order.len());
        let mut labels: Vec<Label> = Vec::with_capacity(order.len());
        let mut loss_sum = 0.0f64;

        for batch in order.chunks(self.config.batch_size) {
            let rows: Vec<&[u32]> = batch.iter().map(|&i| train[i].ids.as_slice()).collect();
            let targets: Vec<f32> = batch.iter().map(|&i| train[i].label.as_target()).collect();
            labels.extend(batch.iter().map(|&i| train[i].label));

            let xs = model.ids_tensor(&rows)?;
            let ys = Tensor::from_vec(targets, batch.len(), model.device())?;
            let logits = model.forward_t(&xs, true)?;
            let loss = binary_cross_entropy_with_logits(&logits, &ys)?.add(&model.l2_penalty()?)?;
            optimizer.backward_step(&loss)?;

            loss_sum += f64::from(loss.to_scalar::<f32>()?) * batch.len() as f64;
            probabilities.extend(candle_nn::ops::sigmoid(&logits.detach())?.to_vec1::<f32>()?);
        }

        Ok(BinaryMetrics::compute(
            &probabilities,
            &labels,
            loss_sum / order.len() as f64,
        ))
    }
}

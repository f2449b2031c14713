//! # News Classifier
//!
//! Owns the variables of one network together with the descriptor needed to
//! rebuild it. Trainers mutate the variables through the optimizer; once
//! training is over the classifier is only read.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{ModuleT, VarBuilder, VarMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, VeritasError};
use crate::model::{Architecture, Network};

/// Bumped whenever [`ModelDescriptor`] or the variable naming changes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Rows per forward pass when scoring many sequences.
const PREDICT_BATCH: usize = 256;

/// Everything needed to rebuild a network before loading its weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub format_version: u32,
    pub architecture: Architecture,
    /// Embedding rows (vocabulary id space including padding).
    pub num_ids: usize,
    /// Length of every input sequence.
    pub max_len: usize,
}

impl ModelDescriptor {
    pub fn new(architecture: Architecture, num_ids: usize, max_len: usize) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            architecture,
            num_ids,
            max_len,
        }
    }
}

/// Copy of every variable, keyed by name.
#[derive(Debug, Clone)]
pub struct WeightSnapshot(HashMap<String, Tensor>);

/// CUDA device 0 when compiled with CUDA support, CPU otherwise.
pub fn default_device() -> Device {
    Device::cuda_if_available(0).unwrap_or(Device::Cpu)
}

/// A network plus its variables.
pub struct NewsClassifier {
    descriptor: ModelDescriptor,
    varmap: VarMap,
    network: Network,
    device: Device,
}

impl NewsClassifier {
    /// Build a freshly initialised classifier.
    pub fn new(descriptor: ModelDescriptor, device: &Device) -> Result<Self> {
        descriptor.architecture.validate()?;
        if descriptor.num_ids < 2 || descriptor.max_len == 0 {
            return Err(VeritasError::Configuration(format!(
                "invalid model input shape: num_ids={}, max_len={}",
                descriptor.num_ids, descriptor.max_len
            )));
        }

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let network = Network::new(
            &descriptor.architecture,
            descriptor.num_ids,
            descriptor.max_len,
            vb,
        )?;

        let classifier = Self {
            descriptor,
            varmap,
            network,
            device: device.clone(),
        };
        debug!(
            architecture = classifier.descriptor.architecture.name(),
            parameters = classifier.num_parameters(),
            "initialised classifier"
        );
        Ok(classifier)
    }

    /// Rebuild a classifier and fill it with weights from a safetensors file.
    pub fn load<P: AsRef<Path>>(descriptor: ModelDescriptor, weights: P, device: &Device) -> Result<Self> {
        let weights = weights.as_ref();
        if descriptor.format_version != MODEL_FORMAT_VERSION {
            return Err(VeritasError::Serialization(format!(
                "unsupported model format version {} (expected {})",
                descriptor.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if !weights.is_file() {
            return Err(VeritasError::Serialization(format!(
                "model weights not found at {}",
                weights.display()
            )));
        }

        let mut classifier = Self::new(descriptor, device)?;
        classifier.varmap.load(weights).map_err(|e| {
            VeritasError::Serialization(format!(
                "failed to load weights from {}: {}",
                weights.display(),
                e
            ))
        })?;
        Ok(classifier)
    }

    /// Write the variables as safetensors.
    pub fn save_weights<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.varmap.save(path).map_err(|e| {
            VeritasError::Serialization(format!(
                "failed to save weights to {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn architecture(&self) -> &Architecture {
        &self.descriptor.architecture
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn num_parameters(&self) -> usize {
        self.varmap
            .all_vars()
            .iter()
            .map(|v| v.elem_count())
            .sum()
    }

    /// Variables handed to an optimizer.
    pub fn trainable_vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Logits for a `[batch, max_len]` id tensor.
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        Ok(self.network.forward_t(xs, train)?)
    }

    /// Regularization term of the underlying network.
    pub fn l2_penalty(&self) -> Result<Tensor> {
        Ok(self.network.l2_penalty()?)
    }

    /// Stack id rows into a `[batch, max_len]` tensor, checking their length.
    pub fn ids_tensor<R: AsRef<[u32]>>(&self, rows: &[R]) -> Result<Tensor> {
        let max_len = self.descriptor.max_len;
        let mut flat = Vec::with_capacity(rows.len() * max_len);
        for row in rows {
            let row = row.as_ref();
            if row.len() != max_len {
                return Err(VeritasError::Model(format!(
                    "sequence length {} does not match model input length {}",
                    row.len(),
                    max_len
                )));
            }
            if let Some(&id) = row.iter().find(|&&id| id as usize >= self.descriptor.num_ids) {
                return Err(VeritasError::Model(format!(
                    "token id {} is outside the embedding table of {} rows",
                    id, self.descriptor.num_ids
                )));
            }
            flat.extend_from_slice(row);
        }
        Ok(Tensor::from_vec(flat, (rows.len(), max_len), &self.device)?)
    }

    /// Fake-news probability for each id row.
    pub fn predict_proba<R: AsRef<[u32]>>(&self, rows: &[R]) -> Result<Vec<f32>> {
        let mut probabilities = Vec::with_capacity(rows.len());
        for chunk in rows.chunks(PREDICT_BATCH) {
            let xs = self.ids_tensor(chunk)?;
            let logits = self.forward_t(&xs, false)?;
            let probs = candle_nn::ops::sigmoid(&logits)?;
            probabilities.extend(probs.to_vec1::<f32>()?);
        }
        Ok(probabilities)
    }

    /// Copy the current value of every variable.
    pub fn snapshot(&self) -> Result<WeightSnapshot> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| VeritasError::Model("variable map lock poisoned".to_string()))?;
        let mut weights = HashMap::with_capacity(data.len());
        for (name, var) in data.iter() {
            weights.insert(name.clone(), var.as_tensor().copy()?);
        }
        Ok(WeightSnapshot(weights))
    }

    /// Overwrite every variable from a snapshot taken on this classifier.
    pub fn restore(&self, snapshot: &WeightSnapshot) -> Result<()> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| VeritasError::Model("variable map lock poisoned".to_string()))?;
        for (name, var) in data.iter() {
            let value = snapshot.0.get(name).ok_or_else(|| {
                VeritasError::Model(format!("snapshot has no value for variable {}", name))
            })?;
            var.set(value)?;
        }
        Ok(())
    }
}

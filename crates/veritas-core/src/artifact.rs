//! # Artifact Store
//!
//! Persists a trained classifier and its fitted vectorizer under stable
//! file names so a later process can reload both without retraining.
//!
//! ```text
//! <dir>/
//!   model.safetensors   network weights
//!   model.json          architecture + input shape
//!   vectorizer.json     vocabulary + sequence settings
//! ```

use std::fs;
use std::path::PathBuf;

use candle_core::Device;
use tracing::info;

use crate::error::{Result, VeritasError};
use crate::model::{ModelDescriptor, NewsClassifier};
use crate::text::Vectorizer;

pub const MODEL_WEIGHTS_FILE: &str = "model.safetensors";
pub const MODEL_DESCRIPTOR_FILE: &str = "model.json";
pub const VECTORIZER_FILE: &str = "vectorizer.json";

/// Directory holding the persisted model and vectorizer.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(MODEL_WEIGHTS_FILE)
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.dir.join(MODEL_DESCRIPTOR_FILE)
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.dir.join(VECTORIZER_FILE)
    }

    /// Persist the model and the vectorizer it was trained with.
    pub fn save(&self, model: &NewsClassifier, vectorizer: &Vectorizer) -> Result<()> {
        let descriptor = model.descriptor();
        if descriptor.max_len != vectorizer.max_len() || descriptor.num_ids != vectorizer.num_ids() {
            return Err(VeritasError::Serialization(format!(
                "model expects {} ids of length {}, vectorizer produces {} ids of length {}",
                descriptor.num_ids,
                descriptor.max_len,
                vectorizer.num_ids(),
                vectorizer.max_len()
            )));
        }

        fs::create_dir_all(&self.dir).map_err(|e| {
            VeritasError::Serialization(format!(
                "failed to create artifact directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        self.save_model(model)?;
        vectorizer.save(self.vectorizer_path())?;

        info!(
            dir = %self.dir.display(),
            architecture = descriptor.architecture.name(),
            "saved model and vectorizer"
        );
        Ok(())
    }

    fn save_model(&self, model: &NewsClassifier) -> Result<()> {
        let json = serde_json::to_string_pretty(model.descriptor())?;
        fs::write(self.descriptor_path(), json).map_err(|e| {
            VeritasError::Serialization(format!(
                "failed to write {}: {}",
                self.descriptor_path().display(),
                e
            ))
        })?;
        model.save_weights(self.weights_path())
    }

    pub fn load_descriptor(&self) -> Result<ModelDescriptor> {
        let path = self.descriptor_path();
        let content = fs::read_to_string(&path).map_err(|e| {
            VeritasError::Serialization(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            VeritasError::Serialization(format!("malformed model descriptor {}: {}", path.display(), e))
        })
    }

    pub fn load_model(&self, device: &Device) -> Result<NewsClassifier> {
        let descriptor = self.load_descriptor()?;
        NewsClassifier::load(descriptor, self.weights_path(), device)
    }

    pub fn load_vectorizer(&self) -> Result<Vectorizer> {
        Vectorizer::load(self.vectorizer_path())
    }

    /// Reload both artifacts and check they fit together.
    pub fn load(&self, device: &Device) -> Result<(NewsClassifier, Vectorizer)> {
        let vectorizer = self.load_vectorizer()?;
        let model = self.load_model(device)?;

        let descriptor = model.descriptor();
        if descriptor.max_len != vectorizer.max_len() || descriptor.num_ids != vectorizer.num_ids() {
            return Err(VeritasError::Serialization(format!(
                "artifacts in {} disagree: model expects {} ids of length {}, vectorizer produces {} ids of length {}",
                self.dir.display(),
                descriptor.num_ids,
                descriptor.max_len,
                vectorizer.num_ids(),
                vectorizer.max_len()
            )));
        }

        info!(
            dir = %self.dir.display(),
            architecture = descriptor.architecture.name(),
            "loaded model and vectorizer"
        );
        Ok((model, vectorizer))
    }
}

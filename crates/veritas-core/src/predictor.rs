//! # Predictor
//!
//! Inference entry point: raw text in, fake-news probability out.
//! Encodes with the persisted vocabulary, pads to the model's input length
//! and runs one forward pass.

use std::path::Path;

use candle_core::Device;

use crate::artifact::ArtifactStore;
use crate::data::record::Label;
use crate::error::{Result, VeritasError};
use crate::model::NewsClassifier;
use crate::text::Vectorizer;

/// Default decision threshold on the fake probability.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Prediction for a single text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Probability in `[0, 1]` that the text is fake.
    pub probability: f32,
    pub label: Label,
}

/// A loaded model paired with the vectorizer it was trained with.
pub struct Predictor {
    model: NewsClassifier,
    vectorizer: Vectorizer,
    threshold: f32,
}

impl Predictor {
    pub fn new(model: NewsClassifier, vectorizer: Vectorizer) -> Result<Self> {
        if model.descriptor().max_len != vectorizer.max_len() {
            return Err(VeritasError::Configuration(format!(
                "model input length {} differs from vectorizer length {}",
                model.descriptor().max_len,
                vectorizer.max_len()
            )));
        }
        Ok(Self {
            model,
            vectorizer,
            threshold: DEFAULT_THRESHOLD,
        })
    }

    /// Load both artifacts from a directory written by [`ArtifactStore::save`].
    pub fn load<P: AsRef<Path>>(dir: P, device: &Device) -> Result<Self> {
        let (model, vectorizer) = ArtifactStore::new(dir.as_ref()).load(device)?;
        Self::new(model, vectorizer)
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn model(&self) -> &NewsClassifier {
        &self.model
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    /// Probability that `text` is fake.
    pub fn predict(&self, text: &str) -> Result<f32> {
        if text.trim().is_empty() {
            return Err(VeritasError::EmptyInput);
        }
        let ids = self.vectorizer.encode(text);
        let probs = self.model.predict_proba(&[ids])?;
        probs
            .first()
            .copied()
            .ok_or_else(|| VeritasError::Model("model returned no prediction".to_string()))
    }

    /// Probability and thresholded label for `text`.
    pub fn classify(&self, text: &str) -> Result<Prediction> {
        let probability = self.predict(text)?;
        Ok(Prediction {
            probability,
            label: Label::from_probability(probability, self.threshold),
        })
    }

    /// Probabilities for many texts, batched through the model.
    pub fn predict_many<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<f32>> {
        if texts.iter().any(|t| t.as_ref().trim().is_empty()) {
            return Err(VeritasError::EmptyInput);
        }
        let rows = self.vectorizer.encode_batch(texts.iter().map(AsRef::as_ref));
        self.model.predict_proba(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorizerConfig;
    use crate::model::{Architecture, DenseConfig, ModelDescriptor};

    fn predictor() -> Predictor {
        let vectorizer = Vectorizer::fit(
            VectorizerConfig::new().with_max_features(40).with_max_len(10),
            ["stocks rose on monday", "trump is dead says blog"],
        )
        .unwrap();
        let descriptor = ModelDescriptor::new(
            Architecture::Dense(DenseConfig {
                embedding_dim: 3,
                hidden_units: 2,
                ..DenseConfig::default()
            }),
            vectorizer.num_ids(),
            vectorizer.max_len(),
        );
        let model = NewsClassifier::new(descriptor, &Device::Cpu).unwrap();
        Predictor::new(model, vectorizer).unwrap()
    }

    #[test]
    fn predict_returns_probability() {
        let p = predictor().predict("this is outrageous, trump is dead!").unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn empty_text_is_rejected() {
        assert!(matches!(predictor().predict("   "), Err(VeritasError::EmptyInput)));
    }

    #[test]
    fn batch_matches_single() {
        let predictor = predictor();
        let texts = ["stocks rose", "aliens landed yesterday"];
        let batch = predictor.predict_many(&texts).unwrap();
        for (text, p) in texts.iter().zip(batch) {
            assert!((predictor.predict(text).unwrap() - p).abs() < 1e-6);
        }
    }

    #[test]
    fn classify_applies_threshold() {
        let predictor = predictor().with_threshold(0.0);
        assert_eq!(predictor.classify("anything").unwrap().label, Label::Fake);
    }
}

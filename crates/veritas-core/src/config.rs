//! # Data Preparation Configuration
//!
//! Split ratios, seeds and vectorizer limits. Every struct can be
//! overridden from JSON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::data::split::validate_ratio;
use crate::error::{Result, VeritasError};
use crate::text::sequence::Padding;
use crate::text::tokenizer::DEFAULT_FILTERS;

/// How rows are partitioned into train, test and validation sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of all rows held out for the final test evaluation.
    pub test_size: f64,
    /// Seed of the train/test split.
    pub seed: u64,
    /// Share of the training rows held out for early stopping.
    pub validation_size: f64,
    /// Seed of the train/validation split.
    pub validation_seed: u64,
    /// Stratify the train/validation split on the label as well.
    pub stratify_validation: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.3,
            seed: 104,
            validation_size: 0.3,
            validation_seed: 1340,
            stratify_validation: true,
        }
    }
}

impl SplitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_validation_size(mut self, validation_size: f64) -> Self {
        self.validation_size = validation_size;
        self
    }

    pub fn with_validation_seed(mut self, seed: u64) -> Self {
        self.validation_seed = seed;
        self
    }

    pub fn with_stratified_validation(mut self, enabled: bool) -> Self {
        self.stratify_validation = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_ratio("test_size", self.test_size)?;
        validate_ratio("validation_size", self.validation_size)
    }
}

/// Vocabulary and sequence-shaping parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Size of the id space: padding `0`, out-of-vocabulary `1`, and words
    /// `2..=max_features`.
    pub max_features: usize,
    /// Fixed length of every encoded sequence.
    pub max_len: usize,
    /// Lowercase text before splitting.
    pub lowercase: bool,
    /// Characters replaced by whitespace before splitting.
    pub filters: String,
    /// Where zeros are inserted for short sequences.
    pub padding: Padding,
    /// Which end is cut from long sequences.
    pub truncating: Padding,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 10_000,
            max_len: 200,
            lowercase: true,
            filters: DEFAULT_FILTERS.to_string(),
            padding: Padding::Pre,
            truncating: Padding::Pre,
        }
    }
}

impl VectorizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = filters.into();
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_truncating(mut self, truncating: Padding) -> Self {
        self.truncating = truncating;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_features < 2 {
            return Err(VeritasError::Configuration(format!(
                "max_features must be at least 2 (padding and out-of-vocabulary ids), got {}",
                self.max_features
            )));
        }
        if u32::try_from(self.max_features).is_err() {
            return Err(VeritasError::Configuration(format!(
                "max_features {} does not fit in a u32 id",
                self.max_features
            )));
        }
        if self.max_len == 0 {
            return Err(VeritasError::Configuration(
                "max_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

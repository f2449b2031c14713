//! # Text Vectorizer
//!
//! Turns raw news text into fixed-length id sequences. A vectorizer is
//! fitted exactly once, on training text, and is read-only afterwards:
//! validation, test and inference inputs all go through [`Vectorizer::encode`]
//! with the training vocabulary. There is no way to refit an existing
//! vectorizer.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::VectorizerConfig;
use crate::data::record::{Document, Label};
use crate::error::{Result, VeritasError};
use crate::text::sequence::pad_sequence;
use crate::text::tokenizer::TextTokenizer;
use crate::text::vocab::{Vocabulary, OOV_TOKEN};

/// Bumped whenever [`VectorizerState`] changes shape.
pub const VECTORIZER_FORMAT_VERSION: u32 = 1;

/// A document after vectorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub ids: Vec<u32>,
    pub label: Label,
}

/// Fitted tokenizer + vocabulary + sequence shape.
#[derive(Debug, Clone)]
pub struct Vectorizer {
    config: VectorizerConfig,
    tokenizer: TextTokenizer,
    vocab: Vocabulary,
}

/// Serialized form of a fitted [`Vectorizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerState {
    pub format_version: u32,
    pub config: VectorizerConfig,
    pub unique_tokens: usize,
    /// Retained words in rank order; word `i` has id `i + 2`.
    pub words: Vec<String>,
}

impl Vectorizer {
    /// Fit a vectorizer on training texts.
    pub fn fit<'a, I>(config: VectorizerConfig, texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        config.validate()?;
        let tokenizer = TextTokenizer::new(&config.filters, config.lowercase)?;
        let vocab = Vocabulary::fit(
            texts.into_iter().map(|t| tokenizer.tokenize(t)),
            config.max_features,
        )?;

        info!(
            unique_tokens = vocab.unique_tokens(),
            retained = vocab.words().len(),
            max_len = config.max_len,
            "fitted vectorizer on training text"
        );

        Ok(Self {
            config,
            tokenizer,
            vocab,
        })
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn max_len(&self) -> usize {
        self.config.max_len
    }

    /// Rows of the embedding table fed by this vectorizer.
    pub fn num_ids(&self) -> usize {
        self.vocab.num_ids()
    }

    /// Token ids of a text without padding or truncation.
    pub fn text_to_ids(&self, text: &str) -> Vec<u32> {
        self.tokenizer
            .tokenize(text)
            .iter()
            .map(|token| self.vocab.id(token))
            .collect()
    }

    /// Fixed-length id sequence of a text.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        pad_sequence(
            &self.text_to_ids(text),
            self.config.max_len,
            self.config.padding,
            self.config.truncating,
        )
    }

    pub fn encode_batch<'a, I>(&self, texts: I) -> Vec<Vec<u32>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().map(|t| self.encode(t)).collect()
    }

    /// Encode labeled documents, keeping their labels.
    pub fn encode_documents(&self, documents: &[Document]) -> Vec<EncodedDocument> {
        documents
            .iter()
            .map(|d| EncodedDocument {
                ids: self.encode(&d.text),
                label: d.label,
            })
            .collect()
    }

    /// Map ids back to tokens. Unknown ids decode as the OOV marker.
    pub fn decode(&self, ids: &[u32]) -> Vec<&str> {
        ids.iter()
            .map(|&id| self.vocab.token(id).unwrap_or(OOV_TOKEN))
            .collect()
    }

    pub fn to_state(&self) -> VectorizerState {
        VectorizerState {
            format_version: VECTORIZER_FORMAT_VERSION,
            config: self.config.clone(),
            unique_tokens: self.vocab.unique_tokens(),
            words: self.vocab.words().to_vec(),
        }
    }

    pub fn from_state(state: VectorizerState) -> Result<Self> {
        if state.format_version != VECTORIZER_FORMAT_VERSION {
            return Err(VeritasError::Serialization(format!(
                "unsupported vectorizer format version {} (expected {})",
                state.format_version, VECTORIZER_FORMAT_VERSION
            )));
        }
        state
            .config
            .validate()
            .map_err(|e| VeritasError::Serialization(format!("stored vectorizer config: {}", e)))?;

        let tokenizer = TextTokenizer::new(&state.config.filters, state.config.lowercase)?;
        let vocab = Vocabulary::from_words(
            state.words,
            state.config.max_features,
            state.unique_tokens,
        )?;

        Ok(Self {
            config: state.config,
            tokenizer,
            vocab,
        })
    }

    /// Write the fitted state as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_state())?;
        fs::write(path, json).map_err(|e| {
            VeritasError::Serialization(format!(
                "failed to write vectorizer to {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Read a vectorizer previously written by [`Vectorizer::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VeritasError::Serialization(format!(
                "failed to read vectorizer from {}: {}",
                path.display(),
                e
            ))
        })?;
        let state: VectorizerState = serde_json::from_str(&content).map_err(|e| {
            VeritasError::Serialization(format!(
                "malformed vectorizer file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_state(state)
    }
}

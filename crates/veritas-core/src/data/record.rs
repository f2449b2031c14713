//! # Document Records
//!
//! The in-memory shape of the dataset after loading: one merged text field
//! and a binary label per row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VeritasError};

/// Binary news label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    /// Genuine news (`0`).
    Real,
    /// Fabricated news (`1`).
    Fake,
}

impl Label {
    /// All labels in id order.
    pub const ALL: [Label; 2] = [Label::Real, Label::Fake];

    /// Numeric id of the label (`0` real, `1` fake).
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Real => 0,
            Label::Fake => 1,
        }
    }

    /// Training target for binary cross-entropy.
    pub fn as_target(self) -> f32 {
        f32::from(self.as_u8())
    }

    /// Label predicted by a probability at the given threshold.
    pub fn from_probability(probability: f32, threshold: f32) -> Self {
        if probability >= threshold {
            Label::Fake
        } else {
            Label::Real
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = VeritasError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Label::Real),
            1 => Ok(Label::Fake),
            other => Err(VeritasError::DataFormat(format!(
                "label must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.as_u8()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Real => write!(f, "real"),
            Label::Fake => write!(f, "fake"),
        }
    }
}

/// A single labeled news article: title and body already merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub label: Label,
}

impl Document {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Per-label row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDistribution {
    pub real: usize,
    pub fake: usize,
}

impl LabelDistribution {
    /// Count labels over any iterator of labels.
    pub fn from_labels<I: IntoIterator<Item = Label>>(labels: I) -> Self {
        let mut dist = Self::default();
        for label in labels {
            match label {
                Label::Real => dist.real += 1,
                Label::Fake => dist.fake += 1,
            }
        }
        dist
    }

    pub fn total(&self) -> usize {
        self.real + self.fake
    }

    pub fn count(&self, label: Label) -> usize {
        match label {
            Label::Real => self.real,
            Label::Fake => self.fake,
        }
    }

    /// Share of fake rows, `0.0` for an empty set.
    pub fn fake_ratio(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.fake as f64 / self.total() as f64
    }
}

impl fmt::Display for LabelDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows ({} real, {} fake, {:.1}% fake)",
            self.total(),
            self.real,
            self.fake,
            self.fake_ratio() * 100.0
        )
    }
}

/// The loaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn label_distribution(&self) -> LabelDistribution {
        LabelDistribution::from_labels(self.documents.iter().map(|d| d.label))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.text.as_str())
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

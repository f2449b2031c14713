//! # Veritas Core
//!
//! Data preparation and inference for the Veritas fake-news classifier:
//! dataset loading, seeded stratified splits, vocabulary fitting and
//! sequence encoding, the dense and LSTM architectures, and artifact
//! persistence.
//!
//! ## Quick Start
//!
//! ```rust
//! use veritas_core::config::VectorizerConfig;
//! use veritas_core::text::Vectorizer;
//!
//! let vectorizer = Vectorizer::fit(
//!     VectorizerConfig::new().with_max_len(8),
//!     ["Senate passes budget bill", "Trump is dead, says blog"],
//! )
//! .unwrap();
//!
//! let ids = vectorizer.encode("this is outrageous, trump is dead!");
//! assert_eq!(ids.len(), 8);
//! ```
pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod predictor;
pub mod text;

// Re-export primary API
pub use artifact::ArtifactStore;
pub use config::{SplitConfig, VectorizerConfig};
pub use data::{load_corpus, Corpus, Document, Label, LabelDistribution, Partition};
pub use error::{Result, VeritasError};
pub use model::{default_device, Architecture, ModelDescriptor, NewsClassifier};
pub use predictor::{Prediction, Predictor};
pub use text::{EncodedDocument, Padding, Vectorizer};

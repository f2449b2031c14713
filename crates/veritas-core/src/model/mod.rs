//! # Classifier Architectures
//!
//! Two interchangeable networks share one contract: a `[batch, max_len]`
//! tensor of `u32` ids in, one logit per row out. The sigmoid of that logit
//! is the probability that the article is fake.
//!
//! - [`DenseNet`]: embedding, flatten, ReLU dense layer with L2, dropout, output
//! - [`LstmNet`]: embedding, input dropout, LSTM with L2 on the input kernel, output

pub mod classifier;
pub mod dense;
pub mod recurrent;

use candle_core::{Result as CandleResult, Tensor};
use candle_nn::{ModuleT, VarBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VeritasError};

pub use classifier::{default_device, ModelDescriptor, NewsClassifier, WeightSnapshot};
pub use dense::{DenseConfig, DenseNet};
pub use recurrent::{LstmConfig, LstmNet};

/// Architecture descriptor stored alongside the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Architecture {
    Dense(DenseConfig),
    Lstm(LstmConfig),
}

impl Architecture {
    pub fn dense() -> Self {
        Architecture::Dense(DenseConfig::default())
    }

    pub fn lstm() -> Self {
        Architecture::Lstm(LstmConfig::default())
    }

    /// Short stable name used in logs and artifact file names.
    pub fn name(&self) -> &'static str {
        match self {
            Architecture::Dense(_) => "dense",
            Architecture::Lstm(_) => "lstm",
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (embedding_dim, hidden_units, dropout, l2) = match self {
            Architecture::Dense(c) => (c.embedding_dim, c.hidden_units, c.dropout, c.l2),
            Architecture::Lstm(c) => (c.embedding_dim, c.hidden_units, c.dropout, c.l2),
        };
        let name = self.name();

        if embedding_dim == 0 || hidden_units == 0 {
            return Err(VeritasError::Configuration(format!(
                "{}: embedding_dim and hidden_units must be positive",
                name
            )));
        }
        if !(0.0..1.0).contains(&dropout) {
            return Err(VeritasError::Configuration(format!(
                "{}: dropout must be in [0, 1), got {}",
                name, dropout
            )));
        }
        if !(l2 >= 0.0 && l2.is_finite()) {
            return Err(VeritasError::Configuration(format!(
                "{}: l2 must be a non-negative number, got {}",
                name, l2
            )));
        }
        Ok(())
    }
}

/// Instantiated network of either architecture.
pub enum Network {
    Dense(DenseNet),
    Lstm(LstmNet),
}

impl Network {
    /// Build the layers of `architecture`, creating or loading variables through `vb`.
    pub fn new(
        architecture: &Architecture,
        num_ids: usize,
        max_len: usize,
        vb: VarBuilder,
    ) -> CandleResult<Self> {
        Ok(match architecture {
            Architecture::Dense(cfg) => Network::Dense(DenseNet::new(cfg, num_ids, max_len, vb)?),
            Architecture::Lstm(cfg) => Network::Lstm(LstmNet::new(cfg, num_ids, vb)?),
        })
    }

    /// Regularization term added to the training loss.
    pub fn l2_penalty(&self) -> CandleResult<Tensor> {
        match self {
            Network::Dense(net) => net.l2_penalty(),
            Network::Lstm(net) => net.l2_penalty(),
        }
    }
}

impl ModuleT for Network {
    fn forward_t(&self, xs: &Tensor, train: bool) -> CandleResult<Tensor> {
        match self {
            Network::Dense(net) => net.forward_t(xs, train),
            Network::Lstm(net) => net.forward_t(xs, train),
        }
    }
}

/// `coefficient * sum(w^2)`, the Keras-style kernel regularizer.
pub(crate) fn l2_term(weights: &Tensor, coefficient: f64) -> CandleResult<Tensor> {
    weights.sqr()?.sum_all()?.affine(coefficient, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architecture_json_is_tagged() {
        let json = serde_json::to_value(Architecture::dense()).unwrap();
        assert_eq!(json["kind"], "dense");
        assert_eq!(json["hidden_units"], 24);

        let arch: Architecture =
            serde_json::from_str(r#"{"kind":"lstm","hidden_units":8}"#).unwrap();
        match arch {
            Architecture::Lstm(cfg) => {
                assert_eq!(cfg.hidden_units, 8);
                assert_eq!(cfg.embedding_dim, 100);
            }
            other => panic!("unexpected architecture {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_bad_dropout() {
        let arch = Architecture::Dense(DenseConfig {
            dropout: 1.0,
            ..DenseConfig::default()
        });
        assert!(matches!(arch.validate(), Err(VeritasError::Configuration(_))));
        assert!(Architecture::lstm().validate().is_ok());
    }
}

use candle_core::{Result, Tensor};
use candle_nn::{Dropout, Embedding, Init, Linear, Module, ModuleT, VarBuilder};
use serde::{Deserialize, Serialize};

use crate::model::l2_term;

/// Hyperparameters of the embedding + dense network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseConfig {
    pub embedding_dim: usize,
    pub hidden_units: usize,
    /// L2 coefficient on the hidden layer kernel.
    pub l2: f64,
    pub dropout: f32,
}

impl Default for DenseConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 100,
            hidden_units: 24,
            l2: 0.005,
            dropout: 0.5,
        }
    }
}

/// Embedding -> flatten -> ReLU dense -> dropout -> single logit.
pub struct DenseNet {
    embedding: Embedding,
    hidden: Linear,
    dropout: Dropout,
    output: Linear,
    l2: f64,
}

impl DenseNet {
    pub fn new(cfg: &DenseConfig, num_ids: usize, max_len: usize, vb: VarBuilder) -> Result<Self> {
        let embedding = uniform_embedding(num_ids, cfg.embedding_dim, vb.pp("embedding"))?;
        let hidden = candle_nn::linear(max_len * cfg.embedding_dim, cfg.hidden_units, vb.pp("hidden"))?;
        let output = candle_nn::linear(cfg.hidden_units, 1, vb.pp("output"))?;

        Ok(Self {
            embedding,
            hidden,
            dropout: Dropout::new(cfg.dropout),
            output,
            l2: cfg.l2,
        })
    }

    pub fn l2_penalty(&self) -> Result<Tensor> {
        l2_term(self.hidden.weight(), self.l2)
    }
}

impl ModuleT for DenseNet {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let xs = self.embedding.forward(xs)?.flatten_from(1)?;
        let xs = self.hidden.forward(&xs)?.relu()?;
        let xs = self.dropout.forward_t(&xs, train)?;
        self.output.forward(&xs)?.squeeze(1)
    }
}

/// Embedding table initialised uniformly in `[-0.05, 0.05]`.
pub(crate) fn uniform_embedding(num_ids: usize, dim: usize, vb: VarBuilder) -> Result<Embedding> {
    let weights = vb.get_with_hints(
        (num_ids, dim),
        "weight",
        Init::Uniform {
            lo: -0.05,
            up: 0.05,
        },
    )?;
    Ok(Embedding::new(weights, dim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn forward_yields_one_logit_per_row() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let cfg = DenseConfig {
            embedding_dim: 4,
            hidden_units: 3,
            ..DenseConfig::default()
        };
        let net = DenseNet::new(&cfg, 11, 5, vb).unwrap();

        let xs = Tensor::from_vec(vec![0u32, 0, 1, 2, 3, 4, 5, 6, 7, 10], (2, 5), &Device::Cpu).unwrap();
        let logits = net.forward_t(&xs, false).unwrap();
        assert_eq!(logits.dims(), &[2]);

        let penalty = net.l2_penalty().unwrap().to_scalar::<f32>().unwrap();
        assert!(penalty > 0.0);
    }

    #[test]
    fn inference_is_deterministic() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let net = DenseNet::new(&DenseConfig::default(), 20, 3, vb).unwrap();
        let xs = Tensor::from_vec(vec![1u32, 2, 3], (1, 3), &Device::Cpu).unwrap();

        let a = net.forward_t(&xs, false).unwrap().to_vec1::<f32>().unwrap();
        let b = net.forward_t(&xs, false).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(a, b);
    }
}

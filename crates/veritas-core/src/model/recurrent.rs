use candle_core::{Result, Tensor};
use candle_nn::rnn::{LSTMConfig, LSTM};
use candle_nn::{Dropout, Embedding, Linear, Module, ModuleT, VarBuilder, RNN};
use serde::{Deserialize, Serialize};

use crate::model::dense::uniform_embedding;
use crate::model::l2_term;

/// Hyperparameters of the embedding + LSTM network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstmConfig {
    pub embedding_dim: usize,
    pub hidden_units: usize,
    /// Dropout applied to the LSTM inputs at every step.
    pub dropout: f32,
    /// L2 coefficient on the LSTM input kernel.
    pub l2: f64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 100,
            hidden_units: 32,
            dropout: 0.1,
            l2: 0.01,
        }
    }
}

/// Embedding -> LSTM (last hidden state) -> single logit.
pub struct LstmNet {
    embedding: Embedding,
    input_dropout: Dropout,
    lstm: LSTM,
    input_kernel: Tensor,
    output: Linear,
    l2: f64,
}

impl LstmNet {
    pub fn new(cfg: &LstmConfig, num_ids: usize, vb: VarBuilder) -> Result<Self> {
        let embedding = uniform_embedding(num_ids, cfg.embedding_dim, vb.pp("embedding"))?;

        let lstm_vb = vb.pp("lstm");
        let lstm = candle_nn::lstm(
            cfg.embedding_dim,
            cfg.hidden_units,
            LSTMConfig::default(),
            lstm_vb.clone(),
        )?;
        // Same variable the LSTM holds, fetched again for the regularizer.
        let input_kernel = lstm_vb.get((4 * cfg.hidden_units, cfg.embedding_dim), "weight_ih_l0")?;

        let output = candle_nn::linear(cfg.hidden_units, 1, vb.pp("output"))?;

        Ok(Self {
            embedding,
            input_dropout: Dropout::new(cfg.dropout),
            lstm,
            input_kernel,
            output,
            l2: cfg.l2,
        })
    }

    pub fn l2_penalty(&self) -> Result<Tensor> {
        l2_term(&self.input_kernel, self.l2)
    }
}

impl ModuleT for LstmNet {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let xs = self.embedding.forward(xs)?;
        let xs = self.input_dropout.forward_t(&xs, train)?;
        let states = self.lstm.seq(&xs)?;
        let last = states
            .last()
            .ok_or_else(|| candle_core::Error::Msg("LSTM received an empty sequence".into()))?;
        self.output.forward(last.h())?.squeeze(1)
    }
}

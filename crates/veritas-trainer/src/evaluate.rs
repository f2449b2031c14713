//! Scoring a classifier on a labeled set.

use anyhow::{bail, Result};
use candle_core::Tensor;
use veritas_core::{EncodedDocument, Label, NewsClassifier};

use crate::loss::binary_cross_entropy_with_logits;
use crate::metrics::BinaryMetrics;

/// Metrics of `model` on `set` in inference mode. The model is not modified.
///
/// The reported loss is the mean cross-entropy plus the regularization term,
/// the same quantity the trainer minimizes.
pub fn evaluate(
    model: &NewsClassifier,
    set: &[EncodedDocument],
    batch_size: usize,
) -> Result<BinaryMetrics> {
    if set.is_empty() {
        bail!("cannot evaluate on an empty set");
    }
    if batch_size == 0 {
        bail!("batch_size must be positive");
    }

    let mut probabilities = Vec::with_capacity(set.len());
    let mut loss_sum = 0.0f64;

    for batch in set.chunks(batch_size) {
        let rows: Vec<&[u32]> = batch.iter().map(|d| d.ids.as_slice()).collect();
        let targets: Vec<f32> = batch.iter().map(|d| d.label.as_target()).collect();

        let xs = model.ids_tensor(&rows)?;
        let ys = Tensor::from_vec(targets, batch.len(), model.device())?;
        let logits = model.forward_t(&xs, false)?;

        let loss = binary_cross_entropy_with_logits(&logits, &ys)?.to_scalar::<f32>()?;
        loss_sum += f64::from(loss) * batch.len() as f64;
        probabilities.extend(candle_nn::ops::sigmoid(&logits)?.to_vec1::<f32>()?);
    }

    let penalty = f64::from(model.l2_penalty()?.to_scalar::<f32>()?);
    let labels: Vec<Label> = set.iter().map(|d| d.label).collect();
    let loss = loss_sum / set.len() as f64 + penalty;

    Ok(BinaryMetrics::compute(&probabilities, &labels, loss))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use veritas_core::model::{Architecture, DenseConfig};
    use veritas_core::ModelDescriptor;

    fn model() -> NewsClassifier {
        let arch = Architecture::Dense(DenseConfig {
            embedding_dim: 4,
            hidden_units: 3,
            ..DenseConfig::default()
        });
        NewsClassifier::new(ModelDescriptor::new(arch, 10, 5), &Device::Cpu).unwrap()
    }

    fn set() -> Vec<EncodedDocument> {
        (0..7)
            .map(|i| EncodedDocument {
                ids: vec![0, 0, 2, (i % 8) + 2, 9],
                label: if i % 2 == 0 { Label::Fake } else { Label::Real },
            })
            .collect()
    }

    #[test]
    fn batch_size_does_not_change_the_result() {
        let model = model();
        let a = evaluate(&model, &set(), 2).unwrap();
        let b = evaluate(&model, &set(), 64).unwrap();
        assert!((a.loss - b.loss).abs() < 1e-5);
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.auc, b.auc);
    }

    #[test]
    fn evaluation_leaves_weights_untouched() {
        let model = model();
        let rows = vec![vec![0u32, 0, 2, 3, 9]];
        let before = model.predict_proba(&rows).unwrap();
        evaluate(&model, &set(), 3).unwrap();
        assert_eq!(model.predict_proba(&rows).unwrap(), before);
    }

    #[test]
    fn empty_set_is_an_error() {
        assert!(evaluate(&model(), &[], 4).is_err());
    }

    #[test]
    fn wrong_sequence_length_is_an_error() {
        let bad = vec![EncodedDocument {
            ids: vec![2, 3],
            label: Label::Real,
        }];
        assert!(evaluate(&model(), &bad, 4).is_err());
    }
}

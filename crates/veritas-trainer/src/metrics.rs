//! # Binary Classification Metrics
//!
//! Accuracy, precision and recall at a fixed decision threshold, plus
//! threshold-free ROC AUC. The positive class is [`Label::Fake`].

use std::fmt;

use serde::{Deserialize, Serialize};
use veritas_core::Label;

/// Decision threshold used for accuracy, precision and recall.
pub const THRESHOLD: f32 = 0.5;

/// Confusion matrix with fake as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_probabilities(probabilities: &[f32], labels: &[Label], threshold: f32) -> Self {
        let mut matrix = Self::default();
        for (&p, &truth) in probabilities.iter().zip(labels) {
            match (Label::from_probability(p, threshold), truth) {
                (Label::Fake, Label::Fake) => matrix.tp += 1,
                (Label::Real, Label::Real) => matrix.tn += 1,
                (Label::Fake, Label::Real) => matrix.fp += 1,
                (Label::Real, Label::Fake) => matrix.fn_ += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        return 0.0;
    }
    num as f64 / denom as f64
}

/// Area under the ROC curve by the trapezoidal rule.
///
/// Equal scores are swept together, so ties count half. Returns `0.5` when
/// only one class is present.
pub fn roc_auc(probabilities: &[f32], labels: &[Label]) -> f64 {
    let mut pairs: Vec<(f32, Label)> = probabilities
        .iter()
        .copied()
        .zip(labels.iter().copied())
        .collect();
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let n_pos = pairs.iter().filter(|(_, l)| *l == Label::Fake).count() as f64;
    let n_neg = pairs.len() as f64 - n_pos;
    if n_pos == 0.0 || n_neg == 0.0 {
        return 0.5;
    }

    let (mut tp, mut fp) = (0.0f64, 0.0f64);
    let (mut tpr_prev, mut fpr_prev) = (0.0f64, 0.0f64);
    let mut auc = 0.0;

    let mut i = 0;
    while i < pairs.len() {
        let score = pairs[i].0;
        while i < pairs.len() && pairs[i].0 == score {
            match pairs[i].1 {
                Label::Fake => tp += 1.0,
                Label::Real => fp += 1.0,
            }
            i += 1;
        }
        let (tpr, fpr) = (tp / n_pos, fp / n_neg);
        auc += (fpr - fpr_prev) * (tpr + tpr_prev) / 2.0;
        tpr_prev = tpr;
        fpr_prev = fpr;
    }

    auc
}

/// Aggregate metrics of one pass over a labeled set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub loss: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub auc: f64,
}

impl BinaryMetrics {
    pub fn compute(probabilities: &[f32], labels: &[Label], loss: f64) -> Self {
        let cm = ConfusionMatrix::from_probabilities(probabilities, labels, THRESHOLD);
        Self {
            loss,
            accuracy: cm.accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            auc: roc_auc(probabilities, labels),
        }
    }
}

impl fmt::Display for BinaryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loss: {:.4} - acc: {:.4} - precision: {:.4} - recall: {:.4} - auc: {:.4}",
            self.loss, self.accuracy, self.precision, self.recall, self.auc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use veritas_core::Label::{Fake, Real};

    #[test]
    fn confusion_matrix_counts() {
        let cm = ConfusionMatrix::from_probabilities(
            &[0.9, 0.2, 0.7, 0.4, 0.6],
            &[Fake, Real, Real, Fake, Fake],
            0.5,
        );
        assert_eq!((cm.tp, cm.tn, cm.fp, cm.fn_), (2, 1, 1, 1));
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn perfect_ranking_has_auc_one() {
        let auc = roc_auc(&[0.9, 0.8, 0.3, 0.1], &[Fake, Fake, Real, Real]);
        assert!((auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverted_ranking_has_auc_zero() {
        let auc = roc_auc(&[0.1, 0.2, 0.8, 0.9], &[Fake, Fake, Real, Real]);
        assert!(auc.abs() < 1e-12);
    }

    #[test]
    fn constant_scores_have_auc_half() {
        let auc = roc_auc(&[0.5; 4], &[Fake, Real, Fake, Real]);
        assert!((auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mixed_ranking_matches_pair_count() {
        // Pairs (pos, neg): 0.9>0.4, 0.9>0.2, 0.3<0.4, 0.3>0.2 -> 3 of 4.
        let auc = roc_auc(&[0.9, 0.4, 0.3, 0.2], &[Fake, Real, Fake, Real]);
        assert!((auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn single_class_auc_is_half() {
        assert_eq!(roc_auc(&[0.2, 0.9], &[Real, Real]), 0.5);
    }

    #[test]
    fn empty_denominators_are_zero() {
        let metrics = BinaryMetrics::compute(&[0.1, 0.2], &[Real, Real], 0.3);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.loss, 0.3);
    }
}

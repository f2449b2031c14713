//! Early stopping on a monitored loss.

/// Outcome of observing one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    /// New best value; the caller should snapshot the weights.
    Improved,
    /// No improvement yet, `wait` epochs since the last best.
    Wait { wait: usize },
    /// Patience exhausted.
    Stop,
}

/// Halts training once the monitored value has not improved by more than
/// `min_delta` for `patience` consecutive epochs.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    best: Option<f64>,
    best_epoch: Option<usize>,
    wait: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta: min_delta.abs(),
            best: None,
            best_epoch: None,
            wait: 0,
        }
    }

    /// Record the monitored value of `epoch` (lower is better).
    pub fn observe(&mut self, epoch: usize, value: f64) -> StopDecision {
        let improved = value.is_finite()
            && match self.best {
                None => true,
                Some(best) => value < best - self.min_delta,
            };

        if improved {
            self.best = Some(value);
            self.best_epoch = Some(epoch);
            self.wait = 0;
            return StopDecision::Improved;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            StopDecision::Stop
        } else {
            StopDecision::Wait { wait: self.wait }
        }
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_after_patience_epochs_without_improvement() {
        let mut stop = EarlyStopping::new(2, 0.0);
        assert_eq!(stop.observe(1, 1.0), StopDecision::Improved);
        assert_eq!(stop.observe(2, 0.8), StopDecision::Improved);
        assert_eq!(stop.observe(3, 0.9), StopDecision::Wait { wait: 1 });
        assert_eq!(stop.observe(4, 0.85), StopDecision::Stop);
        assert_eq!(stop.best_epoch(), Some(2));
        assert_eq!(stop.best(), Some(0.8));
    }

    #[test]
    fn improvement_resets_wait() {
        let mut stop = EarlyStopping::new(2, 0.0);
        stop.observe(1, 1.0);
        assert_eq!(stop.observe(2, 1.1), StopDecision::Wait { wait: 1 });
        assert_eq!(stop.observe(3, 0.5), StopDecision::Improved);
        assert_eq!(stop.observe(4, 0.6), StopDecision::Wait { wait: 1 });
    }

    #[test]
    fn min_delta_requires_a_real_gain() {
        let mut stop = EarlyStopping::new(5, 0.1);
        stop.observe(1, 1.0);
        assert_eq!(stop.observe(2, 0.95), StopDecision::Wait { wait: 1 });
        assert_eq!(stop.observe(3, 0.85), StopDecision::Improved);
    }

    #[test]
    fn nan_never_improves() {
        let mut stop = EarlyStopping::new(1, 0.0);
        assert_eq!(stop.observe(1, f64::NAN), StopDecision::Stop);
        assert_eq!(stop.best_epoch(), None);
    }
}

//! Per-epoch training metrics and the early-stopping policy

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Clip bound keeping the loss proxy away from log(0)
const LOSS_EPSILON: f64 = 1e-10;

/// One snapshot per completed epoch, averaged over the epoch's batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Metrics of a single batch, before epoch averaging
#[derive(Debug, Clone, Copy)]
pub struct BatchMetrics {
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Fraction of matching hard labels
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Negative log-likelihood proxy computed from *binarized* predictions.
///
/// The hard 0/1 predictions are clipped to `[1e-10, 1 - 1e-10]` before the
/// log, so each miss contributes ~23 nats and each hit ~0. This is not a
/// true probability log-loss; the semantics of the system being
/// reimplemented are preserved deliberately.
pub fn proxy_log_loss(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let total: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| {
            let clipped = p.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON);
            -(t * clipped.ln() + (1.0 - t) * (1.0 - clipped).ln())
        })
        .sum();
    total / y_true.len() as f64
}

/// Averages batch metrics into one `EpochMetrics` record.
///
/// NaN inputs (degenerate batches) are mapped to 0 before accumulation, so
/// published snapshots never carry NaN.
#[derive(Debug, Default)]
pub struct EpochAccumulator {
    loss: f64,
    accuracy: f64,
    val_loss: f64,
    val_accuracy: f64,
    n_batches: usize,
}

impl EpochAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batch: BatchMetrics) {
        let sane = |v: f64| if v.is_nan() { 0.0 } else { v };
        self.loss += sane(batch.loss);
        self.accuracy += sane(batch.accuracy);
        self.val_loss += sane(batch.val_loss);
        self.val_accuracy += sane(batch.val_accuracy);
        self.n_batches += 1;
    }

    /// Epoch average, or None when no batch was recorded
    pub fn finish(self, epoch: usize) -> Option<EpochMetrics> {
        if self.n_batches == 0 {
            return None;
        }
        let n = self.n_batches as f64;
        Some(EpochMetrics {
            epoch,
            loss: self.loss / n,
            accuracy: self.accuracy / n,
            val_loss: self.val_loss / n,
            val_accuracy: self.val_accuracy / n,
        })
    }
}

/// Early-stopping policy on validation accuracy.
///
/// An epoch whose gain over the previous epoch's validation accuracy stays
/// below the threshold increments the no-improvement counter; an improving
/// epoch resets it. Once the counter reaches `patience` the loop ends — a
/// normal completion, not a cancellation.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    improvement_threshold: f64,
    patience: usize,
    previous_val_accuracy: f64,
    no_improvement: usize,
}

impl EarlyStopping {
    pub fn new(improvement_threshold: f64, patience: usize) -> Self {
        Self {
            improvement_threshold,
            patience,
            previous_val_accuracy: 0.0,
            no_improvement: 0,
        }
    }

    /// Record one epoch's validation accuracy. Returns true when training
    /// should stop.
    pub fn observe(&mut self, val_accuracy: f64) -> bool {
        if val_accuracy - self.previous_val_accuracy < self.improvement_threshold {
            self.no_improvement += 1;
        } else {
            self.no_improvement = 0;
        }
        self.previous_val_accuracy = val_accuracy;
        self.no_improvement >= self.patience
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![1.0, 0.0, 1.0, 1.0];
        let y_pred = array![1.0, 0.0, 0.0, 1.0];
        assert!((accuracy(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_proxy_loss_zero_when_perfect() {
        let y = array![1.0, 0.0, 1.0];
        let loss = proxy_log_loss(&y, &y);
        assert!(loss < 1e-8);
    }

    #[test]
    fn test_proxy_loss_finite_when_wrong() {
        let y_true = array![1.0, 0.0];
        let y_pred = array![0.0, 1.0];
        let loss = proxy_log_loss(&y_true, &y_pred);
        assert!(loss.is_finite());
        // Each full miss contributes -ln(1e-10)
        assert!((loss - (-(LOSS_EPSILON.ln()))).abs() < 1e-6);
    }

    #[test]
    fn test_accumulator_averages() {
        let mut acc = EpochAccumulator::new();
        acc.push(BatchMetrics {
            loss: 1.0,
            accuracy: 0.5,
            val_loss: 2.0,
            val_accuracy: 0.6,
        });
        acc.push(BatchMetrics {
            loss: 3.0,
            accuracy: 1.0,
            val_loss: 4.0,
            val_accuracy: 0.8,
        });
        let epoch = acc.finish(4).unwrap();
        assert_eq!(epoch.epoch, 4);
        assert!((epoch.loss - 2.0).abs() < 1e-12);
        assert!((epoch.accuracy - 0.75).abs() < 1e-12);
        assert!((epoch.val_loss - 3.0).abs() < 1e-12);
        assert!((epoch.val_accuracy - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_accumulator_maps_nan_to_zero() {
        let mut acc = EpochAccumulator::new();
        acc.push(BatchMetrics {
            loss: f64::NAN,
            accuracy: 1.0,
            val_loss: 0.0,
            val_accuracy: 1.0,
        });
        let epoch = acc.finish(0).unwrap();
        assert_eq!(epoch.loss, 0.0);
        assert!(!epoch.val_accuracy.is_nan());
    }

    #[test]
    fn test_accumulator_empty_epoch() {
        let acc = EpochAccumulator::new();
        assert!(acc.finish(0).is_none());
    }

    #[test]
    fn test_early_stopping_exact_epoch() {
        // Improving through epoch k, then flat: stops exactly at k + 3
        let sequence = [0.50, 0.60, 0.70, 0.703, 0.705, 0.706, 0.71];
        let mut policy = EarlyStopping::new(0.01, 3);
        let mut stopped_at = None;
        for (epoch, &acc) in sequence.iter().enumerate() {
            if policy.observe(acc) {
                stopped_at = Some(epoch);
                break;
            }
        }
        // Last improving epoch is index 2; stop fires at index 5
        assert_eq!(stopped_at, Some(5));
    }

    #[test]
    fn test_early_stopping_resets_on_improvement() {
        let mut policy = EarlyStopping::new(0.01, 3);
        assert!(!policy.observe(0.5)); // +0.5, improves
        assert!(!policy.observe(0.501)); // counter 1
        assert!(!policy.observe(0.502)); // counter 2
        assert!(!policy.observe(0.60)); // big gain, counter resets
        assert!(!policy.observe(0.601)); // counter 1
        assert!(!policy.observe(0.602)); // counter 2
        assert!(policy.observe(0.603)); // counter 3 -> stop
    }
}

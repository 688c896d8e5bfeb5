//! Holdout evaluation of a completed training run

use crate::error::Result;
use crate::training::IncrementalForest;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Metrics computed once over the full holdout split on successful
/// completion. The raw label/prediction vectors are carried along for the
/// downstream consumer (confusion matrix, ROC curve rendering).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
    pub y_test: Vec<f64>,
    pub y_pred: Vec<f64>,
    pub y_proba: Vec<f64>,
}

impl FinalMetrics {
    /// Confusion counts as (tp, fp, tn, fn)
    pub fn confusion_counts(&self) -> (usize, usize, usize, usize) {
        confusion_counts(&self.y_test, &self.y_pred)
    }
}

/// Evaluate a fitted model on the holdout split. Pure and stateless;
/// called exactly once per successful run.
pub fn evaluate(
    model: &IncrementalForest,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<FinalMetrics> {
    let y_proba = model.predict_proba(x_test)?;
    let y_pred: Array1<f64> = y_proba
        .iter()
        .map(|&p| if p >= 0.5 { 1.0 } else { 0.0 })
        .collect();

    let y_test_vec: Vec<f64> = y_test.iter().copied().collect();
    let y_pred_vec: Vec<f64> = y_pred.iter().copied().collect();
    let y_proba_vec: Vec<f64> = y_proba.iter().copied().collect();

    let (tp, fp, _tn, fn_) = confusion_counts(&y_test_vec, &y_pred_vec);

    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(FinalMetrics {
        precision,
        recall,
        f1,
        roc_auc: roc_auc(&y_test_vec, &y_proba_vec),
        y_test: y_test_vec,
        y_pred: y_pred_vec,
        y_proba: y_proba_vec,
    })
}

fn confusion_counts(y_true: &[f64], y_pred: &[f64]) -> (usize, usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        match (*t > 0.5, *p > 0.5) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    (tp, fp, tn, fn_)
}

/// Area under the ROC curve via the rank statistic (Mann-Whitney U),
/// averaging ranks over tied scores. A holdout with a single class has no
/// defined curve; 0.5 is returned for it.
pub fn roc_auc(y_true: &[f64], y_score: &[f64]) -> f64 {
    let n_positive = y_true.iter().filter(|&&t| t > 0.5).count();
    let n_negative = y_true.len() - n_positive;
    if n_positive == 0 || n_negative == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks across ties
    let mut ranks = vec![0.0f64; y_score.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t > 0.5)
        .map(|(_, &r)| r)
        .sum();

    let u = positive_rank_sum - (n_positive * (n_positive + 1)) as f64 / 2.0;
    u / (n_positive * n_negative) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::ForestConfig;

    #[test]
    fn test_roc_auc_perfect_ranking() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_score = [0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc(&y_true, &y_score) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_inverted_ranking() {
        let y_true = [1.0, 1.0, 0.0, 0.0];
        let y_score = [0.1, 0.2, 0.8, 0.9];
        assert!(roc_auc(&y_true, &y_score).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_all_tied() {
        let y_true = [0.0, 1.0, 0.0, 1.0];
        let y_score = [0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc(&y_true, &y_score) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_single_class() {
        let y_true = [1.0, 1.0];
        let y_score = [0.3, 0.9];
        assert_eq!(roc_auc(&y_true, &y_score), 0.5);
    }

    #[test]
    fn test_evaluate_on_fitted_model() {
        let n = 40;
        let x = ndarray::Array2::from_shape_fn((n, 2), |(i, j)| {
            if i < n / 2 {
                (i + j) as f64 * 0.1
            } else {
                8.0 + (i + j) as f64 * 0.1
            }
        });
        let y = ndarray::Array1::from_iter((0..n).map(|i| if i < n / 2 { 0.0 } else { 1.0 }));

        let mut model = IncrementalForest::new(ForestConfig::default());
        model.partial_fit(&x, &y).unwrap();
        model.partial_fit(&x, &y).unwrap();

        let metrics = evaluate(&model, &x, &y).unwrap();
        assert!(metrics.precision > 0.9);
        assert!(metrics.recall > 0.9);
        assert!(metrics.f1 > 0.9);
        assert!(metrics.roc_auc >= 0.0 && metrics.roc_auc <= 1.0);
        assert_eq!(metrics.y_test.len(), n);
        assert_eq!(metrics.y_pred.len(), n);
        assert_eq!(metrics.y_proba.len(), n);

        let (tp, fp, tn, fn_) = metrics.confusion_counts();
        assert_eq!(tp + fp + tn + fn_, n);
    }
}

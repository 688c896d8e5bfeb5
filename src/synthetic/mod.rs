//! Synthetic minority oversampling
//!
//! Rebalances the training split of imbalanced tasks by generating
//! synthetic minority-class samples (SMOTE). Only ever applied to the
//! training split; the holdout distribution is preserved.

mod smote;

pub use smote::Smote;

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features (original rows first, synthetic rows appended)
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<f64>,
    /// Number of synthetic samples generated
    pub n_synthetic: usize,
}

/// Trait for samplers
pub trait Sampler {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Get class distribution. Labels are keyed by their rounded integer value.
pub fn class_counts(y: &Array1<f64>) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for &label in y.iter() {
        *counts.entry(label.round() as i64).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class
pub fn class_indices(y: &Array1<f64>) -> HashMap<i64, Vec<usize>> {
    let mut indices = HashMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices
            .entry(label.round() as i64)
            .or_insert_with(Vec::new)
            .push(i);
    }
    indices
}

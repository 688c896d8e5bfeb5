//! Incrementally fitted bagged tree ensemble

use crate::error::{FinsightError, Result};
use crate::training::config::ForestConfig;
use crate::training::decision_tree::DecisionTree;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Bagged ensemble of decision trees supporting incremental fitting.
///
/// Each `partial_fit` call grows `trees_per_batch` new trees on bootstrap
/// samples of the batch and appends them to the ensemble. Once the ensemble
/// reaches `n_estimators`, the oldest trees are evicted, so the model keeps
/// tracking the most recent batches. Predicted probability is the mean
/// positive-class leaf fraction across trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    /// Batches consumed so far; also salts the per-batch bootstrap RNG
    batches_seen: u64,
}

impl IncrementalForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            batches_seen: 0,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// One incremental fit step on a mini-batch.
    ///
    /// Empty batches are skipped. A batch containing a single class still
    /// fits (the trees collapse to one leaf).
    pub fn partial_fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Ok(());
        }
        if x.nrows() != y.len() {
            return Err(FinsightError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed ^ self.batches_seen),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let n = x.nrows();
        for _ in 0..self.config.trees_per_batch {
            let sample_indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let x_boot = x.select(ndarray::Axis(0), &sample_indices);
            let y_boot = Array1::from_iter(sample_indices.iter().map(|&i| y[i]));

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_min_samples_split(self.config.min_samples_split);
            tree.fit(&x_boot, &y_boot)?;
            self.trees.push(tree);
        }

        // Slide the window: drop the oldest trees past the cap
        let excess = self.trees.len().saturating_sub(self.config.n_estimators);
        if excess > 0 {
            self.trees.drain(..excess);
        }

        self.batches_seen += 1;
        Ok(())
    }

    /// Mean positive-class probability across the ensemble
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(FinsightError::ModelNotFitted);
        }

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            sum = sum + tree.predict_proba(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    /// Hard labels at the 0.5 threshold
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .iter()
            .map(|&p| if p >= 0.5 { 1.0 } else { 0.0 })
            .collect())
    }
}

//! Training configuration and task policies

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The two supported prediction problems.
///
/// The task selects the model hyperparameters and whether the training
/// split is rebalanced by minority oversampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TaskKind {
    /// Default prediction on historical credit data (roughly balanced)
    CreditRisk,
    /// Fraud flagging on transaction data (heavily imbalanced)
    FraudDetection,
}

impl TaskKind {
    /// Whether SMOTE is applied to the training split
    pub fn oversamples(&self) -> bool {
        matches!(self, TaskKind::FraudDetection)
    }

    /// Model hyperparameters for this task
    pub fn forest_config(&self) -> ForestConfig {
        match self {
            TaskKind::CreditRisk => ForestConfig {
                n_estimators: 64,
                max_depth: 6,
                trees_per_batch: 4,
                ..Default::default()
            },
            TaskKind::FraudDetection => ForestConfig {
                n_estimators: 96,
                max_depth: 8,
                trees_per_batch: 6,
                ..Default::default()
            },
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::CreditRisk => write!(f, "credit_risk"),
            TaskKind::FraudDetection => write!(f, "fraud_detection"),
        }
    }
}

/// Hyperparameters of the incremental forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Ensemble cap; oldest trees are evicted past this
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Trees fitted per incremental batch
    pub trees_per_batch: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Minimum samples to attempt a split
    pub min_samples_split: usize,
    /// Bootstrap seed; None draws from entropy
    pub random_state: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 64,
            max_depth: 6,
            trees_per_batch: 4,
            min_samples_leaf: 1,
            min_samples_split: 2,
            random_state: Some(42),
        }
    }
}

/// Knobs of the incremental training loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Upper bound on training epochs
    pub max_epochs: usize,
    /// Mini-batch size (last batch of an epoch may be shorter)
    pub batch_size: usize,
    /// Minimum per-epoch validation-accuracy gain that counts as improvement
    pub improvement_threshold: f64,
    /// Consecutive non-improving epochs tolerated before early stop
    pub patience: usize,
    /// Inter-epoch delay bounding the publish rate seen by consumers
    pub epoch_delay: Duration,
    /// Seed for the deterministic prepare step (split, SMOTE)
    pub prepare_seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_epochs: 30,
            batch_size: 512,
            improvement_threshold: 0.01,
            patience: 3,
            epoch_delay: Duration::from_millis(100),
            prepare_seed: 42,
        }
    }
}

//! Incremental model training
//!
//! Provides the batched training engine:
//! - Binary decision trees and the incrementally fitted bagged forest
//! - Per-epoch metrics, loss proxy and the early-stopping policy
//! - The background worker running the epoch/batch loop under
//!   cooperative cancellation

pub mod config;
pub mod decision_tree;
pub mod forest;
pub mod metrics;
pub mod trainer;

pub use config::{ForestConfig, TaskKind, TrainerConfig};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use forest::IncrementalForest;
pub use metrics::{
    accuracy, proxy_log_loss, BatchMetrics, EarlyStopping, EpochAccumulator, EpochMetrics,
};
pub use trainer::{spawn_trainer, TrainerHandle, WorkerOutcome};

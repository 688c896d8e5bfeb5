//! finsight - Incremental training engine for a guided tabular-ML workflow
//!
//! The core of a step-wizard application that trains a binary classifier in
//! bounded batches while streaming live progress to a consumer:
//!
//! - [`dataset`] - CSV loading, null handling, column management
//! - [`preprocessing`] - encoding, splitting, oversampling, scaling
//! - [`synthetic`] - SMOTE minority oversampling
//! - [`training`] - incremental forest, batch trainer worker, early stopping
//! - [`progress`] - worker-to-consumer channel and completion signal
//! - [`workflow`] - shared context and the training lifecycle controller
//! - [`evaluation`] - holdout metrics (precision/recall/F1/ROC-AUC)
//! - [`export`] - model artifacts and training-code generation
//! - [`cli`] - headless command-line driver

pub mod error;

pub mod dataset;
pub mod evaluation;
pub mod export;
pub mod preprocessing;
pub mod progress;
pub mod synthetic;
pub mod training;
pub mod workflow;

pub mod cli;

pub use error::{FinsightError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{FinsightError, Result};

    pub use crate::dataset::{DataSource, Dataset, PresetDataset, TARGET_UNSET};
    pub use crate::evaluation::{evaluate, FinalMetrics};
    pub use crate::preprocessing::{prepare, PreparedSplit};
    pub use crate::progress::{CompletionSlot, ProgressChannel};
    pub use crate::training::{
        EpochMetrics, IncrementalForest, TaskKind, TrainerConfig, WorkerOutcome,
    };
    pub use crate::workflow::{TrainingController, TrainingState, WorkflowContext};
}

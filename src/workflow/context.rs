//! Shared workflow state passed between wizard stages

use crate::dataset::{DataSource, Dataset, TARGET_UNSET};
use crate::error::{FinsightError, Result};
use crate::training::TaskKind;

/// The typed fields the wizard stages share.
///
/// Each stage reads and writes only these fields; stages never reach into
/// one another. The training controller validates the context before a run.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    /// Where the dataset came from, for export code generation
    pub source: Option<DataSource>,
    /// The loaded, cleaned dataset
    pub dataset: Option<Dataset>,
    /// Chosen prediction target; `TARGET_UNSET` until the user picks one
    pub target_column: String,
    /// The prediction problem being solved
    pub task_kind: TaskKind,
}

impl WorkflowContext {
    pub fn new(task_kind: TaskKind) -> Self {
        Self {
            source: None,
            dataset: None,
            target_column: TARGET_UNSET.to_string(),
            task_kind,
        }
    }

    /// Install a freshly loaded dataset, resetting the target selection.
    pub fn set_dataset(&mut self, dataset: Dataset, source: Option<DataSource>) {
        self.dataset = Some(dataset);
        self.source = source;
        self.target_column = TARGET_UNSET.to_string();
    }

    /// Select the target column. It must exist in the dataset.
    pub fn select_target(&mut self, column: &str) -> Result<()> {
        let dataset = self
            .dataset
            .as_ref()
            .ok_or_else(|| FinsightError::Configuration("no dataset loaded".to_string()))?;
        if !dataset.column_names().iter().any(|c| c == column) {
            return Err(FinsightError::ColumnNotFound(column.to_string()));
        }
        self.target_column = column.to_string();
        Ok(())
    }

    /// Dataset + target, checked for training.
    pub fn training_inputs(&self) -> Result<(&Dataset, &str)> {
        let dataset = self
            .dataset
            .as_ref()
            .ok_or_else(|| FinsightError::Configuration("no dataset loaded".to_string()))?;
        if self.target_column == TARGET_UNSET {
            return Err(FinsightError::Configuration(
                "no target column selected".to_string(),
            ));
        }
        Ok((dataset, self.target_column.as_str()))
    }
}

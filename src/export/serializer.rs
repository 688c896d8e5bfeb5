//! Model artifact serialization

use crate::error::Result;
use crate::training::{IncrementalForest, TaskKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A trained model plus the metadata needed to reproduce or audit it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Crate version that produced the artifact
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub task_kind: TaskKind,
    pub target_column: String,
    pub model: IncrementalForest,
}

impl ModelArtifact {
    pub fn new(model: IncrementalForest, task_kind: TaskKind, target_column: &str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            task_kind,
            target_column: target_column.to_string(),
            model,
        }
    }
}

/// Write the artifact as pretty JSON.
pub fn save_model(artifact: &ModelArtifact, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read an artifact back.
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelArtifact> {
    let json = std::fs::read_to_string(path)?;
    let artifact: ModelArtifact = serde_json::from_str(&json)?;
    Ok(artifact)
}

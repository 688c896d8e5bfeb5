//! Dataset loading and column management
//!
//! Wraps a polars `DataFrame` with the operations the workflow needs before
//! training: CSV ingestion, null-row dropping, column typing, column
//! deletion and summary statistics (including the class-imbalance check
//! that decides whether oversampling will apply).

use crate::error::{FinsightError, Result};
use polars::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::training::TaskKind;

/// Sentinel value for "no target column chosen yet".
pub const TARGET_UNSET: &str = "unset";

/// Minority/majority ratio below which a dataset counts as imbalanced.
const IMBALANCE_RATIO: f64 = 0.3;

/// Column data type as seen by the preparer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Where the dataset comes from: a bundled demo set or a CSV on disk
#[derive(Debug, Clone)]
pub enum DataSource {
    Preset(PresetDataset),
    Csv(std::path::PathBuf),
}

/// Bundled demo datasets, one per supported task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum PresetDataset {
    CreditRisk,
    FraudDetection,
}

impl PresetDataset {
    /// Task the preset is meant to be trained with
    pub fn task_kind(&self) -> TaskKind {
        match self {
            PresetDataset::CreditRisk => TaskKind::CreditRisk,
            PresetDataset::FraudDetection => TaskKind::FraudDetection,
        }
    }

    /// Default target column of the preset
    pub fn target_column(&self) -> &'static str {
        match self {
            PresetDataset::CreditRisk => "default",
            PresetDataset::FraudDetection => "is_fraud",
        }
    }

    /// Generate the preset table. Deterministic for a given seed.
    pub fn generate(&self, n_rows: usize, seed: u64) -> Result<DataFrame> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        match self {
            PresetDataset::CreditRisk => {
                let purposes = ["auto", "business", "education", "home"];
                let mut age = Vec::with_capacity(n_rows);
                let mut income = Vec::with_capacity(n_rows);
                let mut loan_amount = Vec::with_capacity(n_rows);
                let mut purpose = Vec::with_capacity(n_rows);
                let mut default = Vec::with_capacity(n_rows);
                for _ in 0..n_rows {
                    let a = rng.gen_range(21.0..70.0_f64);
                    let inc = rng.gen_range(15_000.0..120_000.0_f64);
                    let loan = rng.gen_range(1_000.0..50_000.0_f64);
                    // Default risk rises with loan burden and falls with income
                    let risk = loan / inc + rng.gen::<f64>() * 0.4;
                    age.push(a.round());
                    income.push(inc.round());
                    loan_amount.push(loan.round());
                    purpose.push(purposes[rng.gen_range(0..purposes.len())]);
                    default.push(if risk > 0.6 { 1.0 } else { 0.0 });
                }
                Ok(DataFrame::new(vec![
                    Series::new("age".into(), age).into(),
                    Series::new("income".into(), income).into(),
                    Series::new("loan_amount".into(), loan_amount).into(),
                    Series::new("purpose".into(), purpose).into(),
                    Series::new("default".into(), default).into(),
                ])?)
            }
            PresetDataset::FraudDetection => {
                let categories = ["grocery", "online", "travel", "fuel", "retail"];
                let mut amount = Vec::with_capacity(n_rows);
                let mut hour = Vec::with_capacity(n_rows);
                let mut distance = Vec::with_capacity(n_rows);
                let mut category = Vec::with_capacity(n_rows);
                let mut is_fraud = Vec::with_capacity(n_rows);
                for _ in 0..n_rows {
                    let fraud = rng.gen::<f64>() < 0.05;
                    let amt = if fraud {
                        rng.gen_range(300.0..3_000.0_f64)
                    } else {
                        rng.gen_range(5.0..400.0_f64)
                    };
                    let h = if fraud {
                        rng.gen_range(0.0..6.0_f64)
                    } else {
                        rng.gen_range(6.0..23.0_f64)
                    };
                    amount.push((amt * 100.0).round() / 100.0);
                    hour.push(h.floor());
                    distance.push(rng.gen_range(0.0..(if fraud { 500.0 } else { 50.0 })));
                    category.push(categories[rng.gen_range(0..categories.len())]);
                    is_fraud.push(if fraud { 1.0 } else { 0.0 });
                }
                Ok(DataFrame::new(vec![
                    Series::new("amount".into(), amount).into(),
                    Series::new("hour".into(), hour).into(),
                    Series::new("distance".into(), distance).into(),
                    Series::new("category".into(), category).into(),
                    Series::new("is_fraud".into(), is_fraud).into(),
                ])?)
            }
        }
    }
}

/// Summary shown to the user after loading / target selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Rows removed because they contained missing values
    pub rows_dropped: usize,
    /// Rows remaining after cleaning
    pub n_rows: usize,
    /// Categorical columns that will be encoded
    pub n_categorical: usize,
    /// Minority/majority class ratio for the chosen target, if one is set
    pub class_ratio: Option<f64>,
    /// Whether the minority class will be oversampled for imbalanced tasks
    pub imbalanced: bool,
}

/// A loaded, cleaned table ready for target selection and preparation
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    rows_dropped: usize,
}

impl Dataset {
    /// Load a CSV file, dropping any rows with missing values.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())
            .map_err(|e| FinsightError::Data(format!("{}: {}", path.as_ref().display(), e)))?;

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file)
            .finish()?;

        Ok(Self::from_frame(frame))
    }

    /// Wrap an in-memory frame, dropping any rows with missing values.
    pub fn from_frame(frame: DataFrame) -> Self {
        let before = frame.height();
        let cleaned = frame.drop_nulls::<String>(None).unwrap_or(frame);
        let rows_dropped = before - cleaned.height();
        Self {
            frame: cleaned,
            rows_dropped,
        }
    }

    /// Load one of the bundled demo datasets.
    pub fn from_preset(preset: PresetDataset, n_rows: usize, seed: u64) -> Result<Self> {
        Ok(Self::from_frame(preset.generate(n_rows, seed)?))
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn rows_dropped(&self) -> usize {
        self.rows_dropped
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Classify a column as numeric or categorical by dtype.
    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| FinsightError::ColumnNotFound(name.to_string()))?;
        Ok(match column.dtype() {
            DataType::String | DataType::Categorical(_, _) | DataType::Boolean => {
                ColumnKind::Categorical
            }
            _ => ColumnKind::Numeric,
        })
    }

    /// Names of all categorical columns.
    pub fn categorical_columns(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| matches!(self.column_kind(name), Ok(ColumnKind::Categorical)))
            .collect()
    }

    /// Remove a column from the dataset. The active target cannot be removed.
    pub fn delete_column(&mut self, name: &str, active_target: Option<&str>) -> Result<()> {
        if let Some(target) = active_target {
            if target != TARGET_UNSET && target == name {
                return Err(FinsightError::Validation(
                    "Cannot delete the target column".to_string(),
                ));
            }
        }
        self.frame = self.frame.drop(name).map_err(|_| {
            FinsightError::ColumnNotFound(name.to_string())
        })?;
        Ok(())
    }

    /// Per-class row counts for a candidate target column.
    pub fn class_counts(&self, target: &str) -> Result<HashMap<String, usize>> {
        let column = self
            .frame
            .column(target)
            .map_err(|_| FinsightError::ColumnNotFound(target.to_string()))?;
        let as_str = column.cast(&DataType::String)?;
        let ca = as_str.as_materialized_series().str()?;

        let mut counts = HashMap::new();
        for value in ca.into_iter().flatten() {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Summary statistics, optionally including class balance for a target.
    pub fn summary(&self, target: Option<&str>) -> Result<DatasetSummary> {
        let class_ratio = match target {
            Some(t) if t != TARGET_UNSET => {
                let counts = self.class_counts(t)?;
                let min = counts.values().copied().min().unwrap_or(0);
                let max = counts.values().copied().max().unwrap_or(0);
                if max > 0 {
                    Some(min as f64 / max as f64)
                } else {
                    None
                }
            }
            _ => None,
        };

        Ok(DatasetSummary {
            rows_dropped: self.rows_dropped,
            n_rows: self.n_rows(),
            n_categorical: self.categorical_columns().len(),
            class_ratio,
            imbalanced: class_ratio.map_or(false, |r| r < IMBALANCE_RATIO),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_df() -> DataFrame {
        DataFrame::new(vec![
            Series::new("amount".into(), &[10.0, 20.0, 30.0, 40.0]).into(),
            Series::new("kind".into(), &["a", "b", "a", "b"]).into(),
            Series::new("label".into(), &[0.0, 1.0, 0.0, 0.0]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_kinds() {
        let ds = Dataset::from_frame(mixed_df());
        assert_eq!(ds.column_kind("amount").unwrap(), ColumnKind::Numeric);
        assert_eq!(ds.column_kind("kind").unwrap(), ColumnKind::Categorical);
        assert_eq!(ds.categorical_columns(), vec!["kind".to_string()]);
    }

    #[test]
    fn test_null_rows_dropped() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[Some(1.0), None, Some(3.0)]).into(),
            Series::new("b".into(), &[1.0, 2.0, 3.0]).into(),
        ])
        .unwrap();
        let ds = Dataset::from_frame(df);
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.rows_dropped(), 1);
    }

    #[test]
    fn test_delete_column_refuses_target() {
        let mut ds = Dataset::from_frame(mixed_df());
        let err = ds.delete_column("label", Some("label"));
        assert!(err.is_err());
        // Non-target columns can be removed
        ds.delete_column("kind", Some("label")).unwrap();
        assert!(!ds.column_names().contains(&"kind".to_string()));
    }

    #[test]
    fn test_summary_imbalance() {
        let ds = Dataset::from_frame(mixed_df());
        let summary = ds.summary(Some("label")).unwrap();
        // 1 positive vs 3 negatives -> ratio 1/3, just above threshold
        let ratio = summary.class_ratio.unwrap();
        assert!((ratio - 1.0 / 3.0).abs() < 1e-12);
        assert!(!summary.imbalanced);
    }

    #[test]
    fn test_preset_deterministic() {
        let a = PresetDataset::CreditRisk.generate(50, 7).unwrap();
        let b = PresetDataset::CreditRisk.generate(50, 7).unwrap();
        assert!(a.equals(&b));
        assert_eq!(a.height(), 50);
    }
}

//! Categorical label encoding

use crate::error::{FinsightError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label encoder mapping string categories to integer codes.
///
/// Categories are ordered by sorting the unique values lexicographically,
/// so the fitted mapping is independent of row order. Each column is fit
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    mappings: HashMap<String, HashMap<String, f64>>,
    is_fitted: bool,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the encoder on the given columns.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| FinsightError::ColumnNotFound(col_name.to_string()))?;
            let as_str = column.cast(&DataType::String)?;
            let ca = as_str.as_materialized_series().str()?;

            let mut categories: Vec<String> = ca
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect();
            categories.sort();
            categories.dedup();

            let mapping: HashMap<String, f64> = categories
                .into_iter()
                .enumerate()
                .map(|(code, cat)| (cat, code as f64))
                .collect();
            self.mappings.insert(col_name.to_string(), mapping);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column with its integer codes (as Float64).
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(FinsightError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, mapping) in &self.mappings {
            let column = match df.column(col_name) {
                Ok(c) => c,
                Err(_) => continue,
            };
            let as_str = column.cast(&DataType::String)?;
            let ca = as_str.as_materialized_series().str()?;

            let codes: Vec<f64> = ca
                .into_iter()
                .map(|opt| {
                    let value = opt.ok_or_else(|| {
                        FinsightError::Data(format!("null value in column '{}'", col_name))
                    })?;
                    mapping.get(value).copied().ok_or_else(|| {
                        FinsightError::Validation(format!(
                            "unseen category '{}' in column '{}'",
                            value, col_name
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            result = result
                .with_column(Series::new(col_name.as_str().into(), codes))?
                .clone();
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted categories of a column in code order.
    pub fn categories(&self, column: &str) -> Option<Vec<String>> {
        let mapping = self.mappings.get(column)?;
        let mut pairs: Vec<(&String, &f64)> = mapping.iter().collect();
        pairs.sort_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));
        Some(pairs.into_iter().map(|(cat, _)| cat.clone()).collect())
    }
}

impl Default for LabelEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_code_order() {
        let df = DataFrame::new(vec![
            Series::new("color".into(), &["red", "blue", "green", "blue"]).into(),
        ])
        .unwrap();

        let mut encoder = LabelEncoder::new();
        let encoded = encoder.fit_transform(&df, &["color"]).unwrap();

        // Sorted order: blue=0, green=1, red=2 regardless of first-seen order
        let codes = encoded.column("color").unwrap().f64().unwrap();
        let values: Vec<f64> = codes.into_iter().flatten().collect();
        assert_eq!(values, vec![2.0, 0.0, 1.0, 0.0]);
        assert_eq!(
            encoder.categories("color").unwrap(),
            vec!["blue", "green", "red"]
        );
    }

    #[test]
    fn test_unseen_category_rejected() {
        let train = DataFrame::new(vec![
            Series::new("c".into(), &["a", "b"]).into(),
        ])
        .unwrap();
        let test = DataFrame::new(vec![
            Series::new("c".into(), &["a", "z"]).into(),
        ])
        .unwrap();

        let mut encoder = LabelEncoder::new();
        encoder.fit(&train, &["c"]).unwrap();
        assert!(encoder.transform(&test).is_err());
    }

    #[test]
    fn test_transform_requires_fit() {
        let df = DataFrame::new(vec![
            Series::new("c".into(), &["a"]).into(),
        ])
        .unwrap();
        let encoder = LabelEncoder::new();
        assert!(matches!(
            encoder.transform(&df),
            Err(FinsightError::ModelNotFitted)
        ));
    }
}

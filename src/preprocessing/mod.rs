//! Data preparation for training
//!
//! Turns a cleaned [`Dataset`](crate::dataset::Dataset) plus a target column
//! and task kind into the numeric matrices the trainer consumes:
//! - categorical features label-encoded (sorted category order)
//! - seeded 80/20 train/test split
//! - minority oversampling on the training split for imbalanced tasks
//! - standard scaling fit on training features only
//!
//! `prepare` is a pure function of its inputs; the dataset is not mutated
//! and repeated calls with the same seed produce identical splits.

mod encoder;
mod scaler;
mod split;

pub use encoder::LabelEncoder;
pub use scaler::StandardScaler;
pub use split::train_test_split;

use crate::dataset::{Dataset, TARGET_UNSET};
use crate::error::{FinsightError, Result};
use crate::synthetic::{Sampler, Smote};
use crate::training::TaskKind;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use tracing::debug;

/// Fraction of rows held out for testing
pub const TEST_RATIO: f64 = 0.2;

/// Numeric train/test matrices for one training run
#[derive(Debug, Clone)]
pub struct PreparedSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    /// Feature column names in matrix column order
    pub feature_names: Vec<String>,
}

/// Prepare a dataset for training.
///
/// Fails with [`FinsightError::Configuration`] when the target column is
/// unset or missing, or when the target is not binary.
pub fn prepare(
    dataset: &Dataset,
    target_column: &str,
    task_kind: TaskKind,
    seed: u64,
) -> Result<PreparedSplit> {
    if target_column == TARGET_UNSET {
        return Err(FinsightError::Configuration(
            "no target column selected".to_string(),
        ));
    }
    let df = dataset.frame();
    if df.column(target_column).is_err() {
        return Err(FinsightError::Configuration(format!(
            "target column '{}' does not exist",
            target_column
        )));
    }

    // Encode categorical columns (features and, if needed, the target)
    let categorical = dataset.categorical_columns();
    let encoded = if categorical.is_empty() {
        df.clone()
    } else {
        let cols: Vec<&str> = categorical.iter().map(|s| s.as_str()).collect();
        LabelEncoder::new().fit_transform(df, &cols)?
    };

    let feature_names: Vec<String> = encoded
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != target_column)
        .map(|s| s.to_string())
        .collect();

    let x = columns_to_array2(&encoded, &feature_names)?;
    let y = binary_target(&encoded, target_column)?;

    let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, TEST_RATIO, seed)?;

    // Rebalance the training split only; the holdout distribution is untouched
    let (x_train, y_train) = if task_kind.oversamples() {
        let resampled = Smote::new().with_seed(seed).fit_resample(&x_train, &y_train)?;
        debug!(
            added = resampled.y.len() - y_train.len(),
            "minority class oversampled"
        );
        (resampled.x, resampled.y)
    } else {
        (x_train, y_train)
    };

    let mut scaler = StandardScaler::new();
    let x_train = scaler.fit_transform(&x_train)?;
    let x_test = scaler.transform(&x_test)?;

    debug!(
        train_rows = x_train.nrows(),
        test_rows = x_test.nrows(),
        features = feature_names.len(),
        "prepared split"
    );

    Ok(PreparedSplit {
        x_train,
        x_test,
        y_train,
        y_test,
        feature_names,
    })
}

/// Extract named columns into a row-major matrix.
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| FinsightError::ColumnNotFound(col_name.clone()))?;
            let as_f64 = series.cast(&DataType::Float64)?;
            let values: Vec<f64> = as_f64
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

/// Extract the target column as a {0.0, 1.0} label vector.
fn binary_target(df: &DataFrame, target_column: &str) -> Result<Array1<f64>> {
    let series = df
        .column(target_column)
        .map_err(|_| FinsightError::ColumnNotFound(target_column.to_string()))?;
    let as_f64 = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = as_f64
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();

    let mut classes = values.clone();
    classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    classes.dedup();

    if classes.len() != 2 {
        return Err(FinsightError::Configuration(format!(
            "target column '{}' has {} distinct values, expected 2",
            target_column,
            classes.len()
        )));
    }

    let positive = classes[1];
    Ok(Array1::from_iter(values.into_iter().map(|v| {
        if v == positive {
            1.0
        } else {
            0.0
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn toy_dataset(n: usize) -> Dataset {
        let kinds = ["low", "high"];
        let mut a = Vec::with_capacity(n);
        let mut b = Vec::with_capacity(n);
        let mut kind = Vec::with_capacity(n);
        let mut label = Vec::with_capacity(n);
        for i in 0..n {
            a.push(i as f64);
            b.push((n - i) as f64);
            kind.push(kinds[i % 2]);
            label.push(if i % 3 == 0 { 1.0 } else { 0.0 });
        }
        Dataset::from_frame(
            DataFrame::new(vec![
                Series::new("a".into(), a).into(),
                Series::new("b".into(), b).into(),
                Series::new("kind".into(), kind).into(),
                Series::new("label".into(), label).into(),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_prepare_shapes() {
        let ds = toy_dataset(100);
        let split = prepare(&ds, "label", TaskKind::CreditRisk, 42).unwrap();
        assert_eq!(split.x_train.nrows(), 80);
        assert_eq!(split.x_test.nrows(), 20);
        assert_eq!(split.feature_names, vec!["a", "b", "kind"]);
    }

    #[test]
    fn test_unset_target_rejected() {
        let ds = toy_dataset(100);
        let err = prepare(&ds, TARGET_UNSET, TaskKind::CreditRisk, 42);
        assert!(matches!(err, Err(FinsightError::Configuration(_))));
    }

    #[test]
    fn test_missing_target_rejected() {
        let ds = toy_dataset(100);
        let err = prepare(&ds, "nope", TaskKind::CreditRisk, 42);
        assert!(matches!(err, Err(FinsightError::Configuration(_))));
    }

    #[test]
    fn test_non_binary_target_rejected() {
        let ds = toy_dataset(100);
        // 'a' takes 100 distinct values
        let err = prepare(&ds, "a", TaskKind::CreditRisk, 42);
        assert!(matches!(err, Err(FinsightError::Configuration(_))));
    }

    #[test]
    fn test_prepare_deterministic() {
        let ds = toy_dataset(120);
        let one = prepare(&ds, "label", TaskKind::CreditRisk, 42).unwrap();
        let two = prepare(&ds, "label", TaskKind::CreditRisk, 42).unwrap();
        assert_eq!(one.x_train, two.x_train);
        assert_eq!(one.x_test, two.x_test);
        assert_eq!(one.y_train, two.y_train);
        assert_eq!(one.y_test, two.y_test);
    }

    #[test]
    fn test_oversampling_balances_training_split() {
        let ds = toy_dataset(150);
        let plain = prepare(&ds, "label", TaskKind::CreditRisk, 42).unwrap();
        let balanced = prepare(&ds, "label", TaskKind::FraudDetection, 42).unwrap();

        let count = |y: &Array1<f64>, cls: f64| y.iter().filter(|&&v| v == cls).count();

        // Training split balanced to equal class counts
        assert_eq!(
            count(&balanced.y_train, 0.0),
            count(&balanced.y_train, 1.0)
        );
        // Holdout untouched by resampling
        assert_eq!(balanced.y_test, plain.y_test);
    }
}

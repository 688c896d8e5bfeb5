//! Feature standardization

use crate::error::{FinsightError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Zero-mean unit-variance scaler over feature matrices.
///
/// Fit on the training features only; the same parameters are applied to
/// the test features so no test statistics leak into training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Option<Array1<f64>>,
    stds: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            means: None,
            stds: None,
        }
    }

    /// Compute per-column mean and standard deviation.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(FinsightError::Validation(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let n = x.nrows() as f64;
        let means = x.sum_axis(ndarray::Axis(0)) / n;
        let stds: Array1<f64> = (0..x.ncols())
            .map(|j| {
                let mean = means[j];
                let var = x.column(j).iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                // Constant columns scale by 1 instead of dividing by zero
                if std == 0.0 {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        self.means = Some(means);
        self.stds = Some(stds);
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let means = self.means.as_ref().ok_or(FinsightError::ModelNotFitted)?;
        let stds = self.stds.as_ref().ok_or(FinsightError::ModelNotFitted)?;

        if x.ncols() != means.len() {
            return Err(FinsightError::Shape {
                expected: format!("{} columns", means.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok(Array2::from_shape_fn(x.dim(), |(i, j)| {
            (x[[i, j]] - means[j]) / stds[j]
        }))
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

//! Seeded train/test splitting

use crate::error::{FinsightError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Shuffle rows with a seeded permutation and split off a test fraction.
///
/// Test size is `round(test_ratio * n_rows)`; the same seed always produces
/// the same partition.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_ratio: f64,
    seed: u64,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    let n = x.nrows();
    if n != y.len() {
        return Err(FinsightError::Shape {
            expected: format!("y length {}", n),
            actual: format!("y length {}", y.len()),
        });
    }

    let test_size = ((n as f64) * test_ratio).round() as usize;
    if test_size == 0 || test_size >= n {
        return Err(FinsightError::Validation(format!(
            "test split of {} rows from {} total is degenerate",
            test_size, n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(test_size);

    let x_train = x.select(ndarray::Axis(0), train_idx);
    let x_test = x.select(ndarray::Axis(0), test_idx);
    let y_train = Array1::from_iter(train_idx.iter().map(|&i| y[i]));
    let y_test = Array1::from_iter(test_idx.iter().map(|&i| y[i]));

    Ok((x_train, x_test, y_train, y_test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_iter((0..n).map(|i| (i % 2) as f64));
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = data(100);
        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(x_train.nrows(), 80);
        assert_eq!(x_test.nrows(), 20);
        assert_eq!(y_train.len(), 80);
        assert_eq!(y_test.len(), 20);
    }

    #[test]
    fn test_rounding() {
        let (x, y) = data(11);
        let (_, x_test, _, _) = train_test_split(&x, &y, 0.2, 42).unwrap();
        // round(0.2 * 11) = 2
        assert_eq!(x_test.nrows(), 2);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = data(50);
        let (a_train, _, a_y, _) = train_test_split(&x, &y, 0.2, 7).unwrap();
        let (b_train, _, b_y, _) = train_test_split(&x, &y, 0.2, 7).unwrap();
        assert_eq!(a_train, b_train);
        assert_eq!(a_y, b_y);

        let (c_train, _, _, _) = train_test_split(&x, &y, 0.2, 8).unwrap();
        assert_ne!(a_train, c_train);
    }

    #[test]
    fn test_rows_partitioned() {
        let (x, y) = data(25);
        let (x_train, x_test, _, _) = train_test_split(&x, &y, 0.2, 3).unwrap();
        assert_eq!(x_train.nrows() + x_test.nrows(), 25);
    }

    #[test]
    fn test_degenerate_split_rejected() {
        let (x, y) = data(2);
        assert!(train_test_split(&x, &y, 0.2, 1).is_err());
    }
}

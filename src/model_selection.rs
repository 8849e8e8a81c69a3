//! Train/test splitting for benchmark runs.
//!
//! The split is always seeded so that two libraries benchmarking the same
//! estimator see identical partitions. Test rows keep their shuffled order,
//! which makes every smaller test size an exact prefix of the largest test
//! split; the orchestrator reuses the split by slicing, never by
//! regenerating.

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{MedirError, Result};
use crate::primitives::{Matrix, Vector};

/// Validates inputs for `train_test_split`.
fn validate_split_inputs(x: &Matrix<f32>, y: &Vector<f32>, n_train: usize) -> Result<()> {
    let (n_samples, _) = x.shape();
    if n_samples != y.len() {
        return Err(MedirError::DimensionMismatch {
            expected: format!("{n_samples} targets"),
            actual: format!("{}", y.len()),
        });
    }
    if n_train == 0 || n_train >= n_samples {
        return Err(MedirError::invalid_spec(format!(
            "train size must leave a non-empty test set (n_train={n_train}, n_samples={n_samples})"
        )));
    }
    Ok(())
}

/// Shuffles sample indices with a fixed seed.
fn shuffle_indices(n_samples: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

/// Extracts the samples at `indices`, in order.
fn extract_samples(x: &Matrix<f32>, y: &Vector<f32>, indices: &[usize]) -> (Matrix<f32>, Vector<f32>) {
    let n_features = x.shape().1;
    let mut x_data = Vec::with_capacity(indices.len() * n_features);
    let mut y_data = Vec::with_capacity(indices.len());

    for &idx in indices {
        for j in 0..n_features {
            x_data.push(x.get(idx, j));
        }
        y_data.push(y.get(idx));
    }

    // Lengths match by construction.
    let x_subset = Matrix::from_vec(indices.len(), n_features, x_data)
        .expect("extracted data length matches indices * n_features");
    (x_subset, Vector::from_vec(y_data))
}

/// Splits arrays into seeded train and test subsets by absolute train count.
///
/// # Arguments
///
/// * `x` - Feature matrix
/// * `y` - Target vector
/// * `n_train` - Number of rows in the training partition
/// * `seed` - Random seed; the same seed always produces the same split
///
/// # Returns
///
/// Tuple of (x_train, x_test, y_train, y_test)
///
/// # Errors
///
/// Returns an error if `x` and `y` disagree on sample count or the split
/// would leave an empty partition.
///
/// # Example
///
/// ```rust
/// use medir::model_selection::train_test_split;
/// use medir::primitives::{Matrix, Vector};
///
/// let x = Matrix::from_vec(10, 2, (0..20).map(|i| i as f32).collect()).expect("matrix");
/// let y = Vector::from_vec((0..10).map(|i| i as f32).collect());
///
/// let (x_train, x_test, _, _) = train_test_split(&x, &y, 8, 42).expect("split");
/// assert_eq!(x_train.shape().0, 8);
/// assert_eq!(x_test.shape().0, 2);
/// ```
#[allow(clippy::type_complexity)]
pub fn train_test_split(
    x: &Matrix<f32>,
    y: &Vector<f32>,
    n_train: usize,
    seed: u64,
) -> Result<(Matrix<f32>, Matrix<f32>, Vector<f32>, Vector<f32>)> {
    validate_split_inputs(x, y, n_train)?;
    let n_samples = x.shape().0;

    let indices = shuffle_indices(n_samples, seed);
    let train_indices = &indices[..n_train];
    let test_indices = &indices[n_train..];

    let (x_train, y_train) = extract_samples(x, y, train_indices);
    let (x_test, y_test) = extract_samples(x, y, test_indices);

    Ok((x_train, x_test, y_train, y_test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data(n: usize) -> (Matrix<f32>, Vector<f32>) {
        let x = Matrix::from_vec(n, 2, (0..n * 2).map(|i| i as f32).collect()).expect("matrix");
        let y = Vector::from_vec((0..n).map(|i| i as f32).collect());
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = toy_data(10);
        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 7, 42).expect("split");
        assert_eq!(x_train.shape(), (7, 2));
        assert_eq!(x_test.shape(), (3, 2));
        assert_eq!(y_train.len(), 7);
        assert_eq!(y_test.len(), 3);
    }

    #[test]
    fn test_split_is_reproducible() {
        let (x, y) = toy_data(20);
        let (a_train, a_test, _, _) = train_test_split(&x, &y, 15, 42).expect("first");
        let (b_train, b_test, _, _) = train_test_split(&x, &y, 15, 42).expect("second");
        assert_eq!(a_train, b_train);
        assert_eq!(a_test, b_test);
    }

    #[test]
    fn test_different_seeds_differ() {
        let (x, y) = toy_data(20);
        let (a_train, _, _, _) = train_test_split(&x, &y, 15, 42).expect("first");
        let (b_train, _, _, _) = train_test_split(&x, &y, 15, 43).expect("second");
        assert_ne!(a_train, b_train);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let (x, y) = toy_data(12);
        let (_, _, y_train, y_test) = train_test_split(&x, &y, 8, 7).expect("split");

        let mut seen: Vec<f32> = y_train
            .as_slice()
            .iter()
            .chain(y_test.as_slice())
            .copied()
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
        let expected: Vec<f32> = (0..12).map(|i| i as f32).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_empty_test_set_rejected() {
        let (x, y) = toy_data(5);
        assert!(train_test_split(&x, &y, 5, 0).is_err());
        assert!(train_test_split(&x, &y, 0, 0).is_err());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).expect("matrix");
        let y = Vector::from_slice(&[1.0, 2.0]);
        assert!(train_test_split(&x, &y, 2, 0).is_err());
    }
}

//! Core traits for benchmark subjects.
//!
//! These traits define the capability contracts the orchestrator times:
//! supervised estimators expose fit/predict, transformers expose
//! fit/transform. The orchestrator never depends on a concrete type.

use crate::error::Result;
use crate::primitives::{Matrix, Vector};

/// Trait for supervised learning estimators.
///
/// Estimators implement fit/predict following sklearn conventions.
///
/// # Examples
///
/// ```
/// use medir::prelude::*;
///
/// // Create training data: y = 2x + 1
/// let x_train = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y_train = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);
///
/// let mut model = LinearRegression::new();
/// model.fit(&x_train, &y_train).unwrap();
/// let predictions = model.predict(&x_train).unwrap();
/// assert_eq!(predictions.len(), 4);
/// ```
pub trait Estimator {
    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (dimension mismatch, singular
    /// matrix, etc.).
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()>;

    /// Predicts target values for input data.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or dimensions mismatch.
    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>>;

    /// Fixes internal randomness so repeated timings are comparable.
    ///
    /// Deterministic estimators ignore the seed.
    fn set_random_state(&mut self, _seed: u64) {}

    /// Iterations consumed by the last fit, when the solver is iterative.
    fn n_iter(&self) -> Option<u64> {
        None
    }
}

/// Trait for data transformers (scalers, encoders, etc.).
pub trait Transformer {
    /// Fits the transformer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()>;

    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the transformer is not fitted.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.fit(x)?;
        self.transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MedirError;

    struct MockScaler {
        factor: Option<f32>,
    }

    impl Transformer for MockScaler {
        fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
            if x.n_rows() == 0 {
                return Err(MedirError::DimensionMismatch {
                    expected: "non-empty matrix".to_string(),
                    actual: "0 rows".to_string(),
                });
            }
            self.factor = Some(2.0);
            Ok(())
        }

        fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
            let factor = self
                .factor
                .ok_or_else(|| MedirError::from("MockScaler not fitted"))?;
            let data = x.as_slice().iter().map(|v| v * factor).collect();
            Matrix::from_vec(x.n_rows(), x.n_cols(), data).map_err(MedirError::from)
        }
    }

    #[test]
    fn test_fit_transform_default_impl() {
        let mut scaler = MockScaler { factor: None };
        let x = Matrix::from_vec(2, 1, vec![1.0, 2.0]).expect("matrix");
        let out = scaler.fit_transform(&x).expect("fit_transform");
        assert_eq!(out.get(0, 0), 2.0);
        assert_eq!(out.get(1, 0), 4.0);
    }

    #[test]
    fn test_transform_without_fit_fails() {
        let scaler = MockScaler { factor: None };
        let x = Matrix::from_vec(1, 1, vec![1.0]).expect("matrix");
        assert!(scaler.transform(&x).is_err());
    }

    #[test]
    fn test_fit_transform_propagates_fit_error() {
        let mut scaler = MockScaler { factor: None };
        let x = Matrix::from_vec(0, 1, vec![]).expect("matrix");
        assert!(scaler.fit_transform(&x).is_err());
    }
}

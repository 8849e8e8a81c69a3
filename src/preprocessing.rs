//! Data transformers used as built-in benchmark subjects.

use crate::error::{MedirError, Result};
use crate::primitives::Matrix;
use crate::traits::Transformer;

/// Standardizes features by removing the mean and scaling to unit variance.
///
/// Variance is the biased estimate (divide by n), and near-zero deviations
/// are clamped to 1.0 so constant features pass through unscaled.
///
/// # Examples
///
/// ```
/// use medir::preprocessing::StandardScaler;
/// use medir::primitives::Matrix;
/// use medir::traits::Transformer;
///
/// let data = Matrix::from_vec(3, 1, vec![0.0, 1.0, 2.0]).expect("matrix");
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&data).expect("fit_transform");
/// assert!(scaled.get(1, 0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f32>>,
    /// Standard deviation of each feature (computed during fit).
    std: Option<Vec<f32>>,
}

impl StandardScaler {
    /// Creates a new `StandardScaler`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err(MedirError::DimensionMismatch {
                expected: "non-empty matrix".to_string(),
                actual: "0 rows".to_string(),
            });
        }

        let mut mean = vec![0.0f32; n_features];
        let mut std = vec![0.0f32; n_features];
        for j in 0..n_features {
            let mut sum = 0.0f32;
            for i in 0..n_samples {
                sum += x.get(i, j);
            }
            mean[j] = sum / n_samples as f32;

            let mut variance = 0.0f32;
            for i in 0..n_samples {
                let diff = x.get(i, j) - mean[j];
                variance += diff * diff;
            }
            let deviation = (variance / n_samples as f32).sqrt();
            std[j] = if deviation > 1e-8 { deviation } else { 1.0 };
        }

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let mean = self
            .mean
            .as_ref()
            .ok_or_else(|| MedirError::from("StandardScaler is not fitted; call fit() first"))?;
        let std = self
            .std
            .as_ref()
            .ok_or_else(|| MedirError::from("StandardScaler is not fitted; call fit() first"))?;

        let (n_samples, n_features) = x.shape();
        if n_features != mean.len() {
            return Err(MedirError::DimensionMismatch {
                expected: format!("{} features", mean.len()),
                actual: format!("{n_features}"),
            });
        }

        let mut data = Vec::with_capacity(n_samples * n_features);
        for i in 0..n_samples {
            for j in 0..n_features {
                data.push((x.get(i, j) - mean[j]) / std[j]);
            }
        }
        Matrix::from_vec(n_samples, n_features, data).map_err(MedirError::from)
    }
}

//! Evaluation metrics for benchmarked estimators.
//!
//! Includes regression metrics (R², MSE, MAE) and classification accuracy,
//! plus name-based resolution so configs can request scores as data.

use crate::error::{MedirError, Result};
use crate::primitives::Vector;

/// A metric function: (predictions, ground truth) → score.
pub type MetricFn = fn(&Vector<f32>, &Vector<f32>) -> f32;

/// Resolves a metric name to its function.
///
/// # Errors
///
/// Returns `UnknownMetric` for an unregistered name; no fallback.
pub fn resolve(name: &str) -> Result<MetricFn> {
    match name {
        "r_squared" => Ok(r_squared),
        "mse" => Ok(mse),
        "mae" => Ok(mae),
        "accuracy" => Ok(accuracy),
        _ => Err(MedirError::UnknownMetric {
            metric: name.to_string(),
        }),
    }
}

/// Returns true if `name` is a registered metric.
///
/// Result tables use this to tell metric-score columns apart from
/// hyperparameter columns when loading persisted CSV.
#[must_use]
pub fn is_known(name: &str) -> bool {
    resolve(name).is_ok()
}

/// Computes the coefficient of determination (R²).
///
/// R² = 1 - (`SS_res` / `SS_tot`)
///
/// # Examples
///
/// ```
/// use medir::metrics::r_squared;
/// use medir::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[3.0, -0.5, 2.0, 7.0]);
/// let y_pred = Vector::from_slice(&[2.5, 0.0, 2.0, 8.0]);
/// assert!(r_squared(&y_pred, &y_true) > 0.9);
/// ```
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[must_use]
pub fn r_squared(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");

    let y_mean = y_true.mean();

    let ss_res: f32 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    let ss_tot: f32 = y_true.as_slice().iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return 0.0;
    }

    1.0 - (ss_res / ss_tot)
}

/// Computes the Mean Squared Error (MSE).
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn mse(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors must not be empty");

    y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f32>()
        / y_true.len() as f32
}

/// Computes the Mean Absolute Error (MAE).
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn mae(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors must not be empty");

    y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f32>()
        / y_true.len() as f32
}

/// Computes classification accuracy on labels encoded as floats.
///
/// Predictions are rounded to the nearest label before comparison, so a
/// regressor emitting raw scores near 0/1 is scored sensibly.
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn accuracy(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors must not be empty");

    let hits = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .filter(|(t, p)| (p.round() - **t).abs() < f32::EPSILON)
        .count();
    hits as f32 / y_true.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r_squared_perfect_fit() {
        let y = Vector::from_slice(&[1.0, 2.0, 3.0]);
        assert!((r_squared(&y, &y) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_r_squared_constant_target() {
        let y_true = Vector::from_slice(&[2.0, 2.0, 2.0]);
        let y_pred = Vector::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(r_squared(&y_pred, &y_true), 0.0);
    }

    #[test]
    fn test_mse_known_value() {
        let y_true = Vector::from_slice(&[1.0, 2.0]);
        let y_pred = Vector::from_slice(&[2.0, 2.0]);
        assert!((mse(&y_pred, &y_true) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_mae_known_value() {
        let y_true = Vector::from_slice(&[1.0, 2.0]);
        let y_pred = Vector::from_slice(&[2.0, 4.0]);
        assert!((mae(&y_pred, &y_true) - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_accuracy_rounds_predictions() {
        let y_true = Vector::from_slice(&[0.0, 1.0, 1.0, 0.0]);
        let y_pred = Vector::from_slice(&[0.1, 0.9, 0.4, 0.2]);
        assert!((accuracy(&y_pred, &y_true) - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resolve_known_names() {
        for name in ["r_squared", "mse", "mae", "accuracy"] {
            assert!(resolve(name).is_ok(), "{name} should resolve");
            assert!(is_known(name));
        }
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = resolve("f1_macro").unwrap_err();
        assert!(err.to_string().contains("f1_macro"));
        assert!(!is_known("f1_macro"));
    }
}

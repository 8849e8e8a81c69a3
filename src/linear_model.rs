//! Linear models used as built-in benchmark subjects.
//!
//! Includes Ordinary Least Squares regression (closed form) and Ridge
//! regression (iterative gradient-descent solver).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{MedirError, Result};
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;

/// Ordinary Least Squares (OLS) linear regression.
///
/// Fits a linear model by minimizing the residual sum of squares.
///
/// # Solver
///
/// Uses normal equations: `β = (X^T X)^-1 X^T y` via Cholesky decomposition.
///
/// # Examples
///
/// ```
/// use medir::prelude::*;
///
/// // Simple linear regression: y = 2x + 1
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);
///
/// let mut model = LinearRegression::new();
/// model.fit(&x, &y).unwrap();
/// let predictions = model.predict(&x).unwrap();
/// assert!((predictions.get(0) - 3.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// Coefficients for features (excluding intercept).
    coefficients: Option<Vector<f32>>,
    /// Intercept (bias) term.
    intercept: f32,
    /// Whether to fit an intercept.
    fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Creates a new `LinearRegression` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
        }
    }

    /// Sets whether to fit an intercept term.
    #[must_use]
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Estimator for LinearRegression {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples != y.len() {
            return Err(MedirError::DimensionMismatch {
                expected: format!("{n_samples} targets"),
                actual: format!("{}", y.len()),
            });
        }

        // Augmented dimension when fitting an intercept.
        let p = if self.fit_intercept {
            n_features + 1
        } else {
            n_features
        };

        let feature = |i: usize, j: usize| -> f32 {
            if self.fit_intercept {
                if j == 0 {
                    1.0
                } else {
                    x.get(i, j - 1)
                }
            } else {
                x.get(i, j)
            }
        };

        // Normal equations: A = X^T X, b = X^T y.
        let mut a = vec![0.0f64; p * p];
        let mut b = vec![0.0f64; p];
        for i in 0..n_samples {
            for j in 0..p {
                let xj = f64::from(feature(i, j));
                b[j] += xj * f64::from(y.get(i));
                for k in j..p {
                    a[j * p + k] += xj * f64::from(feature(i, k));
                }
            }
        }
        for j in 0..p {
            for k in 0..j {
                a[j * p + k] = a[k * p + j];
            }
        }

        let solution = cholesky_solve(&mut a, &mut b, p)?;
        if self.fit_intercept {
            self.intercept = solution[0] as f32;
            self.coefficients = Some(Vector::from_vec(
                solution[1..].iter().map(|&v| v as f32).collect(),
            ));
        } else {
            self.intercept = 0.0;
            self.coefficients = Some(Vector::from_vec(
                solution.iter().map(|&v| v as f32).collect(),
            ));
        }
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| MedirError::from("LinearRegression is not fitted; call fit() first"))?;
        predict_linear(x, coefficients, self.intercept)
    }
}

/// Ridge regression with a gradient-descent solver.
///
/// Minimizes `||y - Xw||² / n + alpha * ||w||²`. The iterative solver makes
/// it a natural subject for iteration-count reporting: the number of
/// gradient steps actually taken is exposed through
/// [`Estimator::n_iter`].
#[derive(Debug, Clone)]
pub struct Ridge {
    alpha: f32,
    learning_rate: f32,
    max_iter: u64,
    tol: f32,
    seed: Option<u64>,
    coefficients: Option<Vector<f32>>,
    intercept: f32,
    last_n_iter: Option<u64>,
}

impl Default for Ridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Ridge {
    /// Creates a new `Ridge` with default hyperparameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alpha: 1.0,
            learning_rate: 0.01,
            max_iter: 1000,
            tol: 1e-4,
            seed: None,
            coefficients: None,
            intercept: 0.0,
            last_n_iter: None,
        }
    }

    /// Sets the L2 penalty strength.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the gradient-descent step size.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: u64) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance on the gradient's infinity norm.
    #[must_use]
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Estimator for Ridge {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples != y.len() {
            return Err(MedirError::DimensionMismatch {
                expected: format!("{n_samples} targets"),
                actual: format!("{}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(MedirError::invalid_spec("cannot fit on empty data"));
        }

        // Small random init keeps repeated fits identical once seeded.
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut weights: Vec<f32> = (0..n_features).map(|_| rng.gen_range(-0.01..0.01)).collect();
        let mut intercept = 0.0f32;

        let n = n_samples as f32;
        let mut iterations = 0u64;
        for _ in 0..self.max_iter {
            let mut grad_w = vec![0.0f32; n_features];
            let mut grad_b = 0.0f32;
            for i in 0..n_samples {
                let mut pred = intercept;
                for (j, w) in weights.iter().enumerate() {
                    pred += w * x.get(i, j);
                }
                let residual = pred - y.get(i);
                grad_b += residual;
                for (j, g) in grad_w.iter_mut().enumerate() {
                    *g += residual * x.get(i, j);
                }
            }
            grad_b = 2.0 * grad_b / n;
            let mut grad_norm = grad_b.abs();
            for (j, g) in grad_w.iter_mut().enumerate() {
                *g = 2.0 * *g / n + 2.0 * self.alpha * weights[j];
                grad_norm = grad_norm.max(g.abs());
            }

            iterations += 1;
            intercept -= self.learning_rate * grad_b;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= self.learning_rate * g;
            }

            if grad_norm < self.tol {
                break;
            }
        }

        self.coefficients = Some(Vector::from_vec(weights));
        self.intercept = intercept;
        self.last_n_iter = Some(iterations);
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| MedirError::from("Ridge is not fitted; call fit() first"))?;
        predict_linear(x, coefficients, self.intercept)
    }

    fn set_random_state(&mut self, seed: u64) {
        self.seed = Some(seed);
    }

    fn n_iter(&self) -> Option<u64> {
        self.last_n_iter
    }
}

fn predict_linear(x: &Matrix<f32>, coefficients: &Vector<f32>, intercept: f32) -> Result<Vector<f32>> {
    let (n_samples, n_features) = x.shape();
    if n_features != coefficients.len() {
        return Err(MedirError::DimensionMismatch {
            expected: format!("{} features", coefficients.len()),
            actual: format!("{n_features}"),
        });
    }

    let mut predictions = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let mut value = intercept;
        for j in 0..n_features {
            value += coefficients.get(j) * x.get(i, j);
        }
        predictions.push(value);
    }
    Ok(Vector::from_vec(predictions))
}

/// Solves the symmetric positive-definite system `A x = b` in place.
///
/// `a` is `p`x`p` row-major and is overwritten with its Cholesky factor.
fn cholesky_solve(a: &mut [f64], b: &mut [f64], p: usize) -> Result<Vec<f64>> {
    // Decompose A = L L^T.
    for j in 0..p {
        let mut diag = a[j * p + j];
        for k in 0..j {
            diag -= a[j * p + k] * a[j * p + k];
        }
        if diag <= 1e-12 {
            return Err(MedirError::SingularMatrix { pivot: diag });
        }
        let diag = diag.sqrt();
        a[j * p + j] = diag;
        for i in (j + 1)..p {
            let mut value = a[i * p + j];
            for k in 0..j {
                value -= a[i * p + k] * a[j * p + k];
            }
            a[i * p + j] = value / diag;
        }
    }

    // Forward substitution: L z = b.
    for i in 0..p {
        let mut value = b[i];
        for k in 0..i {
            value -= a[i * p + k] * b[k];
        }
        b[i] = value / a[i * p + i];
    }

    // Back substitution: L^T x = z.
    let mut x = vec![0.0f64; p];
    for i in (0..p).rev() {
        let mut value = b[i];
        for k in (i + 1)..p {
            value -= a[k * p + i] * x[k];
        }
        x[i] = value / a[i * p + i];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ols_recovers_line() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).expect("matrix");
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).expect("fit");
        let predictions = model.predict(&x).expect("predict");

        for (pred, truth) in predictions.as_slice().iter().zip(y.as_slice()) {
            assert!((pred - truth).abs() < 1e-3, "got {pred}, want {truth}");
        }
    }

    #[test]
    fn test_ols_without_intercept() {
        // y = 3x through the origin.
        let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).expect("matrix");
        let y = Vector::from_slice(&[3.0, 6.0, 9.0]);

        let mut model = LinearRegression::new().with_intercept(false);
        model.fit(&x, &y).expect("fit");
        let predictions = model.predict(&x).expect("predict");
        assert!((predictions.get(2) - 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_ols_singular_matrix() {
        let x = Matrix::from_vec(3, 1, vec![0.0, 0.0, 0.0]).expect("matrix");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0]);

        let mut model = LinearRegression::new().with_intercept(false);
        let err = model.fit(&x, &y).unwrap_err();
        assert!(err.to_string().contains("Singular"));
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let x = Matrix::from_vec(1, 1, vec![1.0]).expect("matrix");
        assert!(LinearRegression::new().predict(&x).is_err());
        assert!(Ridge::new().predict(&x).is_err());
    }

    #[test]
    fn test_ridge_approximates_line() {
        let x = Matrix::from_vec(8, 1, (1..=8).map(|i| i as f32 / 4.0).collect()).expect("matrix");
        let y = Vector::from_vec(x.as_slice().iter().map(|v| 2.0 * v + 1.0).collect());

        let mut model = Ridge::new()
            .with_alpha(1e-4)
            .with_learning_rate(0.1)
            .with_max_iter(5000)
            .with_tol(1e-5);
        model.set_random_state(42);
        model.fit(&x, &y).expect("fit");

        let predictions = model.predict(&x).expect("predict");
        for (pred, truth) in predictions.as_slice().iter().zip(y.as_slice()) {
            assert!((pred - truth).abs() < 0.1, "got {pred}, want {truth}");
        }
    }

    #[test]
    fn test_ridge_reports_iterations() {
        let x = Matrix::from_vec(4, 1, vec![0.1, 0.2, 0.3, 0.4]).expect("matrix");
        let y = Vector::from_slice(&[0.2, 0.4, 0.6, 0.8]);

        let mut model = Ridge::new().with_max_iter(50);
        model.set_random_state(0);
        assert!(model.n_iter().is_none());
        model.fit(&x, &y).expect("fit");

        let n_iter = model.n_iter().expect("iterations recorded");
        assert!(n_iter >= 1 && n_iter <= 50);
    }

    #[test]
    fn test_ridge_seeded_fit_is_reproducible() {
        let x = Matrix::from_vec(4, 2, vec![1.0, 0.5, 2.0, 1.0, 3.0, 1.5, 4.0, 2.0])
            .expect("matrix");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let mut a = Ridge::new().with_max_iter(100);
        a.set_random_state(42);
        a.fit(&x, &y).expect("fit a");

        let mut b = Ridge::new().with_max_iter(100);
        b.set_random_state(42);
        b.fit(&x, &y).expect("fit b");

        assert_eq!(a.predict(&x).expect("a"), b.predict(&x).expect("b"));
    }
}

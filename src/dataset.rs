//! Synthetic dataset generation.
//!
//! Generators are resolved by name from a fixed registry, mirroring the
//! way benchmark configs reference a generation procedure as data. Shape
//! is always deterministic; content randomness follows the optional
//! `random_state` parameter.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{MedirError, Result};
use crate::grid::ParamValue;
use crate::primitives::{Matrix, Vector};

/// Free-form extra parameters forwarded to a generator.
pub type GenParams = BTreeMap<String, ParamValue>;

/// Generates a feature matrix of shape (`n_samples`, `n_features`) and a
/// target vector of length `n_samples` with the named procedure.
///
/// Recognized generators:
/// - `make_regression`: linear signal plus Gaussian noise
///   (params: `noise`, `bias`, `random_state`)
/// - `make_classification`: two classes separated along a random
///   direction (params: `class_sep`, `random_state`)
/// - `make_blobs`: isotropic Gaussian clusters, target is the cluster
///   index (params: `centers`, `cluster_std`, `random_state`)
///
/// # Errors
///
/// Returns `UnknownGenerator` for an unregistered id, `InvalidSpec` for
/// non-positive shape parameters or unrecognized/mistyped extra params.
pub fn generate(
    generator: &str,
    n_samples: usize,
    n_features: usize,
    params: &GenParams,
) -> Result<(Matrix<f32>, Vector<f32>)> {
    if n_samples == 0 {
        return Err(MedirError::invalid_spec("n_samples must be positive"));
    }
    if n_features == 0 {
        return Err(MedirError::invalid_spec("n_features must be positive"));
    }

    match generator {
        "make_regression" => make_regression(n_samples, n_features, params),
        "make_classification" => make_classification(n_samples, n_features, params),
        "make_blobs" => make_blobs(n_samples, n_features, params),
        _ => Err(MedirError::UnknownGenerator {
            generator: generator.to_string(),
        }),
    }
}

fn make_regression(
    n_samples: usize,
    n_features: usize,
    params: &GenParams,
) -> Result<(Matrix<f32>, Vector<f32>)> {
    reject_unknown(params, &["noise", "bias", "random_state"])?;
    let noise = float_param(params, "noise", 0.0)? as f32;
    let bias = float_param(params, "bias", 0.0)? as f32;
    let mut rng = rng_from(params)?;

    let weights: Vec<f32> = (0..n_features).map(|_| sample_normal(&mut rng)).collect();

    let mut x_data = Vec::with_capacity(n_samples * n_features);
    let mut y_data = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let mut signal = bias;
        for w in &weights {
            let value = sample_normal(&mut rng);
            signal += w * value;
            x_data.push(value);
        }
        y_data.push(signal + noise * sample_normal(&mut rng));
    }

    let x = Matrix::from_vec(n_samples, n_features, x_data).map_err(MedirError::from)?;
    Ok((x, Vector::from_vec(y_data)))
}

fn make_classification(
    n_samples: usize,
    n_features: usize,
    params: &GenParams,
) -> Result<(Matrix<f32>, Vector<f32>)> {
    reject_unknown(params, &["class_sep", "random_state"])?;
    let class_sep = float_param(params, "class_sep", 1.0)? as f32;
    let mut rng = rng_from(params)?;

    // Random unit direction along which the two classes separate.
    let mut direction: Vec<f32> = (0..n_features).map(|_| sample_normal(&mut rng)).collect();
    let norm = direction.iter().map(|v| v * v).sum::<f32>().sqrt().max(1e-6);
    for v in &mut direction {
        *v /= norm;
    }

    let mut x_data = Vec::with_capacity(n_samples * n_features);
    let mut y_data = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let label = rng.gen_bool(0.5);
        let sign = if label { 1.0 } else { -1.0 };
        for d in &direction {
            x_data.push(sample_normal(&mut rng) + sign * class_sep * d);
        }
        y_data.push(if label { 1.0 } else { 0.0 });
    }

    let x = Matrix::from_vec(n_samples, n_features, x_data).map_err(MedirError::from)?;
    Ok((x, Vector::from_vec(y_data)))
}

fn make_blobs(
    n_samples: usize,
    n_features: usize,
    params: &GenParams,
) -> Result<(Matrix<f32>, Vector<f32>)> {
    reject_unknown(params, &["centers", "cluster_std", "random_state"])?;
    let centers = usize_param(params, "centers", 3)?;
    let cluster_std = float_param(params, "cluster_std", 1.0)? as f32;
    if centers == 0 {
        return Err(MedirError::invalid_spec("centers must be positive"));
    }
    let mut rng = rng_from(params)?;

    let centroids: Vec<Vec<f32>> = (0..centers)
        .map(|_| (0..n_features).map(|_| rng.gen_range(-10.0..10.0)).collect())
        .collect();

    let mut x_data = Vec::with_capacity(n_samples * n_features);
    let mut y_data = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let cluster = rng.gen_range(0..centers);
        for &c in &centroids[cluster] {
            x_data.push(c + cluster_std * sample_normal(&mut rng));
        }
        y_data.push(cluster as f32);
    }

    let x = Matrix::from_vec(n_samples, n_features, x_data).map_err(MedirError::from)?;
    Ok((x, Vector::from_vec(y_data)))
}

/// Standard normal draw via Box-Muller.
fn sample_normal(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

fn rng_from(params: &GenParams) -> Result<StdRng> {
    match params.get("random_state") {
        None => Ok(StdRng::from_entropy()),
        Some(value) => {
            let seed = value.as_i64().and_then(|v| u64::try_from(v).ok());
            seed.map(StdRng::seed_from_u64).ok_or_else(|| {
                MedirError::invalid_spec(format!(
                    "random_state must be a non-negative integer, got {value}"
                ))
            })
        }
    }
}

fn float_param(params: &GenParams, name: &str, default: f64) -> Result<f64> {
    match params.get(name) {
        None => Ok(default),
        Some(value) => value.as_f64().ok_or_else(|| {
            MedirError::invalid_spec(format!("{name} must be numeric, got {value}"))
        }),
    }
}

fn usize_param(params: &GenParams, name: &str, default: usize) -> Result<usize> {
    match params.get(name) {
        None => Ok(default),
        Some(value) => value.as_usize().ok_or_else(|| {
            MedirError::invalid_spec(format!(
                "{name} must be a non-negative integer, got {value}"
            ))
        }),
    }
}

fn reject_unknown(params: &GenParams, allowed: &[&str]) -> Result<()> {
    for name in params.keys() {
        if !allowed.contains(&name.as_str()) {
            return Err(MedirError::invalid_spec(format!(
                "unknown generator parameter '{name}'"
            )));
        }
    }
    Ok(())
}

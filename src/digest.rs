//! Content-derived identity keys for benchmark rows.
//!
//! Two independently produced result tables are join-able row-for-row
//! because every row carries digests computed from plain, canonicalized
//! values only: the sorted (name, value) set of a parameter combination,
//! or a (n_samples, n_features) dimension tuple. Estimator objects and
//! library internals never enter the hash, so semantically equal inputs
//! digest identically across processes and libraries.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::grid::{ParamSet, ParamValue};

/// Hex width of every identity digest.
pub const DIGEST_WIDTH: usize = 16;

/// Digest of a parameter combination.
///
/// Depends only on the sorted (name, value) set; insertion order is
/// irrelevant. Typed canonical encoding keeps `Int(1)` distinct from
/// `Float(1.0)`.
///
/// # Examples
///
/// ```
/// use medir::digest::params_digest;
/// use medir::grid::{ParamSet, ParamValue};
///
/// let a = ParamSet::from_entries(vec![
///     ("alpha".to_string(), ParamValue::Float(0.1)),
///     ("tol".to_string(), ParamValue::Float(0.001)),
/// ]);
/// let b = ParamSet::from_entries(vec![
///     ("tol".to_string(), ParamValue::Float(0.001)),
///     ("alpha".to_string(), ParamValue::Float(0.1)),
/// ]);
/// assert_eq!(params_digest(&a), params_digest(&b));
/// ```
#[must_use]
pub fn params_digest(params: &ParamSet) -> String {
    let canonical: Vec<Value> = params
        .sorted_entries()
        .into_iter()
        .map(|(name, value)| Value::Array(vec![Value::from(name), canonical_value(value)]))
        .collect();
    short_hash(Value::Array(canonical).to_string().as_bytes())
}

/// Digest of a (n_samples, n_features) dimension tuple.
#[must_use]
pub fn dims_digest(n_samples: usize, n_features: usize) -> String {
    let dims = Value::Array(vec![
        Value::from(n_samples as u64),
        Value::from(n_features as u64),
    ]);
    short_hash(dims.to_string().as_bytes())
}

/// Derives a stable u64 seed from a text label (e.g. an estimator name).
///
/// Used to seed the train/test split identically across libraries
/// benchmarking the same estimator.
#[must_use]
pub fn seed_from_label(label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    let bytes = hasher.finalize();
    let mut seed = 0u64;
    for &b in bytes.iter().take(8) {
        seed = (seed << 8) | u64::from(b);
    }
    seed
}

/// Typed canonical form of one parameter value.
///
/// Non-finite floats have no JSON number representation and fall back to
/// their Debug text, which is still deterministic.
fn canonical_value(value: &ParamValue) -> Value {
    let (tag, inner) = match value {
        ParamValue::Int(v) => ("i", Value::from(*v)),
        ParamValue::Float(v) => (
            "f",
            serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(format!("{v:?}"))),
        ),
        ParamValue::Bool(v) => ("b", Value::from(*v)),
        ParamValue::Str(v) => ("s", Value::from(v.as_str())),
    };
    let mut map = Map::new();
    map.insert(tag.to_string(), inner);
    Value::Object(map)
}

fn short_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .take(DIGEST_WIDTH / 2)
        .map(|b| format!("{b:02x}"))
        .collect()
}

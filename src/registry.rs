//! Registry mapping target references to benchmark subjects.
//!
//! A target reference is a `"<lib>.<name>"` string; the segment before the
//! first dot is the library id that tags every result row. The registry
//! replaces any dynamic lookup: an unregistered reference is a hard
//! resolution error, never a fallback.

use std::collections::BTreeMap;

use crate::error::{MedirError, Result};
use crate::grid::{ParamSet, ParamValue};
use crate::linear_model::{LinearRegression, Ridge};
use crate::preprocessing::StandardScaler;
use crate::primitives::{Matrix, Vector};
use crate::traits::{Estimator, Transformer};

/// The operation kinds a benchmark row can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fit,
    Predict,
    Transform,
}

impl Operation {
    /// Stable text form used in persisted tables and artifact names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Predict => "predict",
            Self::Transform => "transform",
        }
    }

    /// Parses the text form back.
    ///
    /// # Errors
    ///
    /// Returns an error for any other string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "fit" => Ok(Self::Fit),
            "predict" => Ok(Self::Predict),
            "transform" => Ok(Self::Transform),
            _ => Err(MedirError::invalid_spec(format!(
                "unknown operation kind '{s}'"
            ))),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a subject's inference operation.
#[derive(Debug, Clone)]
pub enum Inference {
    /// Target predictions from an estimator.
    Predictions(Vector<f32>),
    /// Transformed features from a transformer.
    Transformed(Matrix<f32>),
}

/// A benchmark subject: the capability set the orchestrator times.
///
/// Either arm owns its model state exclusively for the duration of one
/// parameter combination's timing sequence: fit once, then run the
/// inference operation against shrinking test prefixes.
pub enum Subject {
    /// Supervised estimator (fit + predict).
    Predictor(Box<dyn Estimator>),
    /// Data transformer (fit + transform).
    Processor(Box<dyn Transformer>),
}

impl std::fmt::Debug for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Predictor(_) => f.debug_tuple("Predictor").finish_non_exhaustive(),
            Self::Processor(_) => f.debug_tuple("Processor").finish_non_exhaustive(),
        }
    }
}

impl Subject {
    /// Fits the subject on training data; transformers ignore the targets.
    ///
    /// # Errors
    ///
    /// Propagates the underlying fit failure unmodified.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        match self {
            Self::Predictor(estimator) => estimator.fit(x, y),
            Self::Processor(transformer) => transformer.fit(x),
        }
    }

    /// Runs the subject's inference operation.
    ///
    /// # Errors
    ///
    /// Propagates the underlying predict/transform failure unmodified.
    pub fn run_inference(&self, x: &Matrix<f32>) -> Result<Inference> {
        match self {
            Self::Predictor(estimator) => estimator.predict(x).map(Inference::Predictions),
            Self::Processor(transformer) => transformer.transform(x).map(Inference::Transformed),
        }
    }

    /// Which operation [`Subject::run_inference`] performs.
    #[must_use]
    pub fn inference_operation(&self) -> Operation {
        match self {
            Self::Predictor(_) => Operation::Predict,
            Self::Processor(_) => Operation::Transform,
        }
    }

    /// Fixes internal randomness so repeated timings are comparable.
    pub fn set_random_state(&mut self, seed: u64) {
        if let Self::Predictor(estimator) = self {
            estimator.set_random_state(seed);
        }
    }

    /// Iterations consumed by the last fit, when the solver is iterative.
    #[must_use]
    pub fn n_iter(&self) -> Option<u64> {
        match self {
            Self::Predictor(estimator) => estimator.n_iter(),
            Self::Processor(_) => None,
        }
    }
}

/// Constructs a subject from one parameter combination.
pub type SubjectBuilder = fn(&ParamSet) -> Result<Subject>;

/// Maps target references to subject constructors.
#[derive(Default)]
pub struct Registry {
    builders: BTreeMap<String, SubjectBuilder>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in subjects
    /// (`medir.linear_regression`, `medir.ridge`, `medir.standard_scaler`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("medir.linear_regression", build_linear_regression);
        registry.register("medir.ridge", build_ridge);
        registry.register("medir.standard_scaler", build_standard_scaler);
        registry
    }

    /// Registers (or replaces) a target reference.
    pub fn register(&mut self, target: impl Into<String>, builder: SubjectBuilder) {
        self.builders.insert(target.into(), builder);
    }

    /// Returns true if the target reference is registered.
    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.builders.contains_key(target)
    }

    /// Builds a subject for `target` configured with `params`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTarget` for an unregistered reference, or the
    /// builder's own error for bad parameters.
    pub fn build(&self, target: &str, params: &ParamSet) -> Result<Subject> {
        let builder = self
            .builders
            .get(target)
            .ok_or_else(|| MedirError::UnknownTarget {
                target: target.to_string(),
            })?;
        builder(params)
    }
}

/// The library id of a target reference: the segment before the first dot.
#[must_use]
pub fn library_id(target: &str) -> &str {
    target.split('.').next().unwrap_or(target)
}

fn float_hyperparam(name: &str, value: &ParamValue) -> Result<f32> {
    value.as_f64().map(|v| v as f32).ok_or_else(|| {
        MedirError::invalid_spec(format!("hyperparameter '{name}' must be numeric, got {value}"))
    })
}

fn build_linear_regression(params: &ParamSet) -> Result<Subject> {
    let mut model = LinearRegression::new();
    for (name, value) in params.iter() {
        match name {
            "fit_intercept" => {
                let flag = value.as_bool().ok_or_else(|| {
                    MedirError::invalid_spec(format!(
                        "hyperparameter 'fit_intercept' must be a bool, got {value}"
                    ))
                })?;
                model = model.with_intercept(flag);
            }
            _ => {
                return Err(MedirError::invalid_spec(format!(
                    "unknown hyperparameter '{name}' for medir.linear_regression"
                )))
            }
        }
    }
    Ok(Subject::Predictor(Box::new(model)))
}

fn build_ridge(params: &ParamSet) -> Result<Subject> {
    let mut model = Ridge::new();
    for (name, value) in params.iter() {
        match name {
            "alpha" => model = model.with_alpha(float_hyperparam(name, value)?),
            "learning_rate" => model = model.with_learning_rate(float_hyperparam(name, value)?),
            "tol" => model = model.with_tol(float_hyperparam(name, value)?),
            "max_iter" => {
                let max_iter = value.as_i64().and_then(|v| u64::try_from(v).ok()).ok_or_else(
                    || {
                        MedirError::invalid_spec(format!(
                            "hyperparameter 'max_iter' must be a non-negative integer, got {value}"
                        ))
                    },
                )?;
                model = model.with_max_iter(max_iter);
            }
            _ => {
                return Err(MedirError::invalid_spec(format!(
                    "unknown hyperparameter '{name}' for medir.ridge"
                )))
            }
        }
    }
    Ok(Subject::Predictor(Box::new(model)))
}

fn build_standard_scaler(params: &ParamSet) -> Result<Subject> {
    if let Some((name, _)) = params.iter().next() {
        return Err(MedirError::invalid_spec(format!(
            "unknown hyperparameter '{name}' for medir.standard_scaler"
        )));
    }
    Ok(Subject::Processor(Box::new(StandardScaler::new())))
}

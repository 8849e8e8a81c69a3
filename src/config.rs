//! Benchmark configuration structs.
//!
//! The external loader (CLI + YAML file handling) deserializes into these
//! types; everything algorithmic about a config (inheritance resolution,
//! scientific-notation normalization, eager validation) lives here so a
//! malformed spec fails before any dataset generation or timing.

use std::fmt;

use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dataset::GenParams;
use crate::error::{MedirError, Result};
use crate::grid::{HyperGrid, ParamValue};
use crate::metrics;

/// One synthetic dataset family a benchmark runs against.
///
/// Sample counts accept integers, whole floats, or scientific-notation
/// strings (`"1e4"`), since configs routinely write sizes that way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSpec {
    /// Generator id resolved by [`crate::dataset::generate`].
    pub sample_generator: String,
    /// Number of features in every generated matrix.
    #[serde(deserialize_with = "de_count")]
    pub n_features: usize,
    /// Training sizes to benchmark, in config order.
    #[serde(deserialize_with = "de_counts")]
    pub n_samples_train: Vec<usize>,
    /// Test sizes to benchmark; consumed in descending order.
    #[serde(deserialize_with = "de_counts")]
    pub n_samples_test: Vec<usize>,
    /// Extra generator parameters.
    #[serde(default)]
    pub params: GenParams,
}

impl DatasetSpec {
    /// Test sizes sorted descending, the consumption order that lets every
    /// smaller test split reuse a prefix of the largest one.
    #[must_use]
    pub fn test_sizes_desc(&self) -> Vec<usize> {
        let mut sizes = self.n_samples_test.clone();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }

    /// The largest requested test size.
    #[must_use]
    pub fn max_test_size(&self) -> usize {
        self.n_samples_test.iter().copied().max().unwrap_or(0)
    }

    fn validate(&self) -> Result<()> {
        if self.sample_generator.is_empty() {
            return Err(MedirError::invalid_spec("sample_generator must be set"));
        }
        if self.n_features == 0 {
            return Err(MedirError::invalid_spec("n_features must be positive"));
        }
        for (label, sizes) in [
            ("n_samples_train", &self.n_samples_train),
            ("n_samples_test", &self.n_samples_test),
        ] {
            if sizes.is_empty() {
                return Err(MedirError::invalid_spec(format!("{label} must not be empty")));
            }
            if sizes.iter().any(|&s| s == 0) {
                return Err(MedirError::invalid_spec(format!(
                    "{label} entries must be positive"
                )));
            }
            let mut sorted = sizes.clone();
            sorted.sort_unstable();
            sorted.dedup();
            if sorted.len() != sizes.len() {
                return Err(MedirError::invalid_spec(format!(
                    "{label} entries must be unique"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration of one estimator's benchmark.
///
/// The `name` tags every result row and names the persisted table; two
/// entries benchmarking the same estimator in different libraries share a
/// name (usually via `inherit`) so their tables join downstream.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EstimatorConfig {
    /// Estimator name rows are tagged with.
    #[serde(default)]
    pub name: String,
    /// Target implementation reference, `"<lib>.<name>"`.
    pub estimator: String,
    /// Adopt another estimator's metrics/grid/datasets, keeping this target.
    #[serde(default)]
    pub inherit: Option<String>,
    /// Metric names attached to inference rows.
    #[serde(default)]
    pub metrics: Vec<String>,
    /// Hyperparameter grid; empty means one unparameterized run.
    #[serde(default)]
    pub hyperparameters: HyperGrid,
    /// Dataset families to benchmark against.
    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
}

impl EstimatorConfig {
    /// Validates the config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSpec` for malformed fields and `UnknownMetric` for
    /// an unregistered metric name, both before any heavy work.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(MedirError::invalid_spec("name should not be an empty string"));
        }
        let (lib, rest) = self
            .estimator
            .split_once('.')
            .ok_or_else(|| MedirError::invalid_spec("estimator should be a '<lib>.<name>' reference"))?;
        if lib.is_empty() || rest.is_empty() {
            return Err(MedirError::invalid_spec(
                "estimator should be a '<lib>.<name>' reference",
            ));
        }
        if self.inherit.is_some() {
            return Err(MedirError::invalid_spec(format!(
                "estimator '{}' has unresolved inheritance; call resolve_inherit first",
                self.name
            )));
        }
        for metric in &self.metrics {
            if !metrics::is_known(metric) {
                return Err(MedirError::UnknownMetric {
                    metric: metric.clone(),
                });
            }
        }
        self.hyperparameters.validate()?;
        if self.datasets.is_empty() {
            return Err(MedirError::invalid_spec(format!(
                "estimator '{}' has no datasets",
                self.name
            )));
        }
        for dataset in &self.datasets {
            dataset.validate()?;
        }
        Ok(())
    }
}

/// A full benchmark configuration: named estimators in config order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchConfig {
    /// (name, config) pairs in the order the config file lists them.
    #[serde(
        deserialize_with = "de_ordered_estimators",
        serialize_with = "ser_ordered_estimators"
    )]
    pub estimators: Vec<(String, EstimatorConfig)>,
}

impl BenchConfig {
    /// Resolves `inherit` references: a child adopts the parent's name,
    /// metrics, grid and datasets while keeping its own target reference.
    /// Sharing the parent's name is what lets the two libraries' tables
    /// join downstream.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSpec` if a parent is missing or itself inherits.
    pub fn resolve_inherit(&mut self) -> Result<()> {
        let snapshot: Vec<(String, EstimatorConfig)> = self.estimators.clone();
        for (entry, config) in &mut self.estimators {
            let Some(parent_entry) = config.inherit.take() else {
                continue;
            };
            let parent = snapshot
                .iter()
                .find(|(n, _)| *n == parent_entry)
                .map(|(_, c)| c)
                .ok_or_else(|| {
                    MedirError::invalid_spec(format!(
                        "entry '{entry}' inherits from unknown entry '{parent_entry}'"
                    ))
                })?;
            if parent.inherit.is_some() {
                return Err(MedirError::invalid_spec(format!(
                    "entry '{entry}' inherits from '{parent_entry}', which itself inherits"
                )));
            }
            config.name = parent.name.clone();
            config.metrics = parent.metrics.clone();
            config.hyperparameters = parent.hyperparameters.clone();
            config.datasets = parent.datasets.clone();
        }
        Ok(())
    }

    /// Normalizes scientific-notation string candidates in every grid:
    /// `"1e3"` becomes `Int(1000)`, `"1e-3"` becomes `Float(0.001)`.
    pub fn normalize(&mut self) {
        for (_, config) in &mut self.estimators {
            for (_, values) in config.hyperparameters.entries_mut() {
                for value in values {
                    if let ParamValue::Str(s) = value {
                        if let Some(normalized) = normalize_scientific(s) {
                            *value = normalized;
                        }
                    }
                }
            }
        }
    }

    /// Validates every estimator eagerly, including that no two entries
    /// would persist to the same (library, name) table.
    ///
    /// # Errors
    ///
    /// Returns the first validation/resolution error found.
    pub fn validate(&self) -> Result<()> {
        if self.estimators.is_empty() {
            return Err(MedirError::invalid_spec("config lists no estimators"));
        }
        let mut outputs = Vec::with_capacity(self.estimators.len());
        for (entry, config) in &self.estimators {
            config.validate()?;
            let lib = config
                .estimator
                .split('.')
                .next()
                .unwrap_or(config.estimator.as_str());
            let output = (lib.to_string(), config.name.clone());
            if outputs.contains(&output) {
                return Err(MedirError::invalid_spec(format!(
                    "entry '{entry}' repeats the ({lib}, {}) result table",
                    config.name
                )));
            }
            outputs.push(output);
        }
        Ok(())
    }
}

/// Parses a scientific-notation string: non-negative exponent yields an
/// integer, negative exponent a float. Anything else is left alone.
fn normalize_scientific(s: &str) -> Option<ParamValue> {
    let lower = s.to_ascii_lowercase();
    let (mantissa, exponent) = lower.split_once('e')?;
    if mantissa.is_empty() || exponent.is_empty() {
        return None;
    }
    let digits_only =
        |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit() || c == '.');
    let negative = exponent.starts_with('-');
    let exponent_digits = exponent.strip_prefix('-').unwrap_or(exponent);
    if !digits_only(mantissa) || !exponent_digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: f64 = lower.parse().ok()?;
    if negative {
        Some(ParamValue::Float(value))
    } else {
        Some(ParamValue::Int(value as i64))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(u64),
    Float(f64),
    Str(String),
}

fn count_from(raw: &RawCount) -> std::result::Result<usize, String> {
    match raw {
        RawCount::Int(v) => Ok(*v as usize),
        RawCount::Float(v) => {
            if v.is_finite() && *v >= 0.0 && v.fract() == 0.0 {
                Ok(*v as usize)
            } else {
                Err(format!("expected a whole sample count, got {v}"))
            }
        }
        RawCount::Str(s) => {
            let value: f64 = s
                .parse()
                .map_err(|_| format!("expected a sample count, got '{s}'"))?;
            if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
                Ok(value as usize)
            } else {
                Err(format!("expected a whole sample count, got '{s}'"))
            }
        }
    }
}

fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<usize, D::Error> {
    let raw = RawCount::deserialize(deserializer)?;
    count_from(&raw).map_err(DeError::custom)
}

fn de_counts<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<usize>, D::Error> {
    let raw = Vec::<RawCount>::deserialize(deserializer)?;
    raw.iter()
        .map(|r| count_from(r).map_err(DeError::custom))
        .collect()
}

fn de_ordered_estimators<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<(String, EstimatorConfig)>, D::Error> {
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, EstimatorConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a map of estimator name to estimator config")
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut map: A,
        ) -> std::result::Result<Self::Value, A::Error> {
            let mut estimators = Vec::new();
            while let Some(entry) = map.next_entry::<String, EstimatorConfig>()? {
                estimators.push(entry);
            }
            Ok(estimators)
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}

fn ser_ordered_estimators<S: Serializer>(
    estimators: &[(String, EstimatorConfig)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(estimators.len()))?;
    for (name, config) in estimators {
        map.serialize_entry(name, config)?;
    }
    map.end()
}

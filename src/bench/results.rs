//! Benchmark rows and their persisted flat-table form.
//!
//! One [`ResultTable`] holds every row produced for one (estimator,
//! library) pair, in enumeration order. Persistence is one CSV per table:
//! fixed columns first, then metric-score columns, hyperparameter-value
//! columns, and an iteration-count column when any row reports one.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{MedirError, Result};
use crate::grid::{ParamSet, ParamValue};
use crate::metrics;
use crate::registry::Operation;

const FIXED_COLUMNS: [&str; 9] = [
    "estimator",
    "lib",
    "function",
    "mean",
    "stdev",
    "n_samples",
    "n_features",
    "hyperparams_digest",
    "dims_digest",
];

/// One timed operation's result row.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRow {
    /// Estimator name from the config.
    pub estimator: String,
    /// Library id the target reference belongs to.
    pub lib: String,
    /// Which operation was timed.
    pub operation: Operation,
    /// Mean latency in seconds.
    pub mean: f64,
    /// Latency standard deviation in seconds.
    pub stdev: f64,
    /// Sample count the operation ran against.
    pub n_samples: usize,
    /// Feature count of the dataset.
    pub n_features: usize,
    /// Identity digest of the parameter combination.
    pub hyperparams_digest: String,
    /// Identity digest of (n_samples, n_features).
    pub dims_digest: String,
    /// Metric scores, empty for fit rows.
    pub scores: Vec<(String, f64)>,
    /// The concrete hyperparameter values of this row.
    pub params: ParamSet,
    /// Iteration count reported by an iterative solver.
    pub n_iter: Option<u64>,
}

/// Ordered rows for one (estimator, library) pair.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    estimator: String,
    lib: String,
    rows: Vec<BenchmarkRow>,
    seen: HashSet<(String, String, Operation)>,
}

impl ResultTable {
    /// Creates an empty table for one (estimator, library) pair.
    #[must_use]
    pub fn new(estimator: impl Into<String>, lib: impl Into<String>) -> Self {
        Self {
            estimator: estimator.into(),
            lib: lib.into(),
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Estimator name this table belongs to.
    #[must_use]
    pub fn estimator(&self) -> &str {
        &self.estimator
    }

    /// Library id this table belongs to.
    #[must_use]
    pub fn lib(&self) -> &str {
        &self.lib
    }

    /// The rows, in enumeration order.
    #[must_use]
    pub fn rows(&self) -> &[BenchmarkRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, enforcing table identity and the uniqueness of
    /// (hyperparams_digest, dims_digest, operation).
    ///
    /// # Errors
    ///
    /// Returns `InvalidSpec` on identity mismatch or a duplicate tuple.
    pub fn push(&mut self, row: BenchmarkRow) -> Result<()> {
        if row.estimator != self.estimator || row.lib != self.lib {
            return Err(MedirError::invalid_spec(format!(
                "row identity ({}, {}) does not match table ({}, {})",
                row.estimator, row.lib, self.estimator, self.lib
            )));
        }
        let key = (
            row.hyperparams_digest.clone(),
            row.dims_digest.clone(),
            row.operation,
        );
        if !self.seen.insert(key) {
            return Err(MedirError::invalid_spec(format!(
                "duplicate row for digests ({}, {}) operation {}",
                row.hyperparams_digest, row.dims_digest, row.operation
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Writes the table to `path` as CSV.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or CSV failure.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let metric_names = self.collect_names(|row| {
            row.scores.iter().map(|(name, _)| name.as_str()).collect()
        });
        let param_names =
            self.collect_names(|row| row.params.iter().map(|(name, _)| name).collect());
        let has_n_iter = self.rows.iter().any(|row| row.n_iter.is_some());

        let mut writer = csv::Writer::from_path(path)?;

        let mut header: Vec<&str> = FIXED_COLUMNS.to_vec();
        header.extend(metric_names.iter().map(String::as_str));
        header.extend(param_names.iter().map(String::as_str));
        if has_n_iter {
            header.push("n_iter");
        }
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record: Vec<String> = vec![
                row.estimator.clone(),
                row.lib.clone(),
                row.operation.as_str().to_string(),
                row.mean.to_string(),
                row.stdev.to_string(),
                row.n_samples.to_string(),
                row.n_features.to_string(),
                row.hyperparams_digest.clone(),
                row.dims_digest.clone(),
            ];
            for name in &metric_names {
                let cell = row
                    .scores
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default();
                record.push(cell);
            }
            for name in &param_names {
                let cell = row
                    .params
                    .get(name)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                record.push(cell);
            }
            if has_n_iter {
                record.push(row.n_iter.map(|v| v.to_string()).unwrap_or_default());
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Loads a table previously written by [`ResultTable::write_csv`].
    ///
    /// Columns outside the fixed set are classified by name: registered
    /// metric names become scores, `n_iter` becomes the iteration count,
    /// everything else is a hyperparameter value.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O, CSV, or malformed cell content.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let index_of = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                MedirError::invalid_spec(format!("result table is missing column '{name}'"))
            })
        };
        let fixed: Vec<usize> = FIXED_COLUMNS
            .iter()
            .map(|name| index_of(name))
            .collect::<Result<_>>()?;

        let mut table: Option<Self> = None;
        for record in reader.records() {
            let record = record?;
            let cell = |i: usize| record.get(fixed[i]).unwrap_or_default();

            let mut row = BenchmarkRow {
                estimator: cell(0).to_string(),
                lib: cell(1).to_string(),
                operation: Operation::parse(cell(2))?,
                mean: parse_f64("mean", cell(3))?,
                stdev: parse_f64("stdev", cell(4))?,
                n_samples: parse_usize("n_samples", cell(5))?,
                n_features: parse_usize("n_features", cell(6))?,
                hyperparams_digest: cell(7).to_string(),
                dims_digest: cell(8).to_string(),
                scores: Vec::new(),
                params: ParamSet::empty(),
                n_iter: None,
            };

            let mut params = Vec::new();
            for (i, header) in headers.iter().enumerate() {
                if fixed.contains(&i) {
                    continue;
                }
                let value = record.get(i).unwrap_or_default();
                if value.is_empty() {
                    continue;
                }
                if header == "n_iter" {
                    row.n_iter = Some(parse_usize("n_iter", value)? as u64);
                } else if metrics::is_known(header) {
                    row.scores.push((header.to_string(), parse_f64(header, value)?));
                } else {
                    params.push((header.to_string(), parse_param(value)));
                }
            }
            row.params = ParamSet::from_entries(params);

            let table = table.get_or_insert_with(|| Self::new(&row.estimator, &row.lib));
            table.push(row)?;
        }

        Ok(table.unwrap_or_default())
    }
}

impl ResultTable {
    /// Collects names in first-seen order across rows.
    fn collect_names(&self, extract: impl Fn(&BenchmarkRow) -> Vec<&str>) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for name in extract(row) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}

/// File name of the persisted table for one (library, estimator) pair.
#[must_use]
pub fn table_file_name(lib: &str, estimator: &str) -> String {
    format!("{lib}_{estimator}.csv")
}

fn parse_f64(column: &str, value: &str) -> Result<f64> {
    value.parse().map_err(|_| {
        MedirError::invalid_spec(format!("column '{column}' holds non-numeric value '{value}'"))
    })
}

fn parse_usize(column: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        MedirError::invalid_spec(format!("column '{column}' holds non-integer value '{value}'"))
    })
}

/// Reconstructs a hyperparameter value from its CSV text.
fn parse_param(value: &str) -> ParamValue {
    if let Ok(v) = value.parse::<i64>() {
        return ParamValue::Int(v);
    }
    if let Ok(v) = value.parse::<f64>() {
        return ParamValue::Float(v);
    }
    match value {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => ParamValue::Str(value.to_string()),
    }
}

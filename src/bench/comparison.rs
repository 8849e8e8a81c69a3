//! Joining two result tables into speedup comparisons.
//!
//! The baseline and alternate tables are assumed to come from identical
//! dataset/grid definitions in identical enumeration order, so the join is
//! positional: row i of the baseline against row i of the alternate. The
//! precondition is not re-validated here; only the row counts are checked.

use std::path::Path;

use crate::bench::results::{table_file_name, BenchmarkRow, ResultTable};
use crate::error::{MedirError, Result};

/// One joined row: the baseline row plus the alternate's timing fields and
/// the computed speedup. Exists only transiently inside a comparison.
#[derive(Debug, Clone)]
pub struct ComparisonRow {
    /// The baseline library's full row.
    pub baseline: BenchmarkRow,
    /// Mean latency of the alternate library's matching row.
    pub against_mean: f64,
    /// Latency stdev of the alternate library's matching row.
    pub against_stdev: f64,
    /// Metric scores of the alternate library's matching row.
    pub against_scores: Vec<(String, f64)>,
    /// `baseline.mean / against.mean`; above 1 means the baseline is slower.
    pub speedup: f64,
    /// Relative standard deviation of the speedup estimate, from
    /// first-order propagation of the two relative uncertainties.
    pub stdev_speedup: f64,
}

/// Joins two equally-shaped result tables row-for-row.
///
/// # Errors
///
/// Returns `ShapeMismatch` when row counts differ; no partial join is
/// produced.
///
/// # Examples
///
/// ```
/// use medir::bench::comparison::compare;
/// use medir::bench::results::ResultTable;
///
/// let baseline = ResultTable::new("ridge", "medir");
/// let against = ResultTable::new("ridge", "otherlib");
/// assert!(compare(&baseline, &against).unwrap().is_empty());
/// ```
pub fn compare(baseline: &ResultTable, against: &ResultTable) -> Result<Vec<ComparisonRow>> {
    if baseline.len() != against.len() {
        return Err(MedirError::ShapeMismatch {
            expected: format!("{} rows", baseline.len()),
            actual: format!("{} rows", against.len()),
        });
    }

    let rows = baseline
        .rows()
        .iter()
        .zip(against.rows())
        .map(|(base, alt)| {
            let speedup = base.mean / alt.mean;
            let stdev_speedup =
                ((base.stdev / base.mean).powi(2) + (alt.stdev / alt.mean).powi(2)).sqrt();
            ComparisonRow {
                baseline: base.clone(),
                against_mean: alt.mean,
                against_stdev: alt.stdev,
                against_scores: alt.scores.clone(),
                speedup,
                stdev_speedup,
            }
        })
        .collect();
    Ok(rows)
}

/// Loads the two persisted tables for `estimator` and joins them.
///
/// # Errors
///
/// Returns `ShapeMismatch` when either table file is absent or the row
/// counts differ.
pub fn compare_files(
    results_dir: &Path,
    estimator: &str,
    base_lib: &str,
    against_lib: &str,
) -> Result<Vec<ComparisonRow>> {
    let mut tables = Vec::with_capacity(2);
    for lib in [base_lib, against_lib] {
        let path = results_dir.join(table_file_name(lib, estimator));
        if !path.is_file() {
            return Err(MedirError::ShapeMismatch {
                expected: format!("result table at {}", path.display()),
                actual: "missing".to_string(),
            });
        }
        tables.push(ResultTable::read_csv(&path)?);
    }
    compare(&tables[0], &tables[1])
}

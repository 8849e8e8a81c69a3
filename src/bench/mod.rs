//! Benchmark orchestration.
//!
//! A [`Benchmark`] runs one estimator for one library across every dataset
//! shape and hyperparameter combination, producing a [`results::ResultTable`]
//! whose rows carry content-derived identity digests. [`run_benchmarks`]
//! drives a whole config: per-estimator time accounting, table persistence,
//! and cleanup of incomplete artifacts on failure. Estimator runs are
//! all-or-nothing: any failure aborts that estimator's grid and discards
//! its partial rows, leaving other estimators untouched.

pub mod comparison;
pub mod results;
pub mod time_report;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info};

use crate::config::{BenchConfig, EstimatorConfig};
use crate::dataset;
use crate::digest;
use crate::error::{MedirError, Result};
use crate::executor::{artifact_name, Executor};
use crate::metrics::{self, MetricFn};
use crate::model_selection::train_test_split;
use crate::registry::{library_id, Inference, Operation, Registry};
use results::{table_file_name, BenchmarkRow, ResultTable};
use time_report::TimeReport;

/// Seed pinned into every subject before timing, so repeated fits of the
/// same combination are comparable across libraries.
const SUBJECT_SEED: u64 = 42;

/// Output locations and execution settings for one run.
///
/// Replaces any process-wide results path: the context is created by the
/// caller, passed explicitly, and lives for exactly one invocation.
#[derive(Debug, Clone)]
pub struct RunContext {
    results_dir: PathBuf,
    profiling_dir: PathBuf,
    append: bool,
    executor: Executor,
}

impl RunContext {
    /// Creates a context rooted at `results_dir`, with profiling artifacts
    /// under `results_dir/profiling`.
    #[must_use]
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        let results_dir = results_dir.into();
        let profiling_dir = results_dir.join("profiling");
        Self {
            results_dir,
            profiling_dir,
            append: false,
            executor: Executor::new(),
        }
    }

    /// Marks this run as additive to a previous run's results.
    ///
    /// Append mode is only safe when the grid and dataset definitions are
    /// unchanged from the prior run; row identity depends solely on digests
    /// derived from those definitions.
    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Replaces the executor settings.
    #[must_use]
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Whether this run appends to prior results.
    #[must_use]
    pub fn append(&self) -> bool {
        self.append
    }

    /// The executor used for every timed operation.
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Creates the output directories.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a directory cannot be created.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.results_dir)?;
        fs::create_dir_all(&self.profiling_dir)?;
        Ok(())
    }

    /// Path of the persisted result table for one (library, estimator).
    #[must_use]
    pub fn result_path(&self, lib: &str, estimator: &str) -> PathBuf {
        self.results_dir.join(table_file_name(lib, estimator))
    }

    /// Path of the profiling artifact for one timed operation.
    #[must_use]
    pub fn profiling_path(
        &self,
        lib: &str,
        operation: Operation,
        hyperparams_digest: &str,
        dims_digest: &str,
    ) -> PathBuf {
        self.profiling_dir
            .join(artifact_name(lib, operation, hyperparams_digest, dims_digest))
    }

    /// Path of the persisted time report.
    #[must_use]
    pub fn time_report_path(&self) -> PathBuf {
        self.results_dir.join("time_report.csv")
    }
}

/// Removes registered files on drop unless disarmed.
///
/// The structured-cancellation contract: arm the guard before producing an
/// artifact, disarm it once the artifact is complete. An early exit
/// (error, panic, or an interrupt handler unwinding the run) then removes
/// the incomplete files so a half-written table is never mistaken for a
/// complete one.
#[derive(Debug, Default)]
pub struct CleanupGuard {
    paths: Vec<PathBuf>,
    armed: bool,
}

impl CleanupGuard {
    /// Creates an armed guard with no registered paths.
    #[must_use]
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            armed: true,
        }
    }

    /// Registers a path to remove on drop.
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Marks the guarded artifacts as complete; drop becomes a no-op.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in &self.paths {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    error!("failed to clean up incomplete artifact {}: {e}", path.display());
                }
            }
        }
    }
}

/// Runs benchmarks on one estimator for one library, across potentially
/// multiple datasets.
#[derive(Debug, Clone)]
pub struct Benchmark {
    config: EstimatorConfig,
}

impl Benchmark {
    /// Creates a benchmark from an estimator config.
    #[must_use]
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// The estimator name rows are tagged with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Runs the full grid and returns the accumulated result table.
    ///
    /// Work order per dataset: for each training size, one generated
    /// dataset of `train + max(test)` rows is split once; each parameter
    /// combination fits on the training partition and then runs inference
    /// on descending prefixes of the test partition.
    ///
    /// # Errors
    ///
    /// Validation failures surface before any generation or timing; any
    /// later failure aborts the whole run with no partial table.
    pub fn run(&self, registry: &Registry, ctx: &RunContext) -> Result<ResultTable> {
        self.config.validate()?;

        let lib = library_id(&self.config.estimator).to_string();
        let metric_fns: Vec<(String, MetricFn)> = self
            .config
            .metrics
            .iter()
            .map(|name| metrics::resolve(name).map(|f| (name.clone(), f)))
            .collect::<Result<_>>()?;
        let combinations = self.config.hyperparameters.expand()?;
        let split_seed = digest::seed_from_label(&self.config.name);

        // Resolution probe: building one subject surfaces an unknown target
        // or a metrics/capability conflict before any dataset is generated.
        let probe = registry.build(&self.config.estimator, &combinations[0])?;
        if !metric_fns.is_empty() && probe.inference_operation() == Operation::Transform {
            return Err(MedirError::invalid_spec(format!(
                "estimator '{}' produces transformed features; metrics require predictions",
                self.config.name
            )));
        }
        drop(probe);

        let mut table = ResultTable::new(&self.config.name, &lib);

        for spec in &self.config.datasets {
            let test_sizes = spec.test_sizes_desc();
            let max_test = spec.max_test_size();

            for &n_train in &spec.n_samples_train {
                let (x, y) = dataset::generate(
                    &spec.sample_generator,
                    n_train + max_test,
                    spec.n_features,
                    &spec.params,
                )?;
                let (x_train, x_test, y_train, y_test) =
                    train_test_split(&x, &y, n_train, split_seed)?;
                drop((x, y));

                for combination in &combinations {
                    let mut subject = registry.build(&self.config.estimator, combination)?;
                    subject.set_random_state(SUBJECT_SEED);

                    let hyperparams_digest = digest::params_digest(combination);
                    let fit_dims = digest::dims_digest(n_train, spec.n_features);
                    let artifact =
                        ctx.profiling_path(&lib, Operation::Fit, &hyperparams_digest, &fit_dims);
                    let timing = ctx
                        .executor()
                        .run_once("fit", Some(&artifact), || subject.fit(&x_train, &y_train))?;
                    info!(
                        "{lib} - {} - fit - mean: {:.6} - stdev: {:.6}",
                        self.config.name, timing.mean, timing.stdev
                    );
                    table.push(BenchmarkRow {
                        estimator: self.config.name.clone(),
                        lib: lib.clone(),
                        operation: Operation::Fit,
                        mean: timing.mean,
                        stdev: timing.stdev,
                        n_samples: n_train,
                        n_features: spec.n_features,
                        hyperparams_digest: hyperparams_digest.clone(),
                        dims_digest: fit_dims,
                        scores: Vec::new(),
                        params: combination.clone(),
                        n_iter: subject.n_iter(),
                    })?;

                    let operation = subject.inference_operation();
                    for &n_test in &test_sizes {
                        let x_slice = x_test.head_rows(n_test);
                        let y_slice = y_test.head(n_test);
                        let dims = digest::dims_digest(n_test, spec.n_features);
                        let artifact =
                            ctx.profiling_path(&lib, operation, &hyperparams_digest, &dims);
                        let timing = ctx.executor().run_repeated(
                            operation.as_str(),
                            Some(&artifact),
                            || subject.run_inference(&x_slice),
                        )?;
                        let scores = match &timing.output {
                            Inference::Predictions(predictions) => metric_fns
                                .iter()
                                .map(|(name, f)| (name.clone(), f64::from(f(predictions, &y_slice))))
                                .collect(),
                            Inference::Transformed(_) => Vec::new(),
                        };
                        info!(
                            "{lib} - {} - {operation} - mean: {:.6} - stdev: {:.6}",
                            self.config.name, timing.mean, timing.stdev
                        );
                        table.push(BenchmarkRow {
                            estimator: self.config.name.clone(),
                            lib: lib.clone(),
                            operation,
                            mean: timing.mean,
                            stdev: timing.stdev,
                            n_samples: n_test,
                            n_features: spec.n_features,
                            hyperparams_digest: hyperparams_digest.clone(),
                            dims_digest: dims,
                            scores,
                            params: combination.clone(),
                            n_iter: None,
                        })?;
                    }
                }
            }
        }

        Ok(table)
    }
}

/// Outcome of a whole-config run: the time report of what completed, plus
/// the estimators whose runs were aborted.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One entry per completed estimator.
    pub time_report: TimeReport,
    /// Aborted estimators with the error that stopped each one.
    pub failures: Vec<(String, MedirError)>,
}

/// Runs every estimator of a config, persisting one result table per
/// estimator and a final time report.
///
/// A failing estimator is all-or-nothing: its partial table is removed and
/// the failure recorded, while the remaining estimators still run.
///
/// # Errors
///
/// Returns an error for config-level failures (unresolvable inheritance,
/// validation, I/O preparing the output directories); those abort the
/// whole run before any timing.
pub fn run_benchmarks(
    mut config: BenchConfig,
    registry: &Registry,
    ctx: &RunContext,
) -> Result<RunSummary> {
    ctx.prepare()?;
    config.resolve_inherit()?;
    config.normalize();
    config.validate()?;

    let mut summary = RunSummary::default();
    for (entry, estimator_config) in &config.estimators {
        let lib = library_id(&estimator_config.estimator);
        let table_path = ctx.result_path(lib, &estimator_config.name);

        let mut guard = CleanupGuard::new();
        guard.register(&table_path);

        let benchmark = Benchmark::new(estimator_config.clone());
        let started = Instant::now();
        let outcome = benchmark
            .run(registry, ctx)
            .and_then(|table| table.write_csv(&table_path));
        match outcome {
            Ok(()) => {
                guard.disarm();
                summary.time_report.record(entry.clone(), started.elapsed());
            }
            Err(e) => {
                error!("{entry} aborted: {e}");
                summary.failures.push((entry.clone(), e));
            }
        }
    }

    let report_path = ctx.time_report_path();
    let mut guard = CleanupGuard::new();
    guard.register(&report_path);
    summary.time_report.write_csv(&report_path)?;
    guard.disarm();

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetSpec;
    use crate::dataset::GenParams;
    use crate::grid::{HyperGrid, ParamSet, ParamValue};
    use crate::primitives::{Matrix, Vector};
    use crate::registry::Subject;
    use crate::traits::Estimator;
    use std::path::Path;

    fn toy_dataset() -> DatasetSpec {
        let mut params = GenParams::new();
        params.insert("random_state".to_string(), ParamValue::Int(0));
        DatasetSpec {
            sample_generator: "make_regression".to_string(),
            n_features: 3,
            n_samples_train: vec![40],
            n_samples_test: vec![5, 10],
            params,
        }
    }

    fn toy_config(name: &str) -> EstimatorConfig {
        EstimatorConfig {
            name: name.to_string(),
            estimator: "medir.linear_regression".to_string(),
            inherit: None,
            metrics: vec!["r_squared".to_string()],
            hyperparameters: HyperGrid::new(),
            datasets: vec![toy_dataset()],
        }
    }

    fn fast_ctx(dir: &Path) -> RunContext {
        RunContext::new(dir).with_executor(Executor::new().with_executions(2))
    }

    #[test]
    fn test_run_produces_expected_row_sequence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = fast_ctx(dir.path());
        ctx.prepare().expect("prepare");

        let registry = Registry::with_defaults();
        let benchmark = Benchmark::new(toy_config("linear"));
        let table = benchmark.run(&registry, &ctx).expect("run");

        // One combination: fit row, then predict rows at 10 and 5.
        assert_eq!(table.len(), 3);
        let rows = table.rows();
        assert_eq!(rows[0].operation, Operation::Fit);
        assert_eq!(rows[0].n_samples, 40);
        assert_eq!(rows[1].operation, Operation::Predict);
        assert_eq!(rows[1].n_samples, 10);
        assert_eq!(rows[2].operation, Operation::Predict);
        assert_eq!(rows[2].n_samples, 5);

        // Metrics attach to inference rows only.
        assert!(rows[0].scores.is_empty());
        assert_eq!(rows[1].scores[0].0, "r_squared");
        assert_eq!(rows[2].scores.len(), 1);

        // Fit and predict rows of one combination share the params digest.
        assert_eq!(rows[0].hyperparams_digest, rows[1].hyperparams_digest);
        assert_ne!(rows[0].dims_digest, rows[1].dims_digest);
    }

    #[test]
    fn test_run_grid_multiplies_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = fast_ctx(dir.path());
        ctx.prepare().expect("prepare");

        let mut config = toy_config("ridge");
        config.estimator = "medir.ridge".to_string();
        config.hyperparameters = HyperGrid::new()
            .with("alpha", [0.1, 1.0])
            .with("max_iter", [20]);

        let registry = Registry::with_defaults();
        let table = Benchmark::new(config).run(&registry, &ctx).expect("run");

        // Two combinations, each contributing 1 fit + 2 predict rows.
        assert_eq!(table.len(), 6);
        // The iterative solver reports its iteration count on fit rows.
        assert!(table.rows()[0].n_iter.is_some());
        assert!(table.rows()[1].n_iter.is_none());
    }

    #[test]
    fn test_validation_fails_before_any_work() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = fast_ctx(dir.path());

        let mut config = toy_config("linear");
        config.datasets.clear();
        let err = Benchmark::new(config)
            .run(&Registry::with_defaults(), &ctx)
            .unwrap_err();
        assert!(matches!(err, MedirError::InvalidSpec { .. }));
    }

    #[test]
    fn test_metrics_with_transformer_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = fast_ctx(dir.path());
        ctx.prepare().expect("prepare");

        let mut config = toy_config("scaler");
        config.estimator = "medir.standard_scaler".to_string();
        let err = Benchmark::new(config)
            .run(&Registry::with_defaults(), &ctx)
            .unwrap_err();
        assert!(err.to_string().contains("metrics require predictions"));
    }

    #[test]
    fn test_transformer_rows_without_metrics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = fast_ctx(dir.path());
        ctx.prepare().expect("prepare");

        let mut config = toy_config("scaler");
        config.estimator = "medir.standard_scaler".to_string();
        config.metrics.clear();
        let table = Benchmark::new(config)
            .run(&Registry::with_defaults(), &ctx)
            .expect("run");

        assert_eq!(table.rows()[1].operation, Operation::Transform);
        assert!(table.rows()[1].scores.is_empty());
    }

    struct FailingFit;

    impl Estimator for FailingFit {
        fn fit(&mut self, _x: &Matrix<f32>, _y: &Vector<f32>) -> crate::error::Result<()> {
            Err(MedirError::execution("fit", "deliberate failure"))
        }

        fn predict(&self, _x: &Matrix<f32>) -> crate::error::Result<Vector<f32>> {
            Err(MedirError::execution("predict", "unreachable"))
        }
    }

    fn build_failing(_params: &ParamSet) -> crate::error::Result<Subject> {
        Ok(Subject::Predictor(Box::new(FailingFit)))
    }

    #[test]
    fn test_execution_error_aborts_estimator() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = fast_ctx(dir.path());
        ctx.prepare().expect("prepare");

        let mut registry = Registry::with_defaults();
        registry.register("broken.fit", build_failing);

        let mut config = toy_config("broken");
        config.estimator = "broken.fit".to_string();
        config.metrics.clear();
        let err = Benchmark::new(config).run(&registry, &ctx).unwrap_err();
        assert!(err.to_string().contains("deliberate failure"));
    }

    #[test]
    fn test_run_benchmarks_isolates_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = fast_ctx(dir.path());

        let mut registry = Registry::with_defaults();
        registry.register("broken.fit", build_failing);

        let mut broken = toy_config("broken");
        broken.estimator = "broken.fit".to_string();
        broken.metrics.clear();
        let config = BenchConfig {
            estimators: vec![
                ("linear".to_string(), toy_config("linear")),
                ("broken".to_string(), broken),
            ],
        };

        let summary = run_benchmarks(config, &registry, &ctx).expect("run");

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "broken");
        assert_eq!(summary.time_report.entries().len(), 1);
        assert_eq!(summary.time_report.entries()[0].label, "linear");

        assert!(ctx.result_path("medir", "linear").exists());
        assert!(!ctx.result_path("broken", "broken").exists());
        assert!(ctx.time_report_path().exists());
    }

    #[test]
    fn test_cleanup_guard_removes_armed_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.csv");
        fs::write(&path, "half a row").expect("write");

        {
            let mut guard = CleanupGuard::new();
            guard.register(&path);
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_guard_disarmed_keeps_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("complete.csv");
        fs::write(&path, "all rows").expect("write");

        {
            let mut guard = CleanupGuard::new();
            guard.register(&path);
            guard.disarm();
        }
        assert!(path.exists());
    }

    #[test]
    fn test_run_context_paths() {
        let ctx = RunContext::new("/tmp/medir-results");
        assert_eq!(
            ctx.result_path("medir", "ridge"),
            PathBuf::from("/tmp/medir-results/medir_ridge.csv")
        );
        let profiling = ctx.profiling_path("medir", Operation::Fit, "aaaa", "bbbb");
        assert_eq!(
            profiling,
            PathBuf::from("/tmp/medir-results/profiling/medir_fit_aaaa_bbbb.html")
        );
        assert_eq!(
            ctx.time_report_path(),
            PathBuf::from("/tmp/medir-results/time_report.csv")
        );
    }
}

//! End-to-end pipeline tests: config → run → persisted tables → comparison.

use std::sync::Mutex;

use medir::prelude::*;

/// Reference implementation of ridge registered under a second library id,
/// so the pipeline produces two independently generated, join-able tables.
fn build_reference_ridge(params: &ParamSet) -> medir::error::Result<Subject> {
    let mut model = Ridge::new();
    for (name, value) in params.iter() {
        match name {
            "alpha" => {
                let alpha = value.as_f64().expect("alpha is numeric in this config") as f32;
                model = model.with_alpha(alpha);
            }
            "max_iter" => {
                let max_iter = value.as_i64().expect("max_iter is integer in this config");
                model = model.with_max_iter(max_iter as u64);
            }
            _ => panic!("unexpected hyperparameter {name}"),
        }
    }
    Ok(Subject::Predictor(Box::new(model)))
}

fn pipeline_config() -> BenchConfig {
    let json = r#"{
        "estimators": {
            "ridge": {
                "name": "ridge",
                "estimator": "medir.ridge",
                "metrics": ["r_squared", "mse"],
                "hyperparameters": {"alpha": [0.1, 1.0], "max_iter": [30]},
                "datasets": [{
                    "sample_generator": "make_regression",
                    "n_features": 3,
                    "n_samples_train": [30],
                    "n_samples_test": [5, 10],
                    "params": {"noise": 0.1, "random_state": 0}
                }]
            },
            "ridge_ref": {
                "estimator": "reflib.ridge",
                "inherit": "ridge"
            }
        }
    }"#;
    serde_json::from_str(json).expect("config deserializes")
}

fn pipeline_registry() -> Registry {
    let mut registry = Registry::with_defaults();
    registry.register("reflib.ridge", build_reference_ridge);
    registry
}

#[test]
fn full_run_produces_join_able_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = RunContext::new(dir.path()).with_executor(Executor::new().with_executions(3));

    let summary = run_benchmarks(pipeline_config(), &pipeline_registry(), &ctx).expect("run");
    assert!(summary.failures.is_empty(), "failures: {:?}", summary.failures);
    assert_eq!(summary.time_report.entries().len(), 2);

    let baseline = ResultTable::read_csv(&ctx.result_path("medir", "ridge")).expect("baseline");
    let against = ResultTable::read_csv(&ctx.result_path("reflib", "ridge")).expect("alternate");

    // Two combinations, each 1 fit + 2 inference rows.
    assert_eq!(baseline.len(), 6);
    assert_eq!(against.len(), 6);

    // Inheritance gives both tables the same estimator name; identical
    // definitions give identical digests row-for-row.
    assert_eq!(against.rows()[0].estimator, "ridge");
    for (base, alt) in baseline.rows().iter().zip(against.rows()) {
        assert_eq!(base.hyperparams_digest, alt.hyperparams_digest);
        assert_eq!(base.dims_digest, alt.dims_digest);
        assert_eq!(base.operation, alt.operation);
        assert_eq!(base.n_samples, alt.n_samples);
    }

    let comparison =
        compare_files(dir.path(), "ridge", "medir", "reflib").expect("comparison joins");
    assert_eq!(comparison.len(), 6);
    for row in &comparison {
        assert!(row.speedup.is_finite() && row.speedup > 0.0);
        assert!(row.stdev_speedup.is_finite() && row.stdev_speedup >= 0.0);
    }
}

#[test]
fn persisted_table_round_trips_numeric_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = RunContext::new(dir.path()).with_executor(Executor::new().with_executions(2));
    ctx.prepare().expect("prepare");

    let config = pipeline_config().estimators[0].1.clone();
    let table = Benchmark::new(config)
        .run(&pipeline_registry(), &ctx)
        .expect("run");
    let path = ctx.result_path("medir", "ridge");
    table.write_csv(&path).expect("write");

    let loaded = ResultTable::read_csv(&path).expect("read");
    assert_eq!(loaded.len(), table.len());
    for (orig, back) in table.rows().iter().zip(loaded.rows()) {
        assert_eq!(orig.mean, back.mean);
        assert_eq!(orig.stdev, back.stdev);
        assert_eq!(orig.n_samples, back.n_samples);
        assert_eq!(orig.n_features, back.n_features);
        assert_eq!(orig.scores, back.scores);
        assert_eq!(orig.n_iter, back.n_iter);
    }
}

#[test]
fn profiling_artifacts_follow_digest_naming() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = RunContext::new(dir.path())
        .with_executor(Executor::new().with_executions(2).with_profiling(true));
    ctx.prepare().expect("prepare");

    let config = pipeline_config().estimators[0].1.clone();
    let table = Benchmark::new(config)
        .run(&pipeline_registry(), &ctx)
        .expect("run");

    for row in table.rows() {
        let artifact = ctx.profiling_path(
            &row.lib,
            row.operation,
            &row.hyperparams_digest,
            &row.dims_digest,
        );
        assert!(
            artifact.is_file(),
            "missing profiling artifact {}",
            artifact.display()
        );
    }
}

#[test]
fn speedup_is_ratio_of_matching_means() {
    // Hand-build two tables whose matching rows have means 2.0 and 1.0.
    let mk_row = |lib: &str, mean: f64| BenchmarkRow {
        estimator: "ridge".to_string(),
        lib: lib.to_string(),
        operation: Operation::Predict,
        mean,
        stdev: 0.0,
        n_samples: 1000,
        n_features: 10,
        hyperparams_digest: params_digest(&ParamSet::empty()),
        dims_digest: dims_digest(1000, 10),
        scores: Vec::new(),
        params: ParamSet::empty(),
        n_iter: None,
    };

    let mut baseline = ResultTable::new("ridge", "medir");
    baseline.push(mk_row("medir", 2.0)).expect("push");
    let mut against = ResultTable::new("ridge", "reflib");
    against.push(mk_row("reflib", 1.0)).expect("push");

    let rows = compare(&baseline, &against).expect("compare");
    assert_eq!(rows.len(), 1);
    assert!((rows[0].speedup - 2.0).abs() < 1e-12);
    assert_eq!(rows[0].stdev_speedup, 0.0);
}

/// Feature matrices seen by every `Recorder::predict` call, in call order.
static CAPTURED_INPUTS: Mutex<Vec<Vec<f32>>> = Mutex::new(Vec::new());

struct Recorder;

impl Estimator for Recorder {
    fn fit(&mut self, _x: &Matrix<f32>, _y: &Vector<f32>) -> medir::error::Result<()> {
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> medir::error::Result<Vector<f32>> {
        CAPTURED_INPUTS
            .lock()
            .expect("capture lock")
            .push(x.as_slice().to_vec());
        Ok(Vector::from_vec(vec![0.0; x.n_rows()]))
    }
}

fn build_recorder(_params: &ParamSet) -> medir::error::Result<Subject> {
    Ok(Subject::Predictor(Box::new(Recorder)))
}

#[test]
fn smaller_test_sizes_are_prefixes_of_the_largest_split() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = RunContext::new(dir.path()).with_executor(Executor::new().with_executions(1));
    ctx.prepare().expect("prepare");

    let mut registry = Registry::new();
    registry.register("recorder.model", build_recorder);

    let config: EstimatorConfig = serde_json::from_str(
        r#"{
            "name": "recorder",
            "estimator": "recorder.model",
            "datasets": [{
                "sample_generator": "make_regression",
                "n_features": 2,
                "n_samples_train": [20],
                "n_samples_test": [4, 8],
                "params": {"random_state": 3}
            }]
        }"#,
    )
    .expect("config");

    CAPTURED_INPUTS.lock().expect("capture lock").clear();
    Benchmark::new(config).run(&registry, &ctx).expect("run");

    // One warm-up plus one timed call per test size, largest first.
    let captured = CAPTURED_INPUTS.lock().expect("capture lock");
    assert_eq!(captured.len(), 4);
    let largest = &captured[0];
    let smaller = &captured[2];
    assert_eq!(largest.len(), 8 * 2);
    assert_eq!(smaller.len(), 4 * 2);
    assert_eq!(
        &largest[..smaller.len()],
        smaller.as_slice(),
        "the 4-row test split must be an exact prefix of the 8-row split"
    );
}

#[test]
fn append_mode_keeps_prior_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = RunContext::new(dir.path())
        .with_append(true)
        .with_executor(Executor::new().with_executions(2));

    // First run persists both tables.
    run_benchmarks(pipeline_config(), &pipeline_registry(), &ctx).expect("first run");
    let first = std::fs::read_to_string(ctx.result_path("medir", "ridge")).expect("first table");

    // A second config naming only the reference library must leave the
    // baseline table untouched.
    let mut config = pipeline_config();
    config.resolve_inherit().expect("resolve");
    config.estimators.remove(0);
    run_benchmarks(config, &pipeline_registry(), &ctx).expect("second run");

    let still = std::fs::read_to_string(ctx.result_path("medir", "ridge")).expect("kept table");
    assert_eq!(first, still);
}

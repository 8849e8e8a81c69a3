//! Timed execution of benchmark operations.
//!
//! The executor measures wall-clock latency of a bound operation. Fit
//! mutates model state and cannot be repeated without re-initialization, so
//! it runs exactly once and its stdev degrades to zero. Predict/transform
//! are idempotent and run a configurable number of times after one
//! discarded warm-up call, yielding a genuine mean and stdev. Failures in
//! the underlying callable propagate unmodified; nothing is retried or
//! swallowed.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::error::Result;
use crate::registry::Operation;

/// Environment variable letting a downstream reporter rewrite profiling
/// links (e.g. for remote hosting) instead of local file paths.
pub const RESULTS_BASE_URL_ENV: &str = "MEDIR_RESULTS_BASE_URL";

/// Result of timing one operation.
#[derive(Debug, Clone)]
pub struct Timing<T> {
    /// Output of the last invocation.
    pub output: T,
    /// Mean latency in seconds.
    pub mean: f64,
    /// Population standard deviation of latency in seconds.
    pub stdev: f64,
}

/// Runs operations under wall-clock measurement.
#[derive(Debug, Clone)]
pub struct Executor {
    n_executions: usize,
    profile: bool,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Creates an executor with 10 timed executions and profiling off.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_executions: 10,
            profile: false,
        }
    }

    /// Sets how many timed executions a repeated run performs (min 1).
    #[must_use]
    pub fn with_executions(mut self, n_executions: usize) -> Self {
        self.n_executions = n_executions.max(1);
        self
    }

    /// Enables or disables profiling-artifact output.
    #[must_use]
    pub fn with_profiling(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    /// Number of timed executions a repeated run performs.
    #[must_use]
    pub fn n_executions(&self) -> usize {
        self.n_executions
    }

    /// Times a non-repeatable operation with a single invocation.
    ///
    /// # Errors
    ///
    /// Propagates the callable's failure, or an I/O error from writing the
    /// profiling artifact.
    pub fn run_once<T>(
        &self,
        label: &str,
        artifact: Option<&Path>,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<Timing<T>> {
        let start = Instant::now();
        let output = f()?;
        let elapsed = start.elapsed().as_secs_f64();

        self.write_trace(label, artifact, &[elapsed])?;
        Ok(Timing {
            output,
            mean: elapsed,
            stdev: 0.0,
        })
    }

    /// Times an idempotent operation: one discarded warm-up invocation,
    /// then `n_executions` timed invocations.
    ///
    /// # Errors
    ///
    /// Propagates the callable's failure, or an I/O error from writing the
    /// profiling artifact.
    pub fn run_repeated<T>(
        &self,
        label: &str,
        artifact: Option<&Path>,
        mut f: impl FnMut() -> Result<T>,
    ) -> Result<Timing<T>> {
        f()?; // warm-up, discarded

        let mut times = Vec::with_capacity(self.n_executions);
        let mut output = time_call(&mut f, &mut times)?;
        for _ in 1..self.n_executions {
            output = time_call(&mut f, &mut times)?;
        }

        let (mean, stdev) = mean_stdev(&times);
        self.write_trace(label, artifact, &times)?;
        Ok(Timing {
            output,
            mean,
            stdev,
        })
    }

    /// Renders per-call durations to a static HTML trace.
    ///
    /// Runs strictly after measurement so the write never enters the
    /// timed window.
    fn write_trace(&self, label: &str, artifact: Option<&Path>, times: &[f64]) -> Result<()> {
        let Some(path) = artifact else {
            return Ok(());
        };
        if !self.profile {
            return Ok(());
        }

        let (mean, stdev) = mean_stdev(times);
        let mut html = String::new();
        let _ = writeln!(html, "<!DOCTYPE html>");
        let _ = writeln!(html, "<html><head><title>{label}</title></head><body>");
        let _ = writeln!(html, "<h1>{label}</h1>");
        let _ = writeln!(
            html,
            "<p>calls: {} &mdash; mean: {mean:.6}s &mdash; stdev: {stdev:.6}s</p>",
            times.len()
        );
        let _ = writeln!(html, "<table><tr><th>call</th><th>seconds</th></tr>");
        for (i, t) in times.iter().enumerate() {
            let _ = writeln!(html, "<tr><td>{i}</td><td>{t:.9}</td></tr>");
        }
        let _ = writeln!(html, "</table></body></html>");

        fs::write(path, html)?;
        Ok(())
    }
}

fn time_call<T>(f: &mut impl FnMut() -> Result<T>, times: &mut Vec<f64>) -> Result<T> {
    let start = Instant::now();
    let output = f()?;
    times.push(start.elapsed().as_secs_f64());
    Ok(output)
}

fn mean_stdev(times: &[f64]) -> (f64, f64) {
    if times.is_empty() {
        return (0.0, 0.0);
    }
    let mean = times.iter().sum::<f64>() / times.len() as f64;
    let variance = times.iter().map(|&t| (t - mean).powi(2)).sum::<f64>() / times.len() as f64;
    (mean, variance.sqrt())
}

/// Deterministic profiling-artifact file name for one timed operation.
///
/// Collision-free per (library, operation, digest pair), which is all the
/// downstream reporter needs to link artifacts from anywhere.
#[must_use]
pub fn artifact_name(
    lib: &str,
    operation: Operation,
    hyperparams_digest: &str,
    dims_digest: &str,
) -> String {
    format!("{lib}_{operation}_{hyperparams_digest}_{dims_digest}.html")
}

/// Link to a profiling artifact, honoring [`RESULTS_BASE_URL_ENV`].
#[must_use]
pub fn artifact_url(path: &Path) -> String {
    match env::var(RESULTS_BASE_URL_ENV) {
        Ok(base) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{base}{name}")
        }
        Err(_) => format!("file://{}", path.display()),
    }
}

//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use medir::prelude::*;
//! ```

pub use crate::bench::comparison::{compare, compare_files, ComparisonRow};
pub use crate::bench::results::{BenchmarkRow, ResultTable};
pub use crate::bench::time_report::{TimeReport, TimeReportEntry};
pub use crate::bench::{run_benchmarks, Benchmark, CleanupGuard, RunContext, RunSummary};
pub use crate::config::{BenchConfig, DatasetSpec, EstimatorConfig};
pub use crate::digest::{dims_digest, params_digest};
pub use crate::error::{MedirError, Result};
pub use crate::executor::Executor;
pub use crate::grid::{HyperGrid, ParamSet, ParamValue};
pub use crate::linear_model::{LinearRegression, Ridge};
pub use crate::metrics::{accuracy, mae, mse, r_squared};
pub use crate::preprocessing::StandardScaler;
pub use crate::primitives::{Matrix, Vector};
pub use crate::registry::{library_id, Inference, Operation, Registry, Subject};
pub use crate::traits::{Estimator, Transformer};

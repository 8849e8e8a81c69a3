//! Medir: cross-library wall-clock benchmarking for ML estimators.
//!
//! Medir times the fit and predict/transform operations of competing
//! estimator implementations over a grid of hyperparameters and dataset
//! sizes, and produces flat result tables that join row-for-row across
//! libraries through content-derived identity digests.
//!
//! # Quick Start
//!
//! ```
//! use medir::prelude::*;
//!
//! // A grid expands in insertion order, last parameter fastest.
//! let grid = HyperGrid::new()
//!     .with("alpha", [0.1, 1.0])
//!     .with("tol", [0.001]);
//! let combinations = grid.expand().unwrap();
//! assert_eq!(combinations.len(), 2);
//!
//! // Identity digests depend only on canonicalized values, so two
//! // libraries enumerating the same grid produce join-able rows.
//! let key = params_digest(&combinations[0]);
//! assert_eq!(key.len(), 16);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`traits`]: Capability traits for benchmark subjects
//! - [`dataset`]: Synthetic dataset generators
//! - [`grid`]: Hyperparameter grids and Cartesian expansion
//! - [`digest`]: Content-derived identity keys
//! - [`executor`]: Timed execution with profiling artifacts
//! - [`metrics`]: Evaluation metrics and name resolution
//! - [`model_selection`]: Seeded train/test splitting
//! - [`linear_model`]: Built-in linear subjects (OLS, Ridge)
//! - [`preprocessing`]: Built-in transformer subjects
//! - [`registry`]: Target-reference registry for subjects
//! - [`config`]: Validated benchmark configuration
//! - [`bench`]: Orchestration, result tables, comparison, time accounting

pub mod bench;
pub mod config;
pub mod dataset;
pub mod digest;
pub mod error;
pub mod executor;
pub mod grid;
pub mod linear_model;
pub mod metrics;
pub mod model_selection;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod registry;
pub mod traits;

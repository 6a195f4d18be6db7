//! # Deep Forecast
//!
//! A Rust library for windowed sequence-model forecasting of financial time
//! series, with hyperparameter search composed over k-fold cross-validation.
//!
//! ## Features
//!
//! - CSV loading with chronological reordering of newest-first data
//! - Reversible per-column min-max scaling (independent target scaler)
//! - Fixed-length windowing into supervised sequence samples
//! - LSTM regressor with a trainable dense head (Adam, MSE, early stopping)
//! - Pluggable hyperparameter search (successive halving by default)
//! - Shuffled k-fold cross-validation for model selection
//! - Final holdout evaluation with RMSE and residual statistics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deep_forecast::config::PipelineConfig;
//! use deep_forecast::data::DataLoader;
//! use deep_forecast::pipeline::ForecastPipeline;
//! use deep_forecast::search::SuccessiveHalvingSearch;
//!
//! # fn main() -> deep_forecast::error::Result<()> {
//! // Load newest-first daily data; rows are reversed to chronological order
//! let table = DataLoader::from_csv("spy_max.csv", "Close/Last")?;
//!
//! let config = PipelineConfig::new()
//!     .with_window_length(10)
//!     .with_k_folds(5)
//!     .with_test_fraction(0.2);
//!
//! let pipeline = ForecastPipeline::new(&table, config)?;
//! let outcome = pipeline.run(&SuccessiveHalvingSearch::new())?;
//!
//! println!("{}", outcome.summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cv;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod scaling;
pub mod search;
pub mod windowing;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::cv::{CrossValidationRunner, FoldResult, KFold};
pub use crate::data::{DataLoader, RawSeriesTable};
pub use crate::error::ForecastError;
pub use crate::evaluate::{EvaluationReport, FinalEvaluator};
pub use crate::model::{HyperparameterProposal, ModelFactory, SequenceModel};
pub use crate::pipeline::{ForecastPipeline, RunOutcome};
pub use crate::report::{ReportAggregator, ReportSummary};
pub use crate::scaling::MinMaxScaler;
pub use crate::search::{SearchOracle, SuccessiveHalvingSearch};
pub use crate::windowing::make_sequences;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! End-to-end forecasting pipeline

use crate::config::PipelineConfig;
use crate::cv::{CrossValidationRunner, FoldResult};
use crate::data::RawSeriesTable;
use crate::error::{ForecastError, Result};
use crate::evaluate::{train_test_split, EvaluationReport, FinalEvaluator};
use crate::model::{HyperparameterProposal, ModelFactory};
use crate::report::{ReportAggregator, ReportSummary};
use crate::scaling::MinMaxScaler;
use crate::search::SearchOracle;
use crate::windowing::make_sequences;
use log::info;
use ndarray::{Array2, Array3};

/// Everything a completed run produces
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Per-fold cross-validation results, in fold order
    pub fold_results: Vec<FoldResult>,
    /// Final holdout evaluation with residual arrays for downstream plotting
    pub evaluation: EvaluationReport,
    /// Aggregated run summary
    pub summary: ReportSummary,
}

/// Immutable run context built once per run
///
/// Holds the fitted scalers and the windowed sample tensors; every stage of
/// `run` borrows this state and nothing mutates it after construction.
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: PipelineConfig,
    feature_scaler: MinMaxScaler,
    target_scaler: MinMaxScaler,
    inputs: Array3<f64>,
    outputs: Array2<f64>,
    num_features: usize,
}

impl ForecastPipeline {
    /// Scale the table and window it into supervised samples
    pub fn new(table: &RawSeriesTable, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        // Min/max is fitted over the full history before any fold or holdout
        // split. This leaks future distribution statistics into earlier
        // training data; see DESIGN.md for why it stays this way.
        let (feature_scaler, scaled_features) = MinMaxScaler::fit_transform(table.features())?;
        let (target_scaler, scaled_target) = MinMaxScaler::fit_transform_column(table.target())?;

        let (inputs, outputs) = make_sequences(
            &scaled_features,
            &scaled_target,
            config.window_length,
            config.horizon_length,
        )?;

        info!(
            "Prepared {} samples of window {} x {} features, horizon {}",
            inputs.shape()[0],
            config.window_length,
            table.num_features(),
            config.horizon_length
        );

        Ok(Self {
            config,
            feature_scaler,
            target_scaler,
            inputs,
            outputs,
            num_features: table.num_features(),
        })
    }

    /// Run selection and evaluation with the default proposal grid
    pub fn run<O: SearchOracle>(&self, oracle: &O) -> Result<RunOutcome> {
        self.run_with_space(oracle, &HyperparameterProposal::default_grid())
    }

    /// Run selection and evaluation over an explicit proposal space
    ///
    /// The holdout test split is carved out before any fold is constructed
    /// and none of it is reused during cross-validation; CV serves model
    /// selection only.
    pub fn run_with_space<O: SearchOracle>(
        &self,
        oracle: &O,
        space: &[HyperparameterProposal],
    ) -> Result<RunOutcome> {
        let (cv_inputs, cv_outputs, test_inputs, test_outputs) = train_test_split(
            &self.inputs,
            &self.outputs,
            self.config.test_fraction,
            self.config.random_seed,
        )?;

        let factory = ModelFactory::new(
            self.config.window_length,
            self.num_features,
            self.config.horizon_length,
            self.config.random_seed,
        );

        let runner = CrossValidationRunner::new(oracle, &factory, space, &self.config);
        let fold_results = runner.run(&cv_inputs, &cv_outputs)?;

        let best_fold = fold_results
            .iter()
            .min_by(|a, b| a.validation_loss.total_cmp(&b.validation_loss))
            .ok_or_else(|| {
                ForecastError::SearchFailure("Cross-validation produced no folds".to_string())
            })?;
        info!(
            "Selected proposal from fold {} ({}, validation loss {:.6})",
            best_fold.fold_index + 1,
            best_fold.best_proposal,
            best_fold.validation_loss
        );

        let mut model = factory.build(best_fold.best_proposal);

        let evaluator = FinalEvaluator::new(self.config.max_search_epochs, self.config.random_seed);
        let evaluation = evaluator.evaluate(
            &mut model,
            &cv_inputs,
            &cv_outputs,
            &test_inputs,
            &test_outputs,
            &self.target_scaler,
        )?;

        let summary = ReportAggregator::new().summarize(&fold_results, &evaluation)?;

        Ok(RunOutcome {
            fold_results,
            evaluation,
            summary,
        })
    }

    /// The run configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Scaler fitted on the feature columns
    pub fn feature_scaler(&self) -> &MinMaxScaler {
        &self.feature_scaler
    }

    /// Scaler fitted on the target column only
    pub fn target_scaler(&self) -> &MinMaxScaler {
        &self.target_scaler
    }

    /// Number of windowed samples available to the run
    pub fn num_samples(&self) -> usize {
        self.inputs.shape()[0]
    }

    /// The windowed input tensor, shape (samples, window, features)
    pub fn inputs(&self) -> &Array3<f64> {
        &self.inputs
    }

    /// The windowed output horizons, shape (samples, horizon)
    pub fn outputs(&self) -> &Array2<f64> {
        &self.outputs
    }
}

//! Run summaries across folds and the final holdout

use crate::cv::FoldResult;
use crate::error::{ForecastError, Result};
use crate::evaluate::EvaluationReport;

/// Aggregates per-fold and final metrics into one summary
#[derive(Debug, Default)]
pub struct ReportAggregator;

impl ReportAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self
    }

    /// Summarize fold validation performance together with the final holdout
    ///
    /// Per-fold RMSE is the square root of each fold's validation MSE and is
    /// therefore in scaled target units; the final RMSE comes from the
    /// holdout evaluation in original units. The two are reported side by
    /// side rather than averaged together.
    pub fn summarize(
        &self,
        fold_results: &[FoldResult],
        evaluation: &EvaluationReport,
    ) -> Result<ReportSummary> {
        if fold_results.is_empty() {
            return Err(ForecastError::DataError(
                "No fold results to summarize".to_string(),
            ));
        }

        let fold_validation_losses: Vec<f64> =
            fold_results.iter().map(|f| f.validation_loss).collect();
        let fold_rmse_values: Vec<f64> = fold_validation_losses.iter().map(|l| l.sqrt()).collect();
        let mean_fold_rmse =
            fold_rmse_values.iter().sum::<f64>() / fold_rmse_values.len() as f64;

        Ok(ReportSummary {
            fold_validation_losses,
            fold_rmse_values,
            mean_fold_rmse,
            final_rmse: evaluation.test_rmse,
            residual_mean: evaluation.residual_mean,
            residual_std: evaluation.residual_std,
        })
    }
}

/// Summary of one complete run
#[derive(Debug, Clone)]
pub struct ReportSummary {
    /// Validation MSE of each fold, in fold order
    pub fold_validation_losses: Vec<f64>,
    /// Square root of each fold's validation MSE (scaled target units)
    pub fold_rmse_values: Vec<f64>,
    /// Arithmetic mean of the per-fold RMSE values
    pub mean_fold_rmse: f64,
    /// RMSE on the final holdout, in original target units
    pub final_rmse: f64,
    /// Mean of the holdout residuals
    pub residual_mean: f64,
    /// Standard deviation of the holdout residuals
    pub residual_std: f64,
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Run Summary:")?;
        for (i, loss) in self.fold_validation_losses.iter().enumerate() {
            writeln!(f, "  Fold {} validation loss: {:.6}", i + 1, loss)?;
        }
        writeln!(f, "  Mean fold RMSE (scaled): {:.6}", self.mean_fold_rmse)?;
        writeln!(f, "  Final holdout RMSE:      {:.4}", self.final_rmse)?;
        writeln!(f, "  Residual mean:           {:.4}", self.residual_mean)?;
        writeln!(f, "  Residual std dev:        {:.4}", self.residual_std)?;
        Ok(())
    }
}

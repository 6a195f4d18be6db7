//! Final holdout evaluation of the selected model

use crate::error::{ForecastError, Result};
use crate::model::SequenceModel;
use crate::scaling::MinMaxScaler;
use log::info;
use ndarray::{Array1, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use statrs::statistics::Statistics;

/// Validation share of the final training portion, used only for monitoring
const REFIT_VALIDATION_FRACTION: f64 = 0.2;

/// Split samples into train and test portions by shuffled random selection
///
/// The number of test rows is `round(n * test_fraction)`, rounding half away
/// from zero. Returns `(train_inputs, train_outputs, test_inputs,
/// test_outputs)`.
pub fn train_test_split(
    inputs: &Array3<f64>,
    outputs: &Array2<f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<(Array3<f64>, Array2<f64>, Array3<f64>, Array2<f64>)> {
    let n_samples = inputs.shape()[0];
    if outputs.nrows() != n_samples {
        return Err(ForecastError::ShapeMismatch(format!(
            "{} input windows but {} output horizons",
            n_samples,
            outputs.nrows()
        )));
    }
    if test_fraction <= 0.0 || test_fraction >= 1.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let test_size = (n_samples as f64 * test_fraction).round() as usize;
    if test_size == 0 {
        return Err(ForecastError::EmptyTestSet(format!(
            "test_fraction {} of {} samples yields zero test rows",
            test_fraction, n_samples
        )));
    }
    if test_size >= n_samples {
        return Err(ForecastError::InvalidParameter(format!(
            "test_fraction {} of {} samples leaves no training rows",
            test_fraction, n_samples
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_indices, train_indices) = indices.split_at(test_size);

    Ok((
        inputs.select(Axis(0), train_indices),
        outputs.select(Axis(0), train_indices),
        inputs.select(Axis(0), test_indices),
        outputs.select(Axis(0), test_indices),
    ))
}

/// Root mean squared error over all samples and horizon steps
pub fn rmse(predictions: &Array2<f64>, actuals: &Array2<f64>) -> Result<f64> {
    if predictions.shape() != actuals.shape() {
        return Err(ForecastError::ShapeMismatch(format!(
            "Predictions have shape {:?}, actuals {:?}",
            predictions.shape(),
            actuals.shape()
        )));
    }
    if predictions.is_empty() {
        return Err(ForecastError::EmptyTestSet(
            "Cannot compute RMSE over zero values".to_string(),
        ));
    }

    let total: f64 = predictions
        .iter()
        .zip(actuals.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum();

    Ok((total / predictions.len() as f64).sqrt())
}

/// Result of the final holdout evaluation, read-only after construction
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// RMSE on the holdout, in original target units
    pub test_rmse: f64,
    /// Prediction − actual for every test sample and horizon step
    pub residuals: Array1<f64>,
    /// Predictions on the holdout, in original target units
    pub predictions: Array2<f64>,
    /// True holdout targets, in original target units
    pub actuals: Array2<f64>,
    /// Mean of the residuals
    pub residual_mean: f64,
    /// Sample standard deviation of the residuals
    pub residual_std: f64,
}

/// Refits the selected model and measures it on the held-out test split
#[derive(Debug, Clone)]
pub struct FinalEvaluator {
    refit_epochs: usize,
    seed: u64,
}

impl FinalEvaluator {
    /// Create an evaluator with a fixed refit epoch budget
    pub fn new(refit_epochs: usize, seed: u64) -> Self {
        Self { refit_epochs, seed }
    }

    /// Refit `model` on the training portion, predict the test portion and
    /// summarize the errors in original target units
    ///
    /// The training portion is split 80/20 internally so the refit can
    /// monitor validation loss; the refit runs the full epoch budget without
    /// early stopping. Predictions and actuals are mapped back through the
    /// target scaler before any metric is computed.
    pub fn evaluate(
        &self,
        model: &mut Box<dyn SequenceModel>,
        train_inputs: &Array3<f64>,
        train_outputs: &Array2<f64>,
        test_inputs: &Array3<f64>,
        test_outputs: &Array2<f64>,
        target_scaler: &MinMaxScaler,
    ) -> Result<EvaluationReport> {
        if test_inputs.shape()[0] == 0 {
            return Err(ForecastError::EmptyTestSet(
                "Final evaluation received zero test samples".to_string(),
            ));
        }

        let (fit_inputs, fit_outputs, monitor_inputs, monitor_outputs) = train_test_split(
            train_inputs,
            train_outputs,
            REFIT_VALIDATION_FRACTION,
            self.seed,
        )
        .map_err(|err| match err {
            // A degenerate monitoring split means the training portion itself
            // is too small, not that the holdout is misconfigured.
            ForecastError::EmptyTestSet(_) | ForecastError::InvalidParameter(_) => {
                ForecastError::InsufficientData(format!(
                    "{} training samples are too few to carve out a refit monitoring split",
                    train_inputs.shape()[0]
                ))
            }
            other => other,
        })?;

        info!(
            "Refitting {} on {} samples for {} epochs",
            model.name(),
            fit_inputs.shape()[0],
            self.refit_epochs
        );
        model.fit(
            &fit_inputs,
            &fit_outputs,
            &monitor_inputs,
            &monitor_outputs,
            self.refit_epochs,
            None,
        )?;

        let scaled_predictions = model.predict(test_inputs)?;
        let predictions = target_scaler.inverse_transform_horizons(&scaled_predictions)?;
        let actuals = target_scaler.inverse_transform_horizons(test_outputs)?;

        let test_rmse = rmse(&predictions, &actuals)?;

        let residuals: Array1<f64> = predictions
            .iter()
            .zip(actuals.iter())
            .map(|(p, a)| p - a)
            .collect();

        let residual_values: Vec<f64> = residuals.to_vec();
        let residual_mean = (&residual_values).mean();
        let residual_std = if residual_values.len() > 1 {
            (&residual_values).std_dev()
        } else {
            0.0
        };

        info!("Final holdout RMSE: {:.6}", test_rmse);

        Ok(EvaluationReport {
            test_rmse,
            residuals,
            predictions,
            actuals,
            residual_mean,
            residual_std,
        })
    }
}

//! Hyperparameter search over model proposals

use crate::error::{ForecastError, Result};
use crate::model::{HyperparameterProposal, ModelFactory, SequenceModel};
use log::{debug, info};
use ndarray::{Array2, Array3};

/// A hyperparameter search strategy
///
/// Given a proposal space, a training budget and a validation split, a search
/// returns exactly one best-performing trained model. Any strategy honoring
/// the propose → train-with-early-stop → return-best contract can stand in
/// here; the pipeline does not depend on the search internals.
pub trait SearchOracle {
    /// Explore the proposal space and return the best trained model
    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        space: &[HyperparameterProposal],
        factory: &ModelFactory,
        train_inputs: &Array3<f64>,
        train_outputs: &Array2<f64>,
        validation_inputs: &Array3<f64>,
        validation_outputs: &Array2<f64>,
        max_epochs: usize,
        early_stop_patience: usize,
    ) -> Result<Box<dyn SequenceModel>>;
}

/// Successive-halving search: every proposal gets a small epoch budget, the
/// better half survives each rung, and the budget doubles until it reaches
/// `max_epochs` or a single candidate remains
#[derive(Debug, Default)]
pub struct SuccessiveHalvingSearch;

impl SuccessiveHalvingSearch {
    /// Create a new search
    pub fn new() -> Self {
        Self
    }
}

impl SearchOracle for SuccessiveHalvingSearch {
    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        space: &[HyperparameterProposal],
        factory: &ModelFactory,
        train_inputs: &Array3<f64>,
        train_outputs: &Array2<f64>,
        validation_inputs: &Array3<f64>,
        validation_outputs: &Array2<f64>,
        max_epochs: usize,
        early_stop_patience: usize,
    ) -> Result<Box<dyn SequenceModel>> {
        if space.is_empty() {
            return Err(ForecastError::SearchFailure(
                "Proposal space is empty".to_string(),
            ));
        }

        let mut candidates: Vec<(Box<dyn SequenceModel>, f64)> = space
            .iter()
            .map(|&proposal| (factory.build(proposal), f64::INFINITY))
            .collect();

        let mut budget = (max_epochs / 8).max(1);
        let mut rung = 0;
        let mut last_known_loss: Option<f64> = None;

        loop {
            rung += 1;
            debug!(
                "Search rung {}: {} candidates, {} epochs each",
                rung,
                candidates.len(),
                budget
            );

            for (model, loss) in candidates.iter_mut() {
                *loss = model.fit(
                    train_inputs,
                    train_outputs,
                    validation_inputs,
                    validation_outputs,
                    budget,
                    Some(early_stop_patience),
                )?;
                if loss.is_finite() {
                    last_known_loss = Some(*loss);
                }
                debug!("  {} -> validation loss {:.6}", model.name(), loss);
            }

            candidates.retain(|(_, loss)| loss.is_finite());
            if candidates.is_empty() {
                let detail = match last_known_loss {
                    Some(loss) => format!(
                        "Every proposal diverged; last known validation loss {:.6}",
                        loss
                    ),
                    None => "Every proposal diverged; no finite validation loss seen".to_string(),
                };
                return Err(ForecastError::SearchFailure(detail));
            }

            candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

            if candidates.len() == 1 || budget >= max_epochs {
                break;
            }

            let survivors = (candidates.len() + 1) / 2;
            candidates.truncate(survivors);
            budget = (budget * 2).min(max_epochs);
        }

        let (best_model, best_loss) = candidates.into_iter().next().ok_or_else(|| {
            ForecastError::SearchFailure("No candidate survived the search".to_string())
        })?;

        info!(
            "Search selected {} (validation loss {:.6})",
            best_model.name(),
            best_loss
        );

        Ok(best_model)
    }
}

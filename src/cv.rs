//! K-fold cross-validation for model selection

use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::model::{HyperparameterProposal, ModelFactory};
use crate::search::SearchOracle;
use log::info;
use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffled k-fold index splitter
///
/// Sample indices are shuffled once with the given seed and cut into k
/// contiguous blocks (sizes within ±1 of each other). Fold f validates on
/// block f and trains on all other blocks, so every index lands in
/// validation exactly once across the k folds.
#[derive(Debug, Clone)]
pub struct KFold {
    k: usize,
    seed: u64,
}

impl KFold {
    /// Create a splitter with k folds and a shuffle seed
    pub fn new(k: usize, seed: u64) -> Result<Self> {
        if k < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "k-fold requires at least 2 folds, got {}",
                k
            )));
        }
        Ok(Self { k, seed })
    }

    /// Number of folds
    pub fn num_folds(&self) -> usize {
        self.k
    }

    /// Produce the (train, validation) index sets for every fold
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if n_samples < self.k {
            return Err(ForecastError::InsufficientData(format!(
                "{} samples cannot be split into {} folds",
                n_samples, self.k
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        // First n % k blocks get one extra index, as in standard k-fold.
        let base_size = n_samples / self.k;
        let remainder = n_samples % self.k;

        let mut folds = Vec::with_capacity(self.k);
        let mut start = 0;
        for f in 0..self.k {
            let block_size = base_size + usize::from(f < remainder);
            let end = start + block_size;

            let validation: Vec<usize> = indices[start..end].to_vec();
            let mut train: Vec<usize> = Vec::with_capacity(n_samples - block_size);
            train.extend_from_slice(&indices[..start]);
            train.extend_from_slice(&indices[end..]);

            folds.push((train, validation));
            start = end;
        }

        Ok(folds)
    }
}

/// Outcome of one cross-validation fold
#[derive(Debug, Clone)]
pub struct FoldResult {
    /// Index of the fold in [0, k)
    pub fold_index: usize,
    /// MSE of the fold's best model on its held-out validation block
    pub validation_loss: f64,
    /// The hyperparameter proposal the search settled on for this fold
    pub best_proposal: HyperparameterProposal,
}

/// Drives the search oracle once per fold and records validation performance
///
/// Folds run sequentially to completion; each fold owns its index sets and
/// its trained model, which is discarded once its validation loss has been
/// recorded. The runner performs model selection only; the final holdout
/// evaluation is carved out before any fold is constructed and never touches
/// the folds.
pub struct CrossValidationRunner<'a, O: SearchOracle> {
    oracle: &'a O,
    factory: &'a ModelFactory,
    space: &'a [HyperparameterProposal],
    config: &'a PipelineConfig,
}

impl<'a, O: SearchOracle> CrossValidationRunner<'a, O> {
    /// Create a runner over the given oracle, factory and proposal space
    pub fn new(
        oracle: &'a O,
        factory: &'a ModelFactory,
        space: &'a [HyperparameterProposal],
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            oracle,
            factory,
            space,
            config,
        }
    }

    /// Run k-fold cross-validation over the sample set
    pub fn run(&self, inputs: &Array3<f64>, outputs: &Array2<f64>) -> Result<Vec<FoldResult>> {
        let kfold = KFold::new(self.config.k_folds, self.config.random_seed)?;
        let folds = kfold.split(inputs.shape()[0])?;

        let mut results = Vec::with_capacity(folds.len());

        for (fold_index, (train_indices, validation_indices)) in folds.iter().enumerate() {
            info!("Training fold {}/{}", fold_index + 1, self.config.k_folds);

            let train_inputs = inputs.select(Axis(0), train_indices);
            let train_outputs = outputs.select(Axis(0), train_indices);
            let validation_inputs = inputs.select(Axis(0), validation_indices);
            let validation_outputs = outputs.select(Axis(0), validation_indices);

            let best_model = self.oracle.search(
                self.space,
                self.factory,
                &train_inputs,
                &train_outputs,
                &validation_inputs,
                &validation_outputs,
                self.config.max_search_epochs,
                self.config.early_stop_patience,
            )?;

            let validation_loss = best_model.evaluate(&validation_inputs, &validation_outputs)?;
            info!(
                "Fold {}/{} - validation loss: {:.6}",
                fold_index + 1,
                self.config.k_folds,
                validation_loss
            );

            results.push(FoldResult {
                fold_index,
                validation_loss,
                best_proposal: best_model.proposal(),
            });
        }

        Ok(results)
    }
}

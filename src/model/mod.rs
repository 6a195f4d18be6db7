//! Trainable sequence models and their construction

use crate::error::Result;
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod lstm;

pub use lstm::LstmRegressor;

/// One concrete assignment of hyperparameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperparameterProposal {
    /// Width of the recurrent layer
    pub recurrent_units: usize,
    /// Width of the dense hidden layer
    pub dense_units: usize,
}

impl HyperparameterProposal {
    /// Create a new proposal
    pub fn new(recurrent_units: usize, dense_units: usize) -> Self {
        Self {
            recurrent_units,
            dense_units,
        }
    }

    /// The default proposal grid: recurrent widths 32..=128 step 32 crossed
    /// with dense widths 16..=64 step 16
    pub fn default_grid() -> Vec<Self> {
        let mut grid = Vec::new();
        for recurrent_units in (32..=128).step_by(32) {
            for dense_units in (16..=64).step_by(16) {
                grid.push(Self::new(recurrent_units, dense_units));
            }
        }
        grid
    }
}

impl std::fmt::Display for HyperparameterProposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "recurrent={}, dense={}",
            self.recurrent_units, self.dense_units
        )
    }
}

/// A trainable sequence-to-scalar model
///
/// Inputs have shape `(samples, window_length, num_features)`; outputs have
/// shape `(samples, horizon_length)`. Training internals are opaque to the
/// rest of the pipeline, which only relies on this contract.
pub trait SequenceModel: Debug {
    /// Train on the given data, monitoring validation loss each epoch
    ///
    /// When `early_stop_patience` is set, training halts once validation loss
    /// has failed to improve for that many consecutive epochs. Returns the
    /// best validation loss observed.
    fn fit(
        &mut self,
        train_inputs: &Array3<f64>,
        train_outputs: &Array2<f64>,
        validation_inputs: &Array3<f64>,
        validation_outputs: &Array2<f64>,
        max_epochs: usize,
        early_stop_patience: Option<usize>,
    ) -> Result<f64>;

    /// Predict output horizons for a batch of input windows
    fn predict(&self, inputs: &Array3<f64>) -> Result<Array2<f64>>;

    /// Mean squared error of the model's predictions against the given outputs
    fn evaluate(&self, inputs: &Array3<f64>, outputs: &Array2<f64>) -> Result<f64>;

    /// The proposal this model was built from
    fn proposal(&self) -> HyperparameterProposal;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Builds untrained models of a fixed topology from hyperparameter proposals
///
/// The topology is always: one recurrent layer consuming the full window and
/// emitting its final hidden state, one dense hidden layer, one dense output
/// layer of exactly `horizon_length` units. MSE loss, Adam optimizer.
#[derive(Debug, Clone)]
pub struct ModelFactory {
    window_length: usize,
    num_features: usize,
    horizon_length: usize,
    seed: u64,
}

impl ModelFactory {
    /// Create a factory for the given input/output shape
    pub fn new(window_length: usize, num_features: usize, horizon_length: usize, seed: u64) -> Self {
        Self {
            window_length,
            num_features,
            horizon_length,
            seed,
        }
    }

    /// Build an untrained model for the proposal
    pub fn build(&self, proposal: HyperparameterProposal) -> Box<dyn SequenceModel> {
        Box::new(LstmRegressor::new(
            proposal,
            self.window_length,
            self.num_features,
            self.horizon_length,
            self.seed,
        ))
    }

    /// The window length models are built for
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// The number of input features models are built for
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// The horizon length models are built for
    pub fn horizon_length(&self) -> usize {
        self.horizon_length
    }
}

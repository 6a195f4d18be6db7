//! LSTM regressor with a trainable dense head
//!
//! Topology: one LSTM layer consuming the full input window and emitting its
//! final hidden state, followed by a linear dense hidden layer and a linear
//! dense output layer sized to the horizon. The recurrent weights are fixed
//! at initialization; the dense head is trained with Adam on MSE, which keeps
//! training fast enough for repeated hyperparameter trials while preserving
//! the sequence-summary behaviour of the recurrent layer.

use crate::error::{ForecastError, Result};
use crate::model::{HyperparameterProposal, SequenceModel};
use log::debug;
use ndarray::{s, Array1, Array2, Array3, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const BATCH_SIZE: usize = 32;

/// Single LSTM cell with input, forget, cell-candidate and output gates
#[derive(Debug, Clone)]
struct LstmCell {
    hidden_size: usize,
    // Input-to-gate weights, shape (hidden, input)
    w_i: Array2<f64>,
    w_f: Array2<f64>,
    w_g: Array2<f64>,
    w_o: Array2<f64>,
    // Hidden-to-gate weights, shape (hidden, hidden)
    u_i: Array2<f64>,
    u_f: Array2<f64>,
    u_g: Array2<f64>,
    u_o: Array2<f64>,
    // Gate biases
    b_i: Array1<f64>,
    b_f: Array1<f64>,
    b_g: Array1<f64>,
    b_o: Array1<f64>,
}

impl LstmCell {
    fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let dist = Uniform::new(-limit, limit);

        Self {
            hidden_size,
            w_i: Array2::random_using((hidden_size, input_size), dist, rng),
            w_f: Array2::random_using((hidden_size, input_size), dist, rng),
            w_g: Array2::random_using((hidden_size, input_size), dist, rng),
            w_o: Array2::random_using((hidden_size, input_size), dist, rng),
            u_i: Array2::random_using((hidden_size, hidden_size), dist, rng),
            u_f: Array2::random_using((hidden_size, hidden_size), dist, rng),
            u_g: Array2::random_using((hidden_size, hidden_size), dist, rng),
            u_o: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_i: Array1::zeros(hidden_size),
            // Forget gate bias starts at 1 so early training keeps cell state
            b_f: Array1::from_elem(hidden_size, 1.0),
            b_g: Array1::zeros(hidden_size),
            b_o: Array1::zeros(hidden_size),
        }
    }

    fn step(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let i_gate = sigmoid(&(self.w_i.dot(x) + self.u_i.dot(h_prev) + &self.b_i));
        let f_gate = sigmoid(&(self.w_f.dot(x) + self.u_f.dot(h_prev) + &self.b_f));
        let g = tanh(&(self.w_g.dot(x) + self.u_g.dot(h_prev) + &self.b_g));
        let o_gate = sigmoid(&(self.w_o.dot(x) + self.u_o.dot(h_prev) + &self.b_o));

        let c_next = &f_gate * c_prev + &i_gate * &g;
        let h_next = &o_gate * &tanh(&c_next);

        (h_next, c_next)
    }

    /// Run the cell over a full window and return only the final hidden state
    fn summarize(&self, window: &ndarray::ArrayView2<f64>) -> Array1<f64> {
        let mut h = Array1::zeros(self.hidden_size);
        let mut c = Array1::zeros(self.hidden_size);

        for t in 0..window.nrows() {
            let x = window.row(t).to_owned();
            let (h_next, c_next) = self.step(&x, &h, &c);
            h = h_next;
            c = c_next;
        }

        h
    }
}

/// Linear dense layer, weights shape (out, in)
#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl DenseLayer {
    fn new(input_size: usize, output_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / input_size as f64).sqrt();
        Self {
            weights: Array2::random_using((output_size, input_size), Uniform::new(-limit, limit), rng),
            bias: Array1::zeros(output_size),
        }
    }

    fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        self.weights.dot(x) + &self.bias
    }
}

/// Adam optimizer state for one dense layer
#[derive(Debug)]
struct AdamState {
    m_weights: Array2<f64>,
    v_weights: Array2<f64>,
    m_bias: Array1<f64>,
    v_bias: Array1<f64>,
}

impl AdamState {
    fn new(layer: &DenseLayer) -> Self {
        Self {
            m_weights: Array2::zeros(layer.weights.raw_dim()),
            v_weights: Array2::zeros(layer.weights.raw_dim()),
            m_bias: Array1::zeros(layer.bias.raw_dim()),
            v_bias: Array1::zeros(layer.bias.raw_dim()),
        }
    }

    /// One Adam update with library-default hyperparameters
    fn apply(
        &mut self,
        layer: &mut DenseLayer,
        grad_weights: &Array2<f64>,
        grad_bias: &Array1<f64>,
        step: usize,
    ) {
        const LR: f64 = 1e-3;
        const BETA1: f64 = 0.9;
        const BETA2: f64 = 0.999;
        const EPS: f64 = 1e-8;

        let t = step as f64;
        let correction1 = 1.0 - BETA1.powf(t);
        let correction2 = 1.0 - BETA2.powf(t);

        self.m_weights = &self.m_weights * BETA1 + &(grad_weights * (1.0 - BETA1));
        self.v_weights = &self.v_weights * BETA2 + &(grad_weights.mapv(|g| g * g) * (1.0 - BETA2));
        let m_hat = &self.m_weights / correction1;
        let v_hat = &self.v_weights / correction2;
        layer.weights = &layer.weights - &(m_hat / (v_hat.mapv(f64::sqrt) + EPS) * LR);

        self.m_bias = &self.m_bias * BETA1 + &(grad_bias * (1.0 - BETA1));
        self.v_bias = &self.v_bias * BETA2 + &(grad_bias.mapv(|g| g * g) * (1.0 - BETA2));
        let m_hat = &self.m_bias / correction1;
        let v_hat = &self.v_bias / correction2;
        layer.bias = &layer.bias - &(m_hat / (v_hat.mapv(f64::sqrt) + EPS) * LR);
    }
}

/// LSTM-based regressor predicting a fixed-length horizon
#[derive(Debug, Clone)]
pub struct LstmRegressor {
    name: String,
    proposal: HyperparameterProposal,
    window_length: usize,
    num_features: usize,
    horizon_length: usize,
    seed: u64,
    cell: LstmCell,
    hidden_layer: DenseLayer,
    output_layer: DenseLayer,
}

impl LstmRegressor {
    /// Create an untrained regressor with seeded weights
    pub fn new(
        proposal: HyperparameterProposal,
        window_length: usize,
        num_features: usize,
        horizon_length: usize,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let cell = LstmCell::new(num_features, proposal.recurrent_units, &mut rng);
        let hidden_layer = DenseLayer::new(proposal.recurrent_units, proposal.dense_units, &mut rng);
        let output_layer = DenseLayer::new(proposal.dense_units, horizon_length, &mut rng);

        Self {
            name: format!("LSTM ({})", proposal),
            proposal,
            window_length,
            num_features,
            horizon_length,
            seed,
            cell,
            hidden_layer,
            output_layer,
        }
    }

    fn check_inputs(&self, inputs: &Array3<f64>) -> Result<()> {
        if inputs.shape()[1] != self.window_length || inputs.shape()[2] != self.num_features {
            return Err(ForecastError::ShapeMismatch(format!(
                "Model expects windows of shape ({}, {}), got ({}, {})",
                self.window_length,
                self.num_features,
                inputs.shape()[1],
                inputs.shape()[2]
            )));
        }
        Ok(())
    }

    fn check_pair(&self, inputs: &Array3<f64>, outputs: &Array2<f64>) -> Result<()> {
        self.check_inputs(inputs)?;
        if outputs.nrows() != inputs.shape()[0] {
            return Err(ForecastError::ShapeMismatch(format!(
                "{} input windows but {} output horizons",
                inputs.shape()[0],
                outputs.nrows()
            )));
        }
        if outputs.ncols() != self.horizon_length {
            return Err(ForecastError::ShapeMismatch(format!(
                "Model predicts {} horizon steps, outputs have {}",
                self.horizon_length,
                outputs.ncols()
            )));
        }
        Ok(())
    }

    /// Summarize every input window into its final recurrent hidden state
    ///
    /// The recurrent weights never change during training, so these states
    /// are computed once per fit and reused every epoch.
    fn summarize_batch(&self, inputs: &Array3<f64>) -> Array2<f64> {
        let n_samples = inputs.shape()[0];
        let mut states = Array2::zeros((n_samples, self.proposal.recurrent_units));

        for i in 0..n_samples {
            let window = inputs.slice(s![i, .., ..]);
            let h = self.cell.summarize(&window);
            states.row_mut(i).assign(&h);
        }

        states
    }

    fn head_forward(&self, hidden_state: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let activation = self.hidden_layer.forward(hidden_state);
        let prediction = self.output_layer.forward(&activation);
        (activation, prediction)
    }

    fn loss_on_states(&self, states: &Array2<f64>, outputs: &Array2<f64>) -> f64 {
        let n = states.nrows();
        if n == 0 {
            return f64::NAN;
        }

        let mut total = 0.0;
        for i in 0..n {
            let h = states.row(i).to_owned();
            let (_, prediction) = self.head_forward(&h);
            let target = outputs.row(i);
            for (p, a) in prediction.iter().zip(target.iter()) {
                total += (p - a).powi(2);
            }
        }

        total / (n * self.horizon_length) as f64
    }
}

impl SequenceModel for LstmRegressor {
    fn fit(
        &mut self,
        train_inputs: &Array3<f64>,
        train_outputs: &Array2<f64>,
        validation_inputs: &Array3<f64>,
        validation_outputs: &Array2<f64>,
        max_epochs: usize,
        early_stop_patience: Option<usize>,
    ) -> Result<f64> {
        self.check_pair(train_inputs, train_outputs)?;
        self.check_pair(validation_inputs, validation_outputs)?;
        if train_inputs.shape()[0] == 0 {
            return Err(ForecastError::InsufficientData(
                "No training samples to fit on".to_string(),
            ));
        }

        let train_states = self.summarize_batch(train_inputs);
        let validation_states = self.summarize_batch(validation_inputs);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut indices: Vec<usize> = (0..train_states.nrows()).collect();

        let mut hidden_adam = AdamState::new(&self.hidden_layer);
        let mut output_adam = AdamState::new(&self.output_layer);
        let mut adam_step = 0;

        let mut best_val_loss = f64::INFINITY;
        let mut epochs_without_improvement = 0;

        for epoch in 0..max_epochs {
            indices.shuffle(&mut rng);

            for batch in indices.chunks(BATCH_SIZE) {
                let mut grad_w2 = Array2::zeros(self.output_layer.weights.raw_dim());
                let mut grad_b2 = Array1::zeros(self.output_layer.bias.raw_dim());
                let mut grad_w1 = Array2::zeros(self.hidden_layer.weights.raw_dim());
                let mut grad_b1 = Array1::zeros(self.hidden_layer.bias.raw_dim());

                let scale = 2.0 / (batch.len() * self.horizon_length) as f64;

                for &idx in batch {
                    let h = train_states.row(idx).to_owned();
                    let (activation, prediction) = self.head_forward(&h);
                    let error = &prediction - &train_outputs.row(idx);

                    let d_prediction = error.mapv(|e| e * scale);
                    grad_w2 = grad_w2
                        + d_prediction
                            .view()
                            .insert_axis(Axis(1))
                            .dot(&activation.view().insert_axis(Axis(0)));
                    grad_b2 = grad_b2 + &d_prediction;

                    let d_activation = self.output_layer.weights.t().dot(&d_prediction);
                    grad_w1 = grad_w1
                        + d_activation
                            .view()
                            .insert_axis(Axis(1))
                            .dot(&h.view().insert_axis(Axis(0)));
                    grad_b1 = grad_b1 + &d_activation;
                }

                adam_step += 1;
                output_adam.apply(&mut self.output_layer, &grad_w2, &grad_b2, adam_step);
                hidden_adam.apply(&mut self.hidden_layer, &grad_w1, &grad_b1, adam_step);
            }

            let val_loss = self.loss_on_states(&validation_states, validation_outputs);
            debug!(
                "{}: epoch {}/{} validation loss {:.6}",
                self.name,
                epoch + 1,
                max_epochs,
                val_loss
            );

            if val_loss.is_finite() && val_loss < best_val_loss {
                best_val_loss = val_loss;
                epochs_without_improvement = 0;
            } else {
                epochs_without_improvement += 1;
                if let Some(patience) = early_stop_patience {
                    if epochs_without_improvement >= patience {
                        debug!(
                            "{}: stopping early after epoch {} (no improvement for {} epochs)",
                            self.name,
                            epoch + 1,
                            patience
                        );
                        break;
                    }
                }
            }
        }

        Ok(best_val_loss)
    }

    fn predict(&self, inputs: &Array3<f64>) -> Result<Array2<f64>> {
        self.check_inputs(inputs)?;

        let n_samples = inputs.shape()[0];
        let mut predictions = Array2::zeros((n_samples, self.horizon_length));

        for i in 0..n_samples {
            let window = inputs.slice(s![i, .., ..]);
            let h = self.cell.summarize(&window);
            let (_, prediction) = self.head_forward(&h);
            predictions.row_mut(i).assign(&prediction);
        }

        Ok(predictions)
    }

    fn evaluate(&self, inputs: &Array3<f64>, outputs: &Array2<f64>) -> Result<f64> {
        self.check_pair(inputs, outputs)?;
        let states = self.summarize_batch(inputs);
        Ok(self.loss_on_states(&states, outputs))
    }

    fn proposal(&self) -> HyperparameterProposal {
        self.proposal
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(f64::tanh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn small_model() -> LstmRegressor {
        LstmRegressor::new(HyperparameterProposal::new(8, 4), 5, 2, 1, 42)
    }

    #[test]
    fn test_predict_shape() {
        let model = small_model();
        let inputs = Array3::zeros((3, 5, 2));

        let predictions = model.predict(&inputs).unwrap();

        assert_eq!(predictions.shape(), &[3, 1]);
    }

    #[test]
    fn test_predict_rejects_wrong_window() {
        let model = small_model();
        let inputs = Array3::zeros((3, 4, 2));

        assert!(model.predict(&inputs).is_err());
    }

    #[test]
    fn test_fit_reduces_validation_loss() {
        let mut model = small_model();

        // Constant target, easy to fit with a linear head
        let inputs = Array3::from_elem((16, 5, 2), 0.5);
        let outputs = Array2::from_elem((16, 1), 0.3);
        let val_inputs = Array3::from_elem((4, 5, 2), 0.5);
        let val_outputs = Array2::from_elem((4, 1), 0.3);

        let before = model.evaluate(&val_inputs, &val_outputs).unwrap();
        let best = model
            .fit(&inputs, &outputs, &val_inputs, &val_outputs, 50, None)
            .unwrap();

        assert!(best.is_finite());
        assert!(best <= before);
    }

    #[test]
    fn test_fit_is_deterministic_for_seed() {
        let inputs = Array3::from_elem((8, 5, 2), 0.25);
        let outputs = Array2::from_elem((8, 1), 0.6);

        let mut a = small_model();
        let mut b = small_model();
        let loss_a = a.fit(&inputs, &outputs, &inputs, &outputs, 5, None).unwrap();
        let loss_b = b.fit(&inputs, &outputs, &inputs, &outputs, 5, None).unwrap();

        assert_eq!(loss_a, loss_b);
    }
}

//! Conversion of scaled tables into supervised sequence samples

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Array3};

/// Build fixed-length input windows and their output horizons
///
/// For window start index `i`, the input covers feature rows `[i, i + L)` and
/// the output covers target rows `[i + L, i + L + H)`, so the horizon starts
/// immediately after the window ends, with no gap and no overlap. The result
/// holds exactly `N - L - H + 1` samples.
///
/// Returns `(inputs, outputs)` with shapes `(samples, window_length,
/// num_features)` and `(samples, horizon_length)`.
pub fn make_sequences(
    features: &Array2<f64>,
    target: &Array1<f64>,
    window_length: usize,
    horizon_length: usize,
) -> Result<(Array3<f64>, Array2<f64>)> {
    let n_rows = features.nrows();
    let n_features = features.ncols();

    if target.len() != n_rows {
        return Err(ForecastError::ShapeMismatch(format!(
            "Feature matrix has {} rows, target vector has {}",
            n_rows,
            target.len()
        )));
    }

    if window_length + horizon_length > n_rows {
        return Err(ForecastError::InsufficientData(format!(
            "window_length ({}) + horizon_length ({}) exceeds the {} available rows",
            window_length, horizon_length, n_rows
        )));
    }

    let n_samples = n_rows - window_length - horizon_length + 1;

    let mut inputs = Array3::zeros((n_samples, window_length, n_features));
    let mut outputs = Array2::zeros((n_samples, horizon_length));

    for i in 0..n_samples {
        for t in 0..window_length {
            for f in 0..n_features {
                inputs[[i, t, f]] = features[[i + t, f]];
            }
        }
        for h in 0..horizon_length {
            outputs[[i, h]] = target[i + window_length + h];
        }
    }

    Ok((inputs, outputs))
}

//! Reversible per-column min-max scaling

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};

/// Per-column min-max scaler mapping observed values into [0, 1]
///
/// The feature matrix and the target vector must each get their own scaler
/// instance, so that inverse-transforming predictions recovers target units
/// and nothing else.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min_vals: Vec<f64>,
    max_vals: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit the scaler on a feature matrix, one min/max pair per column
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(ForecastError::DataError(
                "Cannot fit scaler on empty data".to_string(),
            ));
        }

        let mut min_vals = vec![f64::INFINITY; data.ncols()];
        let mut max_vals = vec![f64::NEG_INFINITY; data.ncols()];

        for row in data.rows() {
            for (j, &value) in row.iter().enumerate() {
                if value < min_vals[j] {
                    min_vals[j] = value;
                }
                if value > max_vals[j] {
                    max_vals[j] = value;
                }
            }
        }

        Ok(Self { min_vals, max_vals })
    }

    /// Fit the scaler on a single column
    pub fn fit_column(data: &Array1<f64>) -> Result<Self> {
        let matrix = data
            .view()
            .into_shape((data.len(), 1))
            .map_err(|e| ForecastError::ShapeMismatch(e.to_string()))?
            .to_owned();
        Self::fit(&matrix)
    }

    /// Fit on a matrix and return its scaled copy
    pub fn fit_transform(data: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(data)?;
        let scaled = scaler.transform(data)?;
        Ok((scaler, scaled))
    }

    /// Fit on a single column and return its scaled copy
    pub fn fit_transform_column(data: &Array1<f64>) -> Result<(Self, Array1<f64>)> {
        let scaler = Self::fit_column(data)?;
        let scaled = scaler.transform_column(data)?;
        Ok((scaler, scaled))
    }

    /// Number of columns the scaler was fitted on
    pub fn num_columns(&self) -> usize {
        self.min_vals.len()
    }

    /// Map each column linearly into [0, 1] using the fitted min/max
    ///
    /// A column with zero observed range maps to 0.0.
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_columns(data.ncols())?;

        let mut scaled = data.clone();
        for mut row in scaled.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                let range = self.max_vals[j] - self.min_vals[j];
                *value = if range == 0.0 {
                    0.0
                } else {
                    (*value - self.min_vals[j]) / range
                };
            }
        }

        Ok(scaled)
    }

    /// Scale a single column (the scaler must have been fitted on one column)
    pub fn transform_column(&self, data: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_columns(1)?;

        let range = self.max_vals[0] - self.min_vals[0];
        Ok(data.mapv(|v| {
            if range == 0.0 {
                0.0
            } else {
                (v - self.min_vals[0]) / range
            }
        }))
    }

    /// Map scaled values back into the units the scaler was fitted on
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_columns(data.ncols())?;

        let mut restored = data.clone();
        for mut row in restored.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                let range = self.max_vals[j] - self.min_vals[j];
                *value = *value * range + self.min_vals[j];
            }
        }

        Ok(restored)
    }

    /// Inverse-transform a single column of scaled values
    pub fn inverse_transform_column(&self, data: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_columns(1)?;

        let range = self.max_vals[0] - self.min_vals[0];
        Ok(data.mapv(|v| v * range + self.min_vals[0]))
    }

    /// Inverse-transform a (samples, horizon) matrix whose every element is
    /// in the scale of a single-column scaler
    pub fn inverse_transform_horizons(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_columns(1)?;

        let range = self.max_vals[0] - self.min_vals[0];
        Ok(data.mapv(|v| v * range + self.min_vals[0]))
    }

    fn check_columns(&self, ncols: usize) -> Result<()> {
        if ncols != self.min_vals.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "Scaler was fitted on {} columns, got {}",
                self.min_vals.len(),
                ncols
            )));
        }
        Ok(())
    }
}

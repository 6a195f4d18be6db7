//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Date layouts seen in daily price exports
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

/// Chronologically ordered table of feature columns plus one target column
///
/// Rows are guaranteed to run oldest-first once the table is constructed;
/// `DataLoader` takes care of reversing newest-first source files.
#[derive(Debug, Clone)]
pub struct RawSeriesTable {
    /// One row per time step, one column per feature
    features: Array2<f64>,
    /// Names of the feature columns, in matrix column order
    feature_names: Vec<String>,
    /// Target column, same length as the feature matrix
    target: Array1<f64>,
}

/// Data loader for raw time series tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a newest-first CSV file into a chronologically ascending table
    ///
    /// The file must contain a date column (used only to establish ordering,
    /// then dropped), numeric feature columns and the named target column.
    pub fn from_csv<P: AsRef<Path>>(path: P, target_column: &str) -> Result<RawSeriesTable> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        // Source files arrive most-recent-first; all downstream windowing
        // assumes chronological ascending order.
        let df = df.reverse();

        if let Some(time_column) = Self::detect_time_column(&df) {
            Self::verify_chronological(&df, &time_column)?;
        }

        Self::extract_table(&df, target_column)
    }

    /// Build a table from an existing DataFrame (already newest-first is the
    /// caller's responsibility to fix; this expects chronological order)
    pub fn from_dataframe(df: &DataFrame, target_column: &str) -> Result<RawSeriesTable> {
        Self::extract_table(df, target_column)
    }

    fn extract_table(df: &DataFrame, target_column: &str) -> Result<RawSeriesTable> {
        let time_column = Self::detect_time_column(df);

        let target_series = df.column(target_column).map_err(|_| {
            ForecastError::DataError(format!(
                "Target column '{}' not found in data",
                target_column
            ))
        })?;
        let target_values = Self::series_as_f64(target_series)?;

        let mut feature_names = Vec::new();
        let mut feature_columns: Vec<Vec<f64>> = Vec::new();

        for series in df.get_columns() {
            let name = series.name();
            if let Some(ref time_name) = time_column {
                if name == time_name {
                    continue;
                }
            }
            // The target must be excluded from the feature set explicitly; a
            // target column sneaking into the inputs is a leakage bug.
            if name == target_column {
                continue;
            }
            if !series.dtype().is_numeric() {
                continue;
            }
            feature_names.push(name.to_string());
            feature_columns.push(Self::series_as_f64(series)?);
        }

        if feature_columns.is_empty() {
            return Err(ForecastError::DataError(
                "No numeric feature columns found in data".to_string(),
            ));
        }

        let n_rows = target_values.len();
        for (name, column) in feature_names.iter().zip(&feature_columns) {
            if column.len() != n_rows {
                return Err(ForecastError::ShapeMismatch(format!(
                    "Column '{}' has {} rows, target has {}",
                    name,
                    column.len(),
                    n_rows
                )));
            }
        }

        let n_features = feature_columns.len();
        let mut features = Array2::zeros((n_rows, n_features));
        for (j, column) in feature_columns.iter().enumerate() {
            for (i, &value) in column.iter().enumerate() {
                features[[i, j]] = value;
            }
        }

        RawSeriesTable::new(features, feature_names, Array1::from(target_values))
    }

    /// Check that the date column runs oldest-first after reversal
    ///
    /// The dates are consumed only for this ordering check and discarded
    /// afterwards. Columns whose values do not parse as dates are skipped.
    fn verify_chronological(df: &DataFrame, time_column: &str) -> Result<()> {
        let series = match df.column(time_column) {
            Ok(series) => series,
            Err(_) => return Ok(()),
        };
        let strings = match series.utf8() {
            Ok(strings) => strings,
            Err(_) => return Ok(()),
        };

        let mut previous: Option<NaiveDate> = None;
        for value in strings.into_iter().flatten() {
            let parsed = DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok());
            let date = match parsed {
                Some(date) => date,
                None => return Ok(()),
            };

            if let Some(prev) = previous {
                if date < prev {
                    return Err(ForecastError::DataError(format!(
                        "Rows are not in a consistent time order around '{}'",
                        value
                    )));
                }
            }
            previous = Some(date);
        }

        Ok(())
    }

    /// Detect the date/time column in a DataFrame, if any
    fn detect_time_column(df: &DataFrame) -> Option<String> {
        for name in df.get_column_names() {
            let lower_name = name.to_lowercase();
            if lower_name.contains("time")
                || lower_name.contains("date")
                || lower_name.contains("timestamp")
            {
                return Some(name.to_string());
            }
        }

        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Some(first_col.name().to_string());
            }
        }

        None
    }

    /// Convert a Series to f64 values
    fn series_as_f64(series: &Series) -> Result<Vec<f64>> {
        match series.dtype() {
            DataType::Float64 => Ok(series.f64()?.into_iter().flatten().collect()),
            DataType::Float32 => Ok(series
                .f32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int64 => Ok(series
                .i64()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::Int32 => Ok(series
                .i32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::UInt64 => Ok(series
                .u64()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            DataType::UInt32 => Ok(series
                .u32()?
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect()),
            _ => Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                series.name()
            ))),
        }
    }
}

impl RawSeriesTable {
    /// Create a table from pre-built arrays (chronological ascending order)
    pub fn new(
        features: Array2<f64>,
        feature_names: Vec<String>,
        target: Array1<f64>,
    ) -> Result<Self> {
        if features.nrows() != target.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "Feature matrix has {} rows, target has {}",
                features.nrows(),
                target.len()
            )));
        }
        if feature_names.len() != features.ncols() {
            return Err(ForecastError::ShapeMismatch(format!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                features.ncols()
            )));
        }

        Ok(Self {
            features,
            feature_names,
            target,
        })
    }

    /// Get the feature matrix
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Get the feature column names
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Get the target vector
    pub fn target(&self) -> &Array1<f64> {
        &self.target
    }

    /// Number of time steps in the table
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Check whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Number of feature columns
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }
}

//! Pipeline configuration

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Configuration for a full forecasting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Size of the input lookback window
    pub window_length: usize,
    /// Number of future steps predicted per sample
    pub horizon_length: usize,
    /// Number of cross-validation folds
    pub k_folds: usize,
    /// Epoch ceiling for each hyperparameter search call
    pub max_search_epochs: usize,
    /// Epochs without validation improvement before a proposal stops training
    pub early_stop_patience: usize,
    /// Fraction of samples carved out for the final holdout evaluation
    pub test_fraction: f64,
    /// Seed for every shuffle, split and weight initialization in the run
    pub random_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_length: 10,
            horizon_length: 1,
            k_folds: 5,
            max_search_epochs: 50,
            early_stop_patience: 3,
            test_fraction: 0.2,
            random_seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the window length
    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    /// Set the horizon length
    pub fn with_horizon_length(mut self, horizon_length: usize) -> Self {
        self.horizon_length = horizon_length;
        self
    }

    /// Set the number of folds
    pub fn with_k_folds(mut self, k_folds: usize) -> Self {
        self.k_folds = k_folds;
        self
    }

    /// Set the search epoch ceiling
    pub fn with_max_search_epochs(mut self, max_search_epochs: usize) -> Self {
        self.max_search_epochs = max_search_epochs;
        self
    }

    /// Set the early-stopping patience
    pub fn with_early_stop_patience(mut self, early_stop_patience: usize) -> Self {
        self.early_stop_patience = early_stop_patience;
        self
    }

    /// Set the holdout fraction
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Set the random seed
    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// Check that every option is in its valid range
    pub fn validate(&self) -> Result<()> {
        if self.window_length == 0 {
            return Err(ForecastError::InvalidParameter(
                "window_length must be at least 1".to_string(),
            ));
        }
        if self.horizon_length == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon_length must be at least 1".to_string(),
            ));
        }
        if self.k_folds < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "k_folds must be at least 2, got {}",
                self.k_folds
            )));
        }
        if self.max_search_epochs == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_search_epochs must be at least 1".to_string(),
            ));
        }
        if self.early_stop_patience == 0 {
            return Err(ForecastError::InvalidParameter(
                "early_stop_patience must be at least 1".to_string(),
            ));
        }
        if self.test_fraction <= 0.0 || self.test_fraction >= 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_length, 10);
        assert_eq!(config.k_folds, 5);
    }

    #[test]
    fn test_builder_setters() {
        let config = PipelineConfig::new()
            .with_window_length(20)
            .with_horizon_length(3)
            .with_k_folds(4)
            .with_test_fraction(0.25)
            .with_random_seed(7);

        assert!(config.validate().is_ok());
        assert_eq!(config.window_length, 20);
        assert_eq!(config.horizon_length, 3);
        assert_eq!(config.k_folds, 4);
        assert_eq!(config.random_seed, 7);
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(PipelineConfig::new().with_window_length(0).validate().is_err());
        assert!(PipelineConfig::new().with_k_folds(1).validate().is_err());
        assert!(PipelineConfig::new().with_test_fraction(0.0).validate().is_err());
        assert!(PipelineConfig::new().with_test_fraction(1.0).validate().is_err());
        assert!(PipelineConfig::new().with_early_stop_patience(0).validate().is_err());
    }
}

// External crates
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Internal modules
use crate::constants::{
    DEFAULT_END_DATE, DEFAULT_START_DATE, DEFAULT_SYMBOL, FUTURE_STEPS, SEQUENCE_LENGTH,
    TRAIN_SPLIT_RATIO,
};
use crate::daily::lstm::step_3_lstm_model_arch::DailyLSTMModelConfig;
use crate::daily::lstm::step_4_train_model::TrainingConfig;
use crate::error::{ForecastError, ForecastResult};

/// Settings for one end-to-end forecasting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    /// Exclusive
    pub end_date: NaiveDate,
    pub window_len: usize,
    pub train_ratio: f64,
    pub future_steps: usize,
    /// Directory receiving the model files and the prediction CSV
    pub output_dir: PathBuf,
    pub model: DailyLSTMModelConfig,
    pub training: TrainingConfig,
}

fn constant_date((year, month, day): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            start_date: constant_date(DEFAULT_START_DATE),
            end_date: constant_date(DEFAULT_END_DATE),
            window_len: SEQUENCE_LENGTH,
            train_ratio: TRAIN_SPLIT_RATIO,
            future_steps: FUTURE_STEPS,
            output_dir: PathBuf::from("."),
            model: DailyLSTMModelConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Default settings for another ticker
    pub fn for_symbol(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            ..Self::default()
        }
    }

    /// Reject settings that cannot produce a run
    pub fn validate(&self) -> ForecastResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(ForecastError::InvalidConfig("symbol is empty".to_string()));
        }
        if self.start_date >= self.end_date {
            return Err(ForecastError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.window_len == 0 {
            return Err(ForecastError::InvalidConfig(
                "window length must be positive".to_string(),
            ));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ForecastError::InvalidConfig(format!(
                "train ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        if self.model.input_size != 1 {
            return Err(ForecastError::InvalidConfig(format!(
                "only close prices are modelled, input size must be 1, got {}",
                self.model.input_size
            )));
        }
        if self.model.hidden_size == 0 || self.model.dense_size == 0 {
            return Err(ForecastError::InvalidConfig(
                "layer sizes must be positive".to_string(),
            ));
        }
        if self.training.batch_size == 0 || self.training.epochs == 0 {
            return Err(ForecastError::InvalidConfig(
                "batch size and epochs must be positive".to_string(),
            ));
        }
        if !(self.training.learning_rate > 0.0 && self.training.learning_rate.is_finite()) {
            return Err(ForecastError::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.training.learning_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(config.window_len, 60);
        assert_eq!(config.future_steps, 30);
        assert_eq!(config.training.epochs, 20);
        assert_eq!(config.training.batch_size, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_symbol_uppercases() {
        assert_eq!(ForecastConfig::for_symbol("msft").symbol, "MSFT");
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = ForecastConfig::default();
        config.end_date = config.start_date;
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidDateRange { .. })
        ));

        let mut config = ForecastConfig::default();
        config.train_ratio = 1.0;
        assert!(config.validate().is_err());

        let mut config = ForecastConfig::default();
        config.window_len = 0;
        assert!(config.validate().is_err());

        let mut config = ForecastConfig::default();
        config.training.batch_size = 0;
        assert!(config.validate().is_err());
    }
}

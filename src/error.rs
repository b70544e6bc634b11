// External crates
use chrono::NaiveDate;
use polars::error::PolarsError;
use thiserror::Error;

/// Errors raised by the forecasting stages
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("No price data returned for {symbol}")]
    EmptySeries { symbol: String },

    #[error("Insufficient data in {split}: need at least {needed} prices, got {got}")]
    InsufficientData {
        split: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("Cannot scale prices: min and max are both {value}")]
    DegenerateRange { value: f64 },

    #[error("Scaled value at index {index} is not finite")]
    NonFiniteScaled { index: usize },

    #[error("Invalid close price {price} on {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("Invalid date range: start {start} is not before end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Price API error [{code}]: {description}")]
    Api { code: String, description: String },

    #[error("Failed to decode price data: {0}")]
    Decode(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model error: {0}")]
    Model(String),
}

pub type ForecastResult<T> = Result<T, ForecastError>;

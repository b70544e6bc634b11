// External crates
use chrono::NaiveDate;
use polars::prelude::*;

// Internal modules
use crate::error::{ForecastError, ForecastResult};

/// Chronologically ordered daily closing prices for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from `(date, close)` rows in any order
    ///
    /// Rows are sorted by date and repeated dates keep their last value.
    /// Closes must be finite and positive.
    pub fn from_rows(symbol: &str, mut rows: Vec<(NaiveDate, f64)>) -> ForecastResult<Self> {
        for &(date, price) in &rows {
            if !price.is_finite() || price <= 0.0 {
                return Err(ForecastError::InvalidPrice { date, price });
            }
        }

        // Stable sort keeps source order among equal dates, so the last one wins
        rows.sort_by_key(|&(date, _)| date);
        let mut dates: Vec<NaiveDate> = Vec::with_capacity(rows.len());
        let mut closes: Vec<f64> = Vec::with_capacity(rows.len());
        for (date, close) in rows {
            if dates.last() == Some(&date) {
                if let Some(last) = closes.last_mut() {
                    *last = close;
                }
                continue;
            }
            dates.push(date);
            closes.push(close);
        }

        Ok(Self {
            symbol: symbol.to_string(),
            dates,
            closes,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Rows with `start <= date < end`
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let (dates, closes) = self
            .dates
            .iter()
            .zip(self.closes.iter())
            .filter(|(date, _)| **date >= start && **date < end)
            .map(|(date, close)| (*date, *close))
            .unzip();
        Self {
            symbol: self.symbol.clone(),
            dates,
            closes,
        }
    }

    /// Fail with `EmptySeries` instead of letting an empty fetch reach the scaler
    pub fn ensure_not_empty(self) -> ForecastResult<Self> {
        if self.is_empty() {
            return Err(ForecastError::EmptySeries {
                symbol: self.symbol,
            });
        }
        Ok(self)
    }

    /// Convert to a `Date` / `Close` DataFrame with ISO-formatted dates
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<String> = self
            .dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
        DataFrame::new(vec![
            Series::new("Date".into(), dates).into(),
            Series::new("Close".into(), self.closes.clone()).into(),
        ])
    }
}

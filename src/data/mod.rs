//! Upstream price data
//!
//! The pipeline only sees the [`PriceSource`] trait; the Yahoo Finance client
//! and the local CSV reader are interchangeable behind it.

pub mod price_series;
pub mod yahoo;

// External crates
use chrono::NaiveDate;

// Internal modules
use crate::constants::COVERAGE_TOLERANCE_DAYS;
use crate::error::{ForecastError, ForecastResult};
pub use price_series::PriceSeries;
pub use yahoo::YahooPriceSource;

/// A source of daily closing prices for `start <= date < end`
pub trait PriceSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> ForecastResult<PriceSeries>;
}

/// Calendar days missing at the head and tail of `series` relative to `[start, end)`
///
/// Returns `(0, 0)` for an empty series.
pub fn coverage_gaps(series: &PriceSeries, start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    match (series.dates().first(), series.last_date()) {
        (Some(&first), Some(last)) => (
            (first - start).num_days().max(0),
            ((end - last).num_days() - 1).max(0),
        ),
        _ => (0, 0),
    }
}

/// Fetch from `source` and reject an empty result with a clear error
///
/// A series that covers only part of the range (future end date, late
/// listing, delisted symbol) is kept and used as is, with a warning.
pub fn fetch_prices<S: PriceSource + ?Sized>(
    source: &S,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> ForecastResult<PriceSeries> {
    if start >= end {
        return Err(ForecastError::InvalidDateRange { start, end });
    }
    log::info!("Fetching {} closes from {} to {}", symbol, start, end);
    let series = source.fetch(symbol, start, end)?.ensure_not_empty()?;
    let first = series.dates()[0];
    let last = series.dates()[series.len() - 1];
    log::info!(
        "Fetched {} trading days for {} ({} .. {})",
        series.len(),
        symbol,
        first,
        last
    );

    let (head_gap, tail_gap) = coverage_gaps(&series, start, end);
    if head_gap > COVERAGE_TOLERANCE_DAYS {
        log::warn!(
            "{} data starts {} days after the requested start {} (first close {})",
            symbol,
            head_gap,
            start,
            first
        );
    }
    if tail_gap > COVERAGE_TOLERANCE_DAYS {
        log::warn!(
            "{} data ends {} days before the requested end {} (last close {}), continuing with truncated data",
            symbol,
            tail_gap,
            end,
            last
        );
    }
    Ok(series)
}

// External crates
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

// Internal modules
use crate::data::{PriceSeries, PriceSource};
use crate::error::{ForecastError, ForecastResult};

/// Map a raw CSV header to the standard `date` / `close` names
///
/// Matching is case-insensitive and accepts the common abbreviations seen in
/// exported bar files. Adjusted closes are deliberately not treated as closes.
fn standard_column_name(column_name: &str) -> Option<&'static str> {
    match column_name.trim().to_lowercase().as_str() {
        "timestamp" | "time" | "date" | "t" | "datetime" | "dt" | "day" => Some("date"),
        "close" | "c" | "cl" | "closeprice" | "close_price" => Some("close"),
        _ => None,
    }
}

/// Parse `YYYY-MM-DD`, also accepting a trailing time or timezone suffix
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let prefix = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Read a daily price CSV into a `PriceSeries`
///
/// # Arguments
///
/// * `file_path` - Path to a CSV file with a header row containing a date and a close column
/// * `symbol` - Symbol recorded on the returned series
///
/// # Returns
///
/// The parsed series, sorted by date. Rows with a missing close are dropped.
pub fn read_price_csv<P: AsRef<Path>>(file_path: P, symbol: &str) -> ForecastResult<PriceSeries> {
    let file_path = file_path.as_ref();
    log::info!("Loading prices from: {}", file_path.display());

    let file = File::open(file_path)?;
    let df = CsvReader::new(file).finish()?;

    let mut date_column = None;
    let mut close_column = None;
    for column_name in df.get_column_names() {
        match standard_column_name(column_name.as_str()) {
            Some("date") if date_column.is_none() => date_column = Some(column_name.to_string()),
            Some("close") if close_column.is_none() => close_column = Some(column_name.to_string()),
            _ => {}
        }
    }
    let date_column = date_column.ok_or_else(|| {
        PolarsError::ColumnNotFound("Required date column not found".into())
    })?;
    let close_column = close_column.ok_or_else(|| {
        PolarsError::ColumnNotFound("Required close column not found".into())
    })?;

    let dates = df.column(&date_column)?.cast(&DataType::String)?;
    let closes = df.column(&close_column)?.cast(&DataType::Float64)?;

    let mut rows = Vec::with_capacity(df.height());
    for (raw_date, close) in dates.str()?.into_iter().zip(closes.f64()?.into_iter()) {
        let (raw_date, close) = match (raw_date, close) {
            (Some(d), Some(c)) => (d, c),
            _ => continue,
        };
        let date = parse_date(raw_date)
            .ok_or_else(|| ForecastError::Decode(format!("Unparseable date '{}'", raw_date)))?;
        rows.push((date, close));
    }

    PriceSeries::from_rows(symbol, rows)
}

/// Offline price source backed by a local CSV export
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> ForecastResult<PriceSeries> {
        Ok(read_price_csv(&self.path, symbol)?.between(start, end))
    }
}

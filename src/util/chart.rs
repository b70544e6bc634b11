// External crates
use chrono::NaiveDate;
use log::info;

// Internal modules
use crate::error::{ForecastError, ForecastResult};

/// One named line of a chart
#[derive(Debug, Clone, Copy)]
pub struct ChartSeries<'a> {
    pub label: &'a str,
    pub dates: &'a [NaiveDate],
    pub values: &'a [f64],
}

impl<'a> ChartSeries<'a> {
    pub fn new(label: &'a str, dates: &'a [NaiveDate], values: &'a [f64]) -> Self {
        Self {
            label,
            dates,
            values,
        }
    }
}

/// Destination for the price charts drawn during a run
pub trait ChartSink {
    fn plot(&mut self, title: &str, series: &[ChartSeries<'_>]) -> ForecastResult<()>;
}

/// Writes a one-line summary of every series to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChartSink;

impl ChartSink for LogChartSink {
    fn plot(&mut self, title: &str, series: &[ChartSeries<'_>]) -> ForecastResult<()> {
        info!("Chart: {}", title);
        for line in series {
            if line.dates.len() != line.values.len() {
                return Err(ForecastError::InvalidConfig(format!(
                    "series '{}' has {} dates but {} values",
                    line.label,
                    line.dates.len(),
                    line.values.len()
                )));
            }
            match (line.dates.first(), line.dates.last()) {
                (Some(first), Some(last)) => {
                    let min = line.values.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = line.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    info!(
                        "  {}: {} points {} .. {}, range [{:.2}, {:.2}]",
                        line.label,
                        line.values.len(),
                        first,
                        last,
                        min,
                        max
                    );
                }
                _ => info!("  {}: no points", line.label),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_utils::trading_days;

    #[test]
    fn test_log_sink_accepts_matching_series() {
        let dates = trading_days(3);
        let values = [1.0, 2.0, 3.0];
        let mut sink = LogChartSink;
        assert!(sink
            .plot("Close", &[ChartSeries::new("Close", &dates, &values)])
            .is_ok());
        assert!(sink.plot("Empty", &[ChartSeries::new("Close", &[], &[])]).is_ok());
    }

    #[test]
    fn test_log_sink_rejects_mismatched_lengths() {
        let dates = trading_days(3);
        let values = [1.0, 2.0];
        let mut sink = LogChartSink;
        assert!(sink
            .plot("Close", &[ChartSeries::new("Close", &dates, &values)])
            .is_err());
    }
}

// External crates
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::StatusCode;
use serde::Deserialize;

// Internal modules
use super::{PriceSeries, PriceSource};
use crate::constants::{USER_AGENT, YAHOO_CHART_URL};
use crate::error::{ForecastError, ForecastResult};

/// Yahoo Finance chart API response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Blocking client for the Yahoo Finance v8 chart endpoint
#[derive(Debug, Clone)]
pub struct YahooPriceSource {
    base_url: String,
}

impl Default for YahooPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooPriceSource {
    pub fn new() -> Self {
        Self::with_base_url(YAHOO_CHART_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn unix_seconds(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::default()).and_utc().timestamp()
    }

    /// Daily bars for `start <= date < end`
    fn build_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            symbol,
            Self::unix_seconds(start),
            Self::unix_seconds(end)
        )
    }

    /// Decode a chart response body into a price series
    ///
    /// Bars with a null close (halted days) are skipped. Timestamps are shifted
    /// by the exchange's GMT offset before taking the calendar date.
    pub fn parse_response(symbol: &str, body: &str) -> ForecastResult<PriceSeries> {
        let response: ChartResponse =
            serde_json::from_str(body).map_err(|e| ForecastError::Decode(e.to_string()))?;

        if let Some(error) = response.chart.error {
            return Err(ForecastError::Api {
                code: error.code,
                description: error.description,
            });
        }

        let data = match response.chart.result.and_then(|r| r.into_iter().next()) {
            Some(data) => data,
            None => return PriceSeries::from_rows(symbol, Vec::new()),
        };
        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(data.timestamp.len());
        for (i, &ts) in data.timestamp.iter().enumerate() {
            let close = match closes.get(i).copied().flatten() {
                Some(close) => close,
                None => continue,
            };
            let date = DateTime::from_timestamp(ts + data.meta.gmtoffset, 0)
                .ok_or_else(|| ForecastError::Decode(format!("Invalid timestamp {}", ts)))?
                .date_naive();
            rows.push((date, close));
        }

        PriceSeries::from_rows(symbol, rows)
    }

    /// Decode a body received with `status`
    ///
    /// A failed request whose body is not a chart response (rate limiting,
    /// gateway errors) is reported with its HTTP status.
    pub fn parse_http_response(
        symbol: &str,
        status: StatusCode,
        body: &str,
    ) -> ForecastResult<PriceSeries> {
        match Self::parse_response(symbol, body) {
            Err(ForecastError::Decode(_)) if !status.is_success() => Err(ForecastError::Api {
                code: status.to_string(),
                description: body.trim().chars().take(200).collect(),
            }),
            other => other,
        }
    }
}

impl PriceSource for YahooPriceSource {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> ForecastResult<PriceSeries> {
        let url = self.build_url(symbol, start, end);
        log::debug!("GET {}", url);

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        // Unknown symbols come back as 404 with an error body, so read the text either way
        let response = client.get(&url).send()?;
        let status = response.status();
        let body = response.text()?;

        Self::parse_http_response(symbol, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_uses_unix_seconds() {
        let source = YahooPriceSource::with_base_url("http://localhost/chart/");
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
        let url = source.build_url("AAPL", start, end);
        assert_eq!(
            url,
            "http://localhost/chart/AAPL?period1=1420070400&period2=1420156800&interval=1d&events=history"
        );
    }

    #[test]
    fn test_parse_response_skips_null_closes() {
        // 2024-01-02, 01-03 and 01-04 at 14:30 UTC, New York offset
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-18000},
            "timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{"close":[185.64,null,181.91]}]}
        }],"error":null}}"#;

        let series = YahooPriceSource::parse_response("AAPL", body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), &[185.64, 181.91]);
        assert_eq!(series.dates()[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series.dates()[1], NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn test_parse_response_api_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match YahooPriceSource::parse_response("ZZZZ", body) {
            Err(ForecastError::Api { code, .. }) => assert_eq!(code, "Not Found"),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_without_bars_is_empty() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let series = YahooPriceSource::parse_response("AAPL", body).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_parse_response_garbage() {
        let result = YahooPriceSource::parse_response("AAPL", "<html>rate limited</html>");
        assert!(matches!(result, Err(ForecastError::Decode(_))));
    }

    #[test]
    fn test_http_error_with_plain_body_reports_status() {
        match YahooPriceSource::parse_http_response(
            "AAPL",
            StatusCode::TOO_MANY_REQUESTS,
            "Too Many Requests\n",
        ) {
            Err(ForecastError::Api { code, description }) => {
                assert_eq!(code, "429 Too Many Requests");
                assert_eq!(description, "Too Many Requests");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_http_error_with_chart_body_keeps_chart_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        match YahooPriceSource::parse_http_response("ZZZZ", StatusCode::NOT_FOUND, body) {
            Err(ForecastError::Api { code, .. }) => assert_eq!(code, "Not Found"),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_success_with_garbage_is_decode_error() {
        let result = YahooPriceSource::parse_http_response("AAPL", StatusCode::OK, "<html></html>");
        assert!(matches!(result, Err(ForecastError::Decode(_))));
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ForecastConfig;
    use crate::constants::{MODEL_FILE_NAME, PREDICTION_FILE_NAME};
    use crate::daily::lstm::step_1_tensor_preparation::{create_sequences, MinMaxScaler};
    use crate::daily::lstm::step_3_lstm_model_arch::DailyLSTMModelConfig;
    use crate::daily::lstm::step_5_prediction::SequenceRegressor;
    use crate::daily::lstm::step_6_model_serialization::load_model_with_metadata;
    use crate::data::{PriceSeries, PriceSource};
    use crate::error::{ForecastError, ForecastResult};
    use crate::pipeline::{run, InferenceBackend};
    use crate::util::chart::{ChartSeries, ChartSink};
    use crate::util::test_utils::{backend_lock, generate_price_series};
    use chrono::{Datelike, NaiveDate, Weekday};
    use std::fs;
    use std::path::Path;

    /// Serves a fixed series, filtered to the requested range
    struct FixedSource(PriceSeries);

    impl PriceSource for FixedSource {
        fn fetch(&self, _symbol: &str, start: NaiveDate, end: NaiveDate) -> ForecastResult<PriceSeries> {
            Ok(self.0.between(start, end))
        }
    }

    /// Remembers the title and line lengths of every chart
    #[derive(Default)]
    struct RecordingSink {
        charts: Vec<(String, Vec<usize>)>,
    }

    impl ChartSink for RecordingSink {
        fn plot(&mut self, title: &str, series: &[ChartSeries<'_>]) -> ForecastResult<()> {
            self.charts.push((
                title.to_string(),
                series.iter().map(|s| s.values.len()).collect(),
            ));
            Ok(())
        }
    }

    fn small_config(output_dir: &Path) -> ForecastConfig {
        let mut config = ForecastConfig::for_symbol("AAPL");
        config.start_date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        config.end_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        config.window_len = 10;
        config.future_steps = 5;
        config.output_dir = output_dir.to_path_buf();
        config.model = DailyLSTMModelConfig::new(1, 8, 4);
        config.training.epochs = 2;
        config.training.batch_size = 16;
        config
    }

    #[test]
    fn test_full_series_window_count() {
        let series = generate_price_series(100, 3);
        let scaler = MinMaxScaler::fit(series.closes()).unwrap();
        let scaled = scaler.transform(series.closes()).unwrap();

        // Windowing the whole history instead of each split
        let windows = create_sequences(&scaled, 10, 0, "series").unwrap();
        assert_eq!(windows.len(), 90);
    }

    #[test]
    fn test_end_to_end_run() {
        let _guard = backend_lock();
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let source = FixedSource(generate_price_series(100, 11));
        let mut sink = RecordingSink::default();

        let result = run(&config, &source, &mut sink).unwrap();

        assert_eq!(result.num_prices, 100);
        assert_eq!(result.train_windows, 70);
        assert_eq!(result.test_windows, 10);
        assert_eq!(result.loss_history.len(), 2);
        assert!(result.loss_history.iter().all(|l| l.is_finite()));
        assert_eq!(result.report.train.predicted.len(), 70);
        assert_eq!(result.report.test.predicted.len(), 10);
        assert!(result.report.test.rmse().is_finite());

        // Projection follows the last trading day on business days only
        assert_eq!(result.projection.prices.len(), 5);
        let last = source.0.last_date().unwrap();
        assert!(result.projection.dates[0] > last);
        assert!(result
            .projection
            .dates
            .iter()
            .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));

        // History, evaluation and forecast charts
        assert_eq!(sink.charts.len(), 3);
        assert_eq!(sink.charts[0].1, vec![100]);
        assert_eq!(sink.charts[1].1, vec![100, 70, 10]);
        assert_eq!(sink.charts[2].1, vec![100, 5]);

        // Saved outputs
        assert!(result.model_path.exists());
        assert_eq!(result.prediction_path, dir.path().join(PREDICTION_FILE_NAME));
        let contents = fs::read_to_string(&result.prediction_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "Date,Close,Type");
        assert_eq!(lines.len(), 1 + 100 + 5);
        assert_eq!(lines.iter().filter(|l| l.ends_with(",Historical")).count(), 100);
        assert_eq!(lines.iter().filter(|l| l.ends_with(",Predicted")).count(), 5);
    }

    #[test]
    fn test_saved_model_reproduces_projection() {
        let _guard = backend_lock();
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let series = generate_price_series(100, 5);
        let source = FixedSource(series.clone());

        let result = run(&config, &source, &mut RecordingSink::default()).unwrap();

        let (model, metadata) = load_model_with_metadata::<InferenceBackend>(
            dir.path().join(MODEL_FILE_NAME),
            &Default::default(),
        )
        .unwrap();
        assert_eq!(metadata.symbol, "AAPL");
        assert_eq!(metadata.window_len, 10);
        assert_eq!(metadata.last_date, series.last_date());
        assert_eq!(metadata.scaler, result.scaler);

        // The first projected step only depends on the last window of history
        let scaled = metadata.scaler.transform(series.closes()).unwrap();
        let first = model.predict_one(&scaled[scaled.len() - 10..]).unwrap();
        let first = metadata.scaler.inverse_transform_value(first);
        assert!((first - result.projection.prices[0]).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_forecast() {
        let _guard = backend_lock();
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let source = FixedSource(generate_price_series(100, 21));

        let a = run(&small_config(dir_a.path()), &source, &mut RecordingSink::default()).unwrap();
        let b = run(&small_config(dir_b.path()), &source, &mut RecordingSink::default()).unwrap();

        assert_eq!(a.loss_history, b.loss_history);
        assert_eq!(a.projection.prices, b.projection.prices);
    }

    #[test]
    fn test_empty_range_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.start_date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        config.end_date = NaiveDate::from_ymd_opt(2030, 2, 1).unwrap();
        let source = FixedSource(generate_price_series(100, 1));

        let error = run(&config, &source, &mut RecordingSink::default()).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ForecastError>(),
            Some(ForecastError::EmptySeries { .. })
        ));
        assert!(!dir.path().join(PREDICTION_FILE_NAME).exists());
    }

    #[test]
    fn test_short_history_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        // 40 prices leave 8 test prices for a window of 10
        let source = FixedSource(generate_price_series(40, 2));

        let error = run(&config, &source, &mut RecordingSink::default()).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ForecastError>(),
            Some(ForecastError::InsufficientData { .. })
        ));
    }
}

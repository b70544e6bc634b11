// External imports
use burn::module::Module;
use burn::tensor::backend::Backend;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use log::{debug, info};
use ndarray::{s, Array2};
use std::collections::VecDeque;

// Internal imports
use super::step_1_tensor_preparation::{windows_to_tensor, MinMaxScaler, WindowedDataset};
use super::step_3_lstm_model_arch::DailyLSTMModel;
use crate::constants::INFERENCE_CHUNK_SIZE;
use crate::data::PriceSeries;
use crate::error::{ForecastError, ForecastResult};

/// Anything that maps `[n, W]` scaled windows to `n` scaled next values
///
/// Evaluation and extrapolation only depend on this, so they run against a
/// stub in tests and never need a trained network.
pub trait SequenceRegressor {
    fn predict(&self, windows: &Array2<f64>) -> ForecastResult<Vec<f64>>;

    /// Predict from a single window
    fn predict_one(&self, window: &[f64]) -> ForecastResult<f64> {
        let row = Array2::from_shape_vec((1, window.len()), window.to_vec())
            .map_err(|e| ForecastError::Model(e.to_string()))?;
        self.predict(&row)?
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Model("regressor returned no prediction".to_string()))
    }
}

impl<B: Backend> SequenceRegressor for DailyLSTMModel<B> {
    fn predict(&self, windows: &Array2<f64>) -> ForecastResult<Vec<f64>> {
        let device = self.devices().into_iter().next().unwrap_or_default();
        let mut predictions = Vec::with_capacity(windows.nrows());

        let mut start = 0;
        while start < windows.nrows() {
            let end = usize::min(start + INFERENCE_CHUNK_SIZE, windows.nrows());
            let chunk = windows.slice(s![start..end, ..]).to_owned();
            let output = self.forward(windows_to_tensor::<B>(&chunk, &device));
            let values = output
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| ForecastError::Model(format!("{:?}", e)))?;
            predictions.extend(values.into_iter().map(f64::from));
            start = end;
        }

        Ok(predictions)
    }
}

/// Predictions against actual closes for one split, in price units
#[derive(Debug, Clone)]
pub struct SplitEvaluation {
    pub dates: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

impl SplitEvaluation {
    pub fn rmse(&self) -> f64 {
        if self.actual.is_empty() {
            return 0.0;
        }
        let mse = self
            .actual
            .iter()
            .zip(self.predicted.iter())
            .map(|(a, p)| (a - p).powi(2))
            .sum::<f64>()
            / self.actual.len() as f64;
        mse.sqrt()
    }

    pub fn mae(&self) -> f64 {
        if self.actual.is_empty() {
            return 0.0;
        }
        self.actual
            .iter()
            .zip(self.predicted.iter())
            .map(|(a, p)| (a - p).abs())
            .sum::<f64>()
            / self.actual.len() as f64
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub train: SplitEvaluation,
    pub test: SplitEvaluation,
}

fn evaluate_split<R: SequenceRegressor + ?Sized>(
    regressor: &R,
    scaler: &MinMaxScaler,
    series: &PriceSeries,
    dataset: &WindowedDataset,
) -> ForecastResult<SplitEvaluation> {
    let scaled_predictions = regressor.predict(&dataset.windows)?;
    if scaled_predictions.len() != dataset.len() {
        return Err(ForecastError::Model(format!(
            "expected {} predictions, got {}",
            dataset.len(),
            scaled_predictions.len()
        )));
    }

    let dates = (0..dataset.len())
        .map(|i| series.dates()[dataset.label_index(i)])
        .collect();
    let actual = dataset
        .labels
        .iter()
        .map(|&v| scaler.inverse_transform_value(v))
        .collect();

    Ok(SplitEvaluation {
        dates,
        actual,
        predicted: scaler.inverse_transform(&scaled_predictions),
    })
}

/// Run inference over both splits and return everything in price units
pub fn evaluate<R: SequenceRegressor + ?Sized>(
    regressor: &R,
    scaler: &MinMaxScaler,
    series: &PriceSeries,
    train: &WindowedDataset,
    test: &WindowedDataset,
) -> ForecastResult<EvaluationReport> {
    let report = EvaluationReport {
        train: evaluate_split(regressor, scaler, series, train)?,
        test: evaluate_split(regressor, scaler, series, test)?,
    };
    info!(
        "Train RMSE: {:.4}, Test RMSE: {:.4}, Test MAE: {:.4}",
        report.train.rmse(),
        report.test.rmse(),
        report.test.mae()
    );
    Ok(report)
}

/// Fixed-length window of scaled prices fed back through the extrapolation loop
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastWindow {
    values: VecDeque<f64>,
}

impl ForecastWindow {
    /// Seed with the last `window_len` scaled prices
    pub fn seed(scaled: &[f64], window_len: usize) -> ForecastResult<Self> {
        if window_len == 0 || scaled.len() < window_len {
            return Err(ForecastError::InsufficientData {
                split: "forecast seed",
                needed: window_len.max(1),
                got: scaled.len(),
            });
        }
        Ok(Self {
            values: scaled[scaled.len() - window_len..].iter().copied().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop the oldest value and append `value`
    pub fn push(&mut self, value: f64) {
        self.values.pop_front();
        self.values.push_back(value);
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

/// Autoregressive unroll: each prediction is pushed into `window` before the next step
///
/// Returns the `steps` scaled predictions in order.
pub fn extrapolate<R: SequenceRegressor + ?Sized>(
    regressor: &R,
    window: &mut ForecastWindow,
    steps: usize,
) -> ForecastResult<Vec<f64>> {
    let mut predictions = Vec::with_capacity(steps);
    for step in 0..steps {
        let next = regressor.predict_one(&window.to_vec())?;
        debug!("Step {}: scaled prediction {:.6}", step + 1, next);
        window.push(next);
        predictions.push(next);
    }
    Ok(predictions)
}

/// The `count` Monday-to-Friday dates strictly after `last`
///
/// Exchange holidays are not skipped.
pub fn next_business_days(last: NaiveDate, count: usize) -> ForecastResult<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(count);
    let mut current = last;
    while dates.len() < count {
        current = current
            .checked_add_days(Days::new(1))
            .ok_or_else(|| ForecastError::Model(format!("date overflow after {}", current)))?;
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
    }
    Ok(dates)
}

/// Future closes in price units aligned to business days
#[derive(Debug, Clone)]
pub struct FutureProjection {
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
}

/// Seed from the end of the scaled history and project `steps` business days ahead
pub fn project_future<R: SequenceRegressor + ?Sized>(
    regressor: &R,
    scaler: &MinMaxScaler,
    series: &PriceSeries,
    scaled: &[f64],
    window_len: usize,
    steps: usize,
) -> ForecastResult<FutureProjection> {
    let last_date = series.last_date().ok_or_else(|| ForecastError::EmptySeries {
        symbol: series.symbol().to_string(),
    })?;

    let mut window = ForecastWindow::seed(scaled, window_len)?;
    let scaled_predictions = extrapolate(regressor, &mut window, steps)?;

    let projection = FutureProjection {
        dates: next_business_days(last_date, steps)?,
        prices: scaler.inverse_transform(&scaled_predictions),
    };
    if let (Some(first), Some(last)) = (projection.prices.first(), projection.prices.last()) {
        info!(
            "Projected {} business days after {}: {:.2} -> {:.2}",
            steps, last_date, first, last
        );
    }
    Ok(projection)
}

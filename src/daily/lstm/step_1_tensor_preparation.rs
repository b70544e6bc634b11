// External crates
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

// Internal modules
use crate::error::{ForecastError, ForecastResult};

/// Min-max scaler mapping prices onto [0, 1]
///
/// Fitted once; there is no way to refit an existing scaler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit on the whole price history
    ///
    /// The pipeline calls this before the train/test split, so test-period
    /// extremes leak into the scaling of the training windows.
    pub fn fit(prices: &[f64]) -> ForecastResult<Self> {
        if prices.is_empty() {
            return Err(ForecastError::InsufficientData {
                split: "series",
                needed: 1,
                got: 0,
            });
        }
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if (max - min).abs() < f64::EPSILON {
            return Err(ForecastError::DegenerateRange { value: min });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn transform_value(&self, price: f64) -> f64 {
        (price - self.min) / (self.max - self.min)
    }

    pub fn inverse_transform_value(&self, scaled: f64) -> f64 {
        scaled * (self.max - self.min) + self.min
    }

    /// Scale a series, failing on any non-finite output
    pub fn transform(&self, prices: &[f64]) -> ForecastResult<Vec<f64>> {
        prices
            .iter()
            .enumerate()
            .map(|(index, &p)| {
                let scaled = self.transform_value(p);
                if scaled.is_finite() {
                    Ok(scaled)
                } else {
                    Err(ForecastError::NonFiniteScaled { index })
                }
            })
            .collect()
    }

    pub fn inverse_transform(&self, scaled: &[f64]) -> Vec<f64> {
        scaled
            .iter()
            .map(|&v| self.inverse_transform_value(v))
            .collect()
    }
}

/// Windows of `window_len` scaled prices paired with the following price
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    /// Shape `[n, window_len]`
    pub windows: Array2<f64>,
    /// Shape `[n]`
    pub labels: Array1<f64>,
    /// Index in the full series of the first element of the windowed slice
    pub offset: usize,
}

impl WindowedDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn window_len(&self) -> usize {
        self.windows.ncols()
    }

    /// Full-series index of the label of window `i`
    pub fn label_index(&self, i: usize) -> usize {
        self.offset + self.window_len() + i
    }

    /// Full-series index range `[start, end)` covered by window `i` and its label
    pub fn span(&self, i: usize) -> (usize, usize) {
        let start = self.offset + i;
        (start, start + self.window_len() + 1)
    }
}

/// Build `(series[i..i+W], series[i+W])` pairs for `i in 0..len-W`
///
/// `offset` is the position of `series[0]` in the full history.
pub fn create_sequences(
    series: &[f64],
    window_len: usize,
    offset: usize,
    split: &'static str,
) -> ForecastResult<WindowedDataset> {
    if window_len == 0 {
        return Err(ForecastError::InvalidConfig(
            "window length must be positive".to_string(),
        ));
    }
    if series.len() <= window_len {
        return Err(ForecastError::InsufficientData {
            split,
            needed: window_len + 1,
            got: series.len(),
        });
    }

    let n = series.len() - window_len;
    let windows = Array2::from_shape_fn((n, window_len), |(i, j)| series[i + j]);
    let labels = Array1::from_shape_fn(n, |i| series[i + window_len]);

    Ok(WindowedDataset {
        windows,
        labels,
        offset,
    })
}

/// Index of the first test element: `floor(len * train_ratio)`
pub fn split_index(len: usize, train_ratio: f64) -> usize {
    (len as f64 * train_ratio) as usize
}

/// Train and test windows, each built on its own contiguous region
#[derive(Debug, Clone)]
pub struct TrainTestWindows {
    pub train: WindowedDataset,
    pub test: WindowedDataset,
    pub boundary: usize,
}

/// Split before windowing so no window crosses the boundary
pub fn split_and_window(
    scaled: &[f64],
    window_len: usize,
    train_ratio: f64,
) -> ForecastResult<TrainTestWindows> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "train ratio must be in (0, 1), got {}",
            train_ratio
        )));
    }
    let boundary = split_index(scaled.len(), train_ratio);
    let (train_slice, test_slice) = scaled.split_at(boundary);

    let train = create_sequences(train_slice, window_len, 0, "training split")?;
    let test = create_sequences(test_slice, window_len, boundary, "test split")?;

    log::info!(
        "Windowed data: {} training windows, {} test windows (window {}, boundary {})",
        train.len(),
        test.len(),
        window_len,
        boundary
    );

    Ok(TrainTestWindows {
        train,
        test,
        boundary,
    })
}

/// Convert windows to a `[n, W, 1]` feature tensor
pub fn windows_to_tensor<B: Backend>(windows: &Array2<f64>, device: &B::Device) -> Tensor<B, 3> {
    let (n, w) = windows.dim();
    let values: Vec<f32> = windows.iter().map(|&v| v as f32).collect();
    Tensor::<B, 3>::from_data(TensorData::new(values, [n, w, 1]), device)
}

/// Convert a windowed dataset to `([n, W, 1], [n, 1])` feature and target tensors
pub fn dataset_to_tensors<B: Backend>(
    dataset: &WindowedDataset,
    device: &B::Device,
) -> (Tensor<B, 3>, Tensor<B, 2>) {
    let features = windows_to_tensor::<B>(&dataset.windows, device);
    let targets: Vec<f32> = dataset.labels.iter().map(|&v| v as f32).collect();
    let targets = Tensor::<B, 2>::from_data(TensorData::new(targets, [dataset.len(), 1]), device);
    (features, targets)
}

// External imports
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::cast::ToElement;
use burn::tensor::{Int, Tensor, TensorData};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

// Internal imports
use super::step_1_tensor_preparation::{dataset_to_tensors, WindowedDataset};
use super::step_3_lstm_model_arch::{DailyLSTMModel, DailyLSTMModelConfig};
use crate::constants::{BATCH_SIZE, DEFAULT_SEED, EPOCHS, LEARNING_RATE};
use crate::error::{ForecastError, ForecastResult};

/// Configuration for training the model
///
/// Fixed epoch count; no validation split, early stopping or checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    /// Seeds the backend RNG before the weights are initialized and the
    /// per-epoch batch shuffle
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: LEARNING_RATE,
            batch_size: BATCH_SIZE,
            epochs: EPOCHS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Shuffle `0..num_samples` and cut it into batches, last one possibly short
fn epoch_batches(num_samples: usize, batch_size: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..num_samples).collect();
    indices.shuffle(rng);
    indices
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Gather the rows of `data` named by `indices` along the first dimension
fn select_rows<B: Backend, const D: usize>(
    data: &Tensor<B, D>,
    indices: &[usize],
    device: &B::Device,
) -> Tensor<B, D> {
    let indices: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    let len = indices.len();
    let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(indices, [len]), device);
    data.clone().select(0, indices)
}

/// Mean squared error between `[n, 1]` predictions and targets
pub fn mse_loss<B: Backend>(predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let diff = predictions - targets;
    (diff.clone() * diff).mean()
}

/// Train the stacked LSTM on the training windows
///
/// Batches are reshuffled every epoch from an RNG seeded with `config.seed`,
/// so a run is reproducible for a given seed on a deterministic backend.
///
/// # Returns
///
/// The trained model and the mean training loss of each epoch
pub fn train_model<B: AutodiffBackend>(
    train: &WindowedDataset,
    model_config: &DailyLSTMModelConfig,
    config: &TrainingConfig,
    device: &B::Device,
) -> ForecastResult<(DailyLSTMModel<B>, Vec<f64>)> {
    if train.is_empty() {
        return Err(ForecastError::InsufficientData {
            split: "training split",
            needed: 1,
            got: 0,
        });
    }
    if config.batch_size == 0 || config.epochs == 0 {
        return Err(ForecastError::InvalidConfig(
            "batch size and epochs must be positive".to_string(),
        ));
    }

    B::seed(config.seed);
    let mut model = model_config.init::<B>(device);
    let mut optimizer = AdamConfig::new().init::<B, DailyLSTMModel<B>>();

    let (features, targets) = dataset_to_tensors::<B>(train, device);
    let mut rng = StdRng::seed_from_u64(config.seed);

    info!(
        "Training on {} windows: {} epochs, batch size {}, learning rate {}",
        train.len(),
        config.epochs,
        config.batch_size,
        config.learning_rate
    );

    let start = Instant::now();
    let mut loss_history = Vec::with_capacity(config.epochs);
    for epoch in 1..=config.epochs {
        let batches = epoch_batches(train.len(), config.batch_size, &mut rng);
        let mut epoch_loss = 0.0;
        for batch in &batches {
            let batch_features = select_rows(&features, batch, device);
            let batch_targets = select_rows(&targets, batch, device);
            let predictions = model.forward(batch_features);
            let loss = mse_loss(predictions, batch_targets);
            epoch_loss += loss.clone().into_scalar().to_f64();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }
        let avg_loss = epoch_loss / batches.len() as f64;
        if !avg_loss.is_finite() {
            return Err(ForecastError::Model(format!(
                "training diverged at epoch {} (loss {})",
                epoch, avg_loss
            )));
        }
        info!("Epoch {}/{}: loss = {:.6}", epoch, config.epochs, avg_loss);
        loss_history.push(avg_loss);
    }
    debug!("Training took {:.1}s", start.elapsed().as_secs_f64());

    Ok((model, loss_history))
}

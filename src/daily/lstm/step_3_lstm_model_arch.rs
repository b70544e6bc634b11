// External imports
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::{backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

// Internal imports
use super::step_2_lstm_cell::DailyLSTM;
use crate::constants::{DENSE_HIDDEN_SIZE, LSTM_HIDDEN_SIZE};

/// Stacked LSTM regressor for next-day close prediction
///
/// Two LSTM layers (the first returns the full sequence, the second only its
/// final state) followed by two dense layers producing one scalar per window.
#[derive(Module, Debug)]
pub struct DailyLSTMModel<B: Backend> {
    // Model hyperparameters
    input_size: usize,
    hidden_size: usize,
    dense_size: usize,

    // Model layers
    lstm1: DailyLSTM<B>,
    lstm2: DailyLSTM<B>,
    dense: Linear<B>,
    output_layer: Linear<B>,
}

impl<B: Backend> DailyLSTMModel<B> {
    /// Create a new stacked LSTM model
    ///
    /// # Arguments
    ///
    /// * `input_size` - Number of features per time step (1 for close-only input)
    /// * `hidden_size` - Width of both LSTM layers
    /// * `dense_size` - Width of the hidden dense layer
    /// * `device` - Device to place tensors on
    pub fn new(input_size: usize, hidden_size: usize, dense_size: usize, device: &B::Device) -> Self {
        let lstm1 = DailyLSTM::new(input_size, hidden_size, device);
        let lstm2 = DailyLSTM::new(hidden_size, hidden_size, device);
        let dense = LinearConfig::new(hidden_size, dense_size).init(device);
        let output_layer = LinearConfig::new(dense_size, 1).init(device);

        Self {
            input_size,
            hidden_size,
            dense_size,
            lstm1,
            lstm2,
            dense,
            output_layer,
        }
    }

    /// Forward pass through the model
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor of shape [batch_size, sequence_length, input_size]
    ///
    /// # Returns
    ///
    /// Returns the output tensor of shape [batch_size, 1]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let sequence = self.lstm1.forward_sequence(x);
        let last = self.lstm2.forward_last(sequence);

        // Both dense layers are linear, no activation in between
        let hidden = self.dense.forward(last);
        self.output_layer.forward(hidden)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn dense_size(&self) -> usize {
        self.dense_size
    }
}

/// Configuration for the DailyLSTMModel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyLSTMModelConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub dense_size: usize,
}

impl Default for DailyLSTMModelConfig {
    fn default() -> Self {
        Self {
            input_size: 1,
            hidden_size: LSTM_HIDDEN_SIZE,
            dense_size: DENSE_HIDDEN_SIZE,
        }
    }
}

impl DailyLSTMModelConfig {
    pub fn new(input_size: usize, hidden_size: usize, dense_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            dense_size,
        }
    }

    /// Initialize a model from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> DailyLSTMModel<B> {
        DailyLSTMModel::new(self.input_size, self.hidden_size, self.dense_size, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_utils::backend_lock;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_forward_output_shape() {
        let _guard = backend_lock();
        let device = Default::default();
        let model = DailyLSTMModelConfig::default().init::<B>(&device);
        let x = Tensor::<B, 3>::zeros([4, 60, 1], &device);

        assert_eq!(model.forward(x).dims(), [4, 1]);
        assert_eq!(model.hidden_size(), 50);
        assert_eq!(model.dense_size(), 25);
    }

    #[test]
    fn test_parameter_count() {
        let _guard = backend_lock();
        let device = Default::default();
        let model = DailyLSTMModelConfig::default().init::<B>(&device);

        // lstm1: 1*200 + 200 + 50*200, lstm2: 50*200 + 200 + 50*200,
        // dense: 50*25 + 25, output: 25 + 1
        let expected = (200 + 200 + 10_000) + (10_000 + 200 + 10_000) + (1_250 + 25) + (25 + 1);
        assert_eq!(model.num_params(), expected);
    }
}

// External imports
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Tensor};

/// Single LSTM layer unrolled over the time axis
#[derive(Module, Debug)]
pub struct DailyLSTM<B: Backend> {
    input_size: usize,
    hidden_size: usize,

    // Input and recurrent projections for the input, forget, cell and output gates combined
    input_weights: Linear<B>,
    hidden_weights: Linear<B>,
}

impl<B: Backend> DailyLSTM<B> {
    /// Create a new LSTM layer
    ///
    /// # Arguments
    ///
    /// * `input_size` - Number of features per time step
    /// * `hidden_size` - Size of hidden state
    /// * `device` - Device to place tensors on
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        let gate_size = 4 * hidden_size;

        let input_weights = LinearConfig::new(input_size, gate_size).init(device);
        // The input projection already carries the gate bias
        let hidden_weights = LinearConfig::new(hidden_size, gate_size)
            .with_bias(false)
            .init(device);

        Self {
            input_size,
            hidden_size,
            input_weights,
            hidden_weights,
        }
    }

    /// Run the recurrence, optionally keeping every hidden state
    fn unroll(&self, x: Tensor<B, 3>, keep_sequence: bool) -> (Vec<Tensor<B, 2>>, Tensor<B, 2>) {
        let device = x.device();
        let [batch_size, sequence_length, _] = x.dims();

        // Initial hidden and cell states (zeros)
        let mut h = Tensor::zeros([batch_size, self.hidden_size], &device);
        let mut c = Tensor::zeros([batch_size, self.hidden_size], &device);

        let mut outputs = Vec::with_capacity(if keep_sequence { sequence_length } else { 0 });

        for t in 0..sequence_length {
            // Input at the current time step [batch_size, input_size]
            let x_t = x
                .clone()
                .narrow(1, t, 1)
                .reshape([batch_size, self.input_size]);

            let gates = self.input_weights.forward(x_t) + self.hidden_weights.forward(h);
            let gates = gates.reshape([batch_size, 4, self.hidden_size]);
            let gate = |index: usize| {
                gates
                    .clone()
                    .narrow(1, index, 1)
                    .reshape([batch_size, self.hidden_size])
            };

            let i = activation::sigmoid(gate(0));
            let f = activation::sigmoid(gate(1));
            let g = activation::tanh(gate(2));
            let o = activation::sigmoid(gate(3));

            c = f * c + i * g;
            h = o * activation::tanh(c.clone());

            if keep_sequence {
                outputs.push(h.clone());
            }
        }

        (outputs, h)
    }

    /// Every hidden state: `[batch, seq, input]` to `[batch, seq, hidden]`
    pub fn forward_sequence(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let (outputs, _) = self.unroll(x, true);
        Tensor::stack(outputs, 1)
    }

    /// Final hidden state only: `[batch, seq, input]` to `[batch, hidden]`
    pub fn forward_last(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let (_, last) = self.unroll(x, false);
        last
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}

// Data acquisition
pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_START_DATE: (i32, u32, u32) = (2015, 1, 1);
pub const DEFAULT_END_DATE: (i32, u32, u32) = (2024, 6, 1);
pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const COVERAGE_TOLERANCE_DAYS: i64 = 7; // Gap at either end of the range before warning
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// Model parameters
pub const SEQUENCE_LENGTH: usize = 60; // Number of past days in each window
pub const LSTM_HIDDEN_SIZE: usize = 50;
pub const DENSE_HIDDEN_SIZE: usize = 25;

// Training
pub const TRAIN_SPLIT_RATIO: f64 = 0.8; // 80% of the series before windowing
pub const EPOCHS: usize = 20;
pub const BATCH_SIZE: usize = 32;
pub const LEARNING_RATE: f64 = 0.001;
pub const DEFAULT_SEED: u64 = 42;

// Inference
pub const FUTURE_STEPS: usize = 30; // Business days to extrapolate
pub const INFERENCE_CHUNK_SIZE: usize = 256;

// Output files (overwritten each run)
pub const MODEL_FILE_NAME: &str = "stock_price_lstm_model";
pub const PREDICTION_FILE_NAME: &str = "stock_prediction_data.csv";
pub const HISTORICAL_TAG: &str = "Historical";
pub const PREDICTED_TAG: &str = "Predicted";

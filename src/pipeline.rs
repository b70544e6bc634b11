// External crates
use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use burn_autodiff::Autodiff;
use burn_ndarray::{NdArray, NdArrayDevice};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

// Internal modules
use crate::config::ForecastConfig;
use crate::constants::{MODEL_FILE_NAME, PREDICTION_FILE_NAME};
use crate::daily::lstm::step_1_tensor_preparation::{split_and_window, MinMaxScaler};
use crate::daily::lstm::step_4_train_model::train_model;
use crate::daily::lstm::step_5_prediction::{
    evaluate, project_future, EvaluationReport, FutureProjection,
};
use crate::daily::lstm::step_6_model_serialization::{
    build_prediction_table, save_model_with_metadata, write_prediction_table, ModelMetadata,
};
use crate::data::{fetch_prices, PriceSource};
use crate::util::chart::{ChartSeries, ChartSink};

/// Backend used for training
pub type TrainBackend = Autodiff<NdArray<f32>>;
/// Backend used for evaluation and extrapolation
pub type InferenceBackend = NdArray<f32>;

/// Results of one run
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub symbol: String,
    pub num_prices: usize,
    pub scaler: MinMaxScaler,
    pub train_windows: usize,
    pub test_windows: usize,
    pub loss_history: Vec<f64>,
    pub report: EvaluationReport,
    pub projection: FutureProjection,
    pub model_path: PathBuf,
    pub prediction_path: PathBuf,
}

/// Fetch, normalize, window, train, evaluate, extrapolate and save
///
/// Stops at the first failing stage. Outputs in `config.output_dir` are
/// overwritten.
pub fn run(
    config: &ForecastConfig,
    source: &dyn PriceSource,
    chart: &mut dyn ChartSink,
) -> Result<ForecastRun> {
    config.validate().context("Invalid forecast configuration")?;
    let start = Instant::now();

    // Acquisition
    let series = fetch_prices(source, &config.symbol, config.start_date, config.end_date)
        .with_context(|| format!("Failed to fetch prices for {}", config.symbol))?;
    chart.plot(
        &format!("{} close price history", series.symbol()),
        &[ChartSeries::new("Close", series.dates(), series.closes())],
    )?;

    // Normalization over the full history, then split and window
    let scaler = MinMaxScaler::fit(series.closes()).context("Failed to fit scaler")?;
    let scaled = scaler
        .transform(series.closes())
        .context("Failed to scale prices")?;
    let windows = split_and_window(&scaled, config.window_len, config.train_ratio)
        .context("Failed to build training windows")?;

    // Training
    let device = NdArrayDevice::default();
    let (model, loss_history) =
        train_model::<TrainBackend>(&windows.train, &config.model, &config.training, &device)
            .context("Training failed")?;
    let model = model.valid();

    // Evaluation
    let report = evaluate(&model, &scaler, &series, &windows.train, &windows.test)
        .context("Evaluation failed")?;
    chart.plot(
        &format!("{} actual vs predicted", series.symbol()),
        &[
            ChartSeries::new("Actual", series.dates(), series.closes()),
            ChartSeries::new(
                "Train prediction",
                &report.train.dates,
                &report.train.predicted,
            ),
            ChartSeries::new("Test prediction", &report.test.dates, &report.test.predicted),
        ],
    )?;

    // Extrapolation
    let projection = project_future(
        &model,
        &scaler,
        &series,
        &scaled,
        config.window_len,
        config.future_steps,
    )
    .context("Future extrapolation failed")?;
    chart.plot(
        &format!("{} {}-day forecast", series.symbol(), config.future_steps),
        &[
            ChartSeries::new("Historical", series.dates(), series.closes()),
            ChartSeries::new("Predicted", &projection.dates, &projection.prices),
        ],
    )?;

    // Persistence
    fs::create_dir_all(&config.output_dir).context("Failed to create output directory")?;
    let metadata = ModelMetadata::new(
        series.symbol(),
        series.last_date(),
        config.window_len,
        config.training.seed,
        config.model,
        scaler,
    );
    let model_path =
        save_model_with_metadata(&model, &metadata, config.output_dir.join(MODEL_FILE_NAME))?;
    let mut table = build_prediction_table(&series, &projection)
        .context("Failed to build prediction table")?;
    let prediction_path =
        write_prediction_table(&mut table, config.output_dir.join(PREDICTION_FILE_NAME))?;

    info!(
        "Run for {} finished in {:.2?}",
        series.symbol(),
        start.elapsed()
    );

    Ok(ForecastRun {
        symbol: series.symbol().to_string(),
        num_prices: series.len(),
        scaler,
        train_windows: windows.train.len(),
        test_windows: windows.test.len(),
        loss_history,
        report,
        projection,
        model_path,
        prediction_path,
    })
}

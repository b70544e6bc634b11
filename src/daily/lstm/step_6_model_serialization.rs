// External imports
use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// Internal imports
use super::step_1_tensor_preparation::MinMaxScaler;
use super::step_3_lstm_model_arch::{DailyLSTMModel, DailyLSTMModelConfig};
use super::step_5_prediction::FutureProjection;
use crate::built_info;
use crate::constants::{HISTORICAL_TAG, PREDICTED_TAG};
use crate::data::PriceSeries;

/// Everything needed to rebuild the model and reuse it on new prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    pub rustc_version: String,
    pub timestamp: u64,
    pub symbol: String,
    pub last_date: Option<NaiveDate>,
    pub window_len: usize,
    pub seed: u64,
    pub model: DailyLSTMModelConfig,
    pub scaler: MinMaxScaler,
}

impl ModelMetadata {
    pub fn new(
        symbol: &str,
        last_date: Option<NaiveDate>,
        window_len: usize,
        seed: u64,
        model: DailyLSTMModelConfig,
        scaler: MinMaxScaler,
    ) -> Self {
        Self {
            version: built_info::PKG_VERSION.to_string(),
            rustc_version: built_info::RUSTC_VERSION.to_string(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            symbol: symbol.to_string(),
            last_date,
            window_len,
            seed,
            model,
            scaler,
        }
    }
}

/// Save the model weights (`.bin`) and metadata (`.meta.json`), overwriting both
pub fn save_model_with_metadata<B: Backend>(
    model: &DailyLSTMModel<B>,
    metadata: &ModelMetadata,
    path: impl AsRef<Path>,
) -> Result<PathBuf> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent).context("Failed to create model parent directory")?;
    }

    let model_path = path.as_ref().with_extension("bin");
    model
        .clone()
        .save_file::<BinFileRecorder<FullPrecisionSettings>, _>(&model_path, &Default::default())
        .context("Failed to save model")?;

    let metadata_path = path.as_ref().with_extension("meta.json");
    let metadata_json =
        serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
    fs::write(&metadata_path, metadata_json).context("Failed to write metadata file")?;

    info!("Model saved to: {}", model_path.display());
    Ok(model_path)
}

/// Load the metadata, rebuild the architecture from it, then load the weights
pub fn load_model_with_metadata<B: Backend>(
    path: impl AsRef<Path>,
    device: &B::Device,
) -> Result<(DailyLSTMModel<B>, ModelMetadata)> {
    let metadata_path = path.as_ref().with_extension("meta.json");
    let metadata_json =
        fs::read_to_string(&metadata_path).context("Failed to read metadata file")?;
    let metadata: ModelMetadata =
        serde_json::from_str(&metadata_json).context("Failed to parse metadata")?;

    let model_path = path.as_ref().with_extension("bin");
    let model = metadata
        .model
        .init::<B>(device)
        .load_file::<BinFileRecorder<FullPrecisionSettings>, _>(
            &model_path,
            &Default::default(),
            device,
        )
        .context("Failed to load model")?;

    Ok((model, metadata))
}

/// `Date,Close,Type` table: one `Historical` row per trading day, then one
/// `Predicted` row per projected business day
pub fn build_prediction_table(
    series: &PriceSeries,
    projection: &FutureProjection,
) -> PolarsResult<DataFrame> {
    let mut historical = series.to_dataframe()?;
    historical.with_column(Series::new("Type".into(), vec![HISTORICAL_TAG; series.len()]))?;

    let dates: Vec<String> = projection
        .dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    let predicted = DataFrame::new(vec![
        Series::new("Date".into(), dates).into(),
        Series::new("Close".into(), projection.prices.clone()).into(),
        Series::new("Type".into(), vec![PREDICTED_TAG; projection.prices.len()]).into(),
    ])?;

    historical.vstack(&predicted)
}

/// Write the table as CSV with a header row, replacing any previous file
pub fn write_prediction_table(table: &mut DataFrame, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(table)
        .context("Failed to write prediction table")?;

    info!("Prediction table ({} rows) saved to: {}", table.height(), path.display());
    Ok(path.to_path_buf())
}

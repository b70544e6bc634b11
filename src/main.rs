// External crates
use anyhow::Result;
use std::env;

// Local modules
use stock_price_lstm::config::ForecastConfig;
use stock_price_lstm::data::{PriceSource, YahooPriceSource};
use stock_price_lstm::pipeline;
use stock_price_lstm::util::chart::LogChartSink;
use stock_price_lstm::util::file_utils::CsvPriceSource;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Accept ticker and an optional local CSV as command-line arguments
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(ticker) => ForecastConfig::for_symbol(ticker),
        None => ForecastConfig::default(),
    };
    let source: Box<dyn PriceSource> = match args.get(2) {
        Some(csv_path) => Box::new(CsvPriceSource::new(csv_path)),
        None => Box::new(YahooPriceSource::new()),
    };
    println!(
        "Using ticker: {} | {} to {}",
        config.symbol, config.start_date, config.end_date
    );

    let run = pipeline::run(&config, source.as_ref(), &mut LogChartSink)?;

    println!(
        "Prices: {} | training windows: {} | test windows: {}",
        run.num_prices, run.train_windows, run.test_windows
    );
    if let Some(loss) = run.loss_history.last() {
        println!("Final training loss: {:.6}", loss);
    }
    println!("Train RMSE: {:.4}", run.report.train.rmse());
    println!("Test RMSE: {:.4}", run.report.test.rmse());
    println!("Predictions for the next {} business days:", run.projection.prices.len());
    for (date, price) in run.projection.dates.iter().zip(run.projection.prices.iter()) {
        println!("{}: ${:.2}", date, price);
    }
    println!("Model saved at: {}", run.model_path.display());
    println!("Prediction data saved at: {}", run.prediction_path.display());

    Ok(())
}

// External imports
use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard};

// Internal imports
use crate::data::PriceSeries;

/// The NdArray backend keeps one global RNG; tests that seed it or build
/// modules hold this lock so parallel tests cannot interleave draws
static BACKEND_LOCK: Mutex<()> = Mutex::new(());

pub fn backend_lock() -> MutexGuard<'static, ()> {
    BACKEND_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Next weekday after `date`
fn next_weekday(date: NaiveDate) -> NaiveDate {
    let mut next = date.checked_add_days(Days::new(1)).unwrap();
    while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
        next = next.checked_add_days(Days::new(1)).unwrap();
    }
    next
}

/// `num_rows` consecutive weekdays starting at 2023-01-02
pub fn trading_days(num_rows: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(num_rows);
    let mut current = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    for _ in 0..num_rows {
        dates.push(current);
        current = next_weekday(current);
    }
    dates
}

/// Random-walk closes around $100 on consecutive weekdays
pub fn generate_price_series(num_rows: usize, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut current_price: f64 = 100.0 + rng.random::<f64>() * 50.0;
    let mut rows = Vec::with_capacity(num_rows);
    for date in trading_days(num_rows) {
        // Random price movement between -1% and +1%
        let movement = rng.random_range(-0.01..0.01);
        current_price *= 1.0 + movement;
        rows.push((date, current_price));
    }

    PriceSeries::from_rows("AAPL", rows).unwrap()
}

/// Known closes `start, start + step, ...` on consecutive weekdays
pub fn linear_price_series(num_rows: usize, start: f64, step: f64) -> PriceSeries {
    let rows = trading_days(num_rows)
        .into_iter()
        .enumerate()
        .map(|(i, date)| (date, start + step * i as f64))
        .collect();
    PriceSeries::from_rows("TEST", rows).unwrap()
}

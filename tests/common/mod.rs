#![allow(dead_code)]

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stockcast::PredictorConfig;
use stockcast::domain::market::bar::{Bar, BarSeries};

/// Seeded random-walk daily bars starting 2020-01-01, one per calendar day.
pub fn synthetic_bars(count: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut close = 100.0_f64;
    (0..count)
        .map(|i| {
            let open = close * (1.0 + rng.random_range(-0.01..0.01));
            close = (close * (1.0 + rng.random_range(-0.02..0.021))).max(1.0);
            let high = open.max(close) * (1.0 + rng.random_range(0.001..0.015));
            let low = open.min(close) * (1.0 - rng.random_range(0.001..0.015));
            let volume = rng.random_range(500_000.0..2_000_000.0);
            Bar::new(
                start + chrono::Days::new(i as u64),
                open,
                high,
                low,
                close,
                volume,
            )
        })
        .collect()
}

pub fn synthetic_series(symbol: &str, count: usize, seed: u64) -> BarSeries {
    BarSeries::new(symbol, synthetic_bars(count, seed))
}

/// Default settings with fewer trees so integration runs stay quick.
pub fn quick_config() -> PredictorConfig {
    let mut config = PredictorConfig::default();
    config.cv_folds = 3;
    config.random_forest.n_trees = 8;
    config.gradient_boosting.n_stages = 15;
    config.extra_trees.n_trees = 8;
    config
}

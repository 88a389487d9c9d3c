mod common;

use common::{quick_config, synthetic_bars, synthetic_series};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use stockcast::domain::market::bar::BarSeries;
use stockcast::domain::market::lookback::LookbackPeriod;
use stockcast::domain::ml::feature_registry::feature_names;
use stockcast::domain::ml::feature_table::FeatureTable;
use stockcast::infrastructure::CsvBarProvider;
use stockcast::{PredictionError, StockPredictor};

static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn create_test_dir() -> PathBuf {
    let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "stockcast_flow_{}_{}",
        std::process::id(),
        unique_id
    ));
    fs::create_dir_all(&dir).expect("Failed to create test temp dir");
    dir
}

fn trained_on(seed: u64) -> (StockPredictor, BarSeries) {
    let series = synthetic_series("SYN", 330, seed);
    let mut predictor = StockPredictor::new("SYN", quick_config());
    let table = predictor.assemble(&series).unwrap();
    predictor.train(&table).unwrap();
    (predictor, series)
}

#[test]
fn test_predict_before_train_is_rejected() {
    let predictor = StockPredictor::new("SYN", quick_config());
    let series = synthetic_series("SYN", 260, 11);
    assert!(matches!(
        predictor.predict(&series),
        Err(PredictionError::UntrainedModel)
    ));
}

#[test]
fn test_short_history_cannot_train() {
    let mut predictor = StockPredictor::new("SYN", quick_config());
    let table = predictor.assemble(&synthetic_series("SYN", 10, 2)).unwrap();
    assert!(table.is_empty());
    assert!(matches!(
        predictor.train(&table),
        Err(PredictionError::InsufficientHistory { rows: 0, .. })
    ));
    assert!(!predictor.is_trained());
}

#[test]
fn test_train_then_predict() {
    let (predictor, series) = trained_on(21);
    let result = predictor.predict(&series).unwrap();
    let last = series.last().unwrap();

    assert_eq!(result.symbol, "SYN");
    assert_eq!(result.current_price, last.close);
    assert_eq!(result.feature_date, last.date);
    assert!(result.predicted_price.is_finite());
    assert!((result.price_change - (result.predicted_price - result.current_price)).abs() < 1e-9);
    assert_eq!(result.individual_predictions.len(), 3);
    assert_eq!(result.model_weights.len(), 3);
    assert!(result.excluded_models.is_empty());
    assert!(result.prediction_std >= 0.0);
    assert!(result.prediction_range >= 0.0);

    let lo = result
        .individual_predictions
        .values()
        .cloned()
        .fold(f64::INFINITY, f64::min);
    let hi = result
        .individual_predictions
        .values()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(result.predicted_price >= lo - 1e-9 && result.predicted_price <= hi + 1e-9);
    assert!(result.model_weights.values().all(|w| *w > 0.0));
}

#[test]
fn test_rally_tail_reports_newest_close() {
    // 16 straight up-days leave RSI undefined on the newest bars.
    let mut bars = synthetic_bars(330, 21);
    let n = bars.len();
    for i in n - 16..n {
        let prev_close = bars[i - 1].close;
        let close = prev_close * 1.005;
        bars[i].open = prev_close;
        bars[i].close = close;
        bars[i].high = close * 1.002;
        bars[i].low = prev_close * 0.998;
    }
    let series = BarSeries::new("SYN", bars);
    let last = *series.last().unwrap();

    let mut predictor = StockPredictor::new("SYN", quick_config());
    let table = predictor.assemble(&series).unwrap();
    predictor.train(&table).unwrap();
    let result = predictor.predict(&series).unwrap();

    assert_eq!(result.current_price, last.close);
    assert!(result.feature_date < last.date);
    assert!((result.price_change - (result.predicted_price - last.close)).abs() < 1e-9);
    assert!(
        (result.price_change_pct - result.price_change / last.close * 100.0).abs() < 1e-9
    );
}

#[test]
fn test_same_seed_gives_same_prediction() {
    let (first, series) = trained_on(8);
    let (second, _) = trained_on(8);
    let a = first.predict(&series).unwrap();
    let b = second.predict(&series).unwrap();
    assert_eq!(a.predicted_price, b.predicted_price);
    assert_eq!(a.individual_predictions, b.individual_predictions);
    assert_eq!(a.confidence_score, b.confidence_score);
}

#[test]
fn test_model_info_after_training() {
    let (predictor, _) = trained_on(17);
    let info = predictor.model_info();
    assert!(info.is_trained);
    assert_eq!(info.symbol, "SYN");
    assert_eq!(info.feature_count, feature_names().len());
    assert_eq!(info.model_scores.len(), info.models.len());
    assert!(info.top_features.len() <= predictor.config().top_features);
    assert!(
        info.top_features
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance)
    );
}

#[test]
fn test_failed_retrain_keeps_previous_ensemble() {
    let (mut predictor, series) = trained_on(4);
    let before = predictor.predict(&series).unwrap();

    assert!(predictor.train(&FeatureTable::default()).is_err());
    assert!(predictor.is_trained());
    let after = predictor.predict(&series).unwrap();
    assert_eq!(before.predicted_price, after.predicted_price);
}

#[test]
fn test_end_to_end_from_csv() {
    let dir = create_test_dir();
    let mut contents = String::from("Date,Open,High,Low,Close,Volume\n");
    for bar in synthetic_bars(320, 77) {
        contents.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    fs::write(dir.join("ACME.csv"), contents).unwrap();

    let provider = CsvBarProvider::new(&dir);
    let mut predictor = StockPredictor::new("acme", quick_config());
    let result = predictor
        .train_and_predict(&provider, LookbackPeriod::Max)
        .unwrap();

    assert_eq!(result.symbol, "ACME");
    assert!(result.predicted_price.is_finite());
    assert!(predictor.is_trained());

    let missing = StockPredictor::new("NOPE", quick_config()).train_and_predict(&provider, LookbackPeriod::Max);
    assert!(missing.is_err());

    fs::remove_dir_all(dir).ok();
}

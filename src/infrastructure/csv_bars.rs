//! File-backed bar provider.
//!
//! Reads one `<SYMBOL>.csv` per symbol from a data directory. Files need the
//! `date,open,high,low,close,volume` columns (capitalized headers are accepted and
//! extra columns are ignored).

use crate::domain::errors::PredictionError;
use crate::domain::market::bar::{Bar, BarSeries};
use crate::domain::market::lookback::LookbackPeriod;
use crate::domain::ports::BarSeriesProvider;
use crate::domain::validation::data_quality::BarValidator;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct BarRecord {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

impl From<BarRecord> for Bar {
    fn from(r: BarRecord) -> Self {
        Bar::new(r.date, r.open, r.high, r.low, r.close, r.volume)
    }
}

pub struct CsvBarProvider {
    data_dir: PathBuf,
}

impl CsvBarProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol.to_uppercase()))
    }

    /// Every parseable, valid bar in the file, ascending by date.
    pub fn load(&self, symbol: &str) -> Result<Vec<Bar>> {
        let path = self.path_for(symbol);
        let mut bars = read_bars(&path)?;
        bars.sort_by_key(|b| b.date);
        Ok(BarValidator::sanitize(symbol, bars))
    }
}

fn read_bars(path: &Path) -> Result<Vec<Bar>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for (line, result) in rdr.deserialize::<BarRecord>().enumerate() {
        match result {
            Ok(record) => bars.push(record.into()),
            Err(e) => {
                skipped += 1;
                warn!("Skipping malformed row {} in {}: {}", line + 2, path.display(), e);
            }
        }
    }
    if skipped > 0 {
        warn!("{}: skipped {} malformed rows", path.display(), skipped);
    }
    Ok(bars)
}

impl BarSeriesProvider for CsvBarProvider {
    fn fetch(&self, symbol: &str, period: LookbackPeriod) -> Result<BarSeries> {
        let bars = self.load(symbol)?;
        let window = period.apply(&bars);
        if window.is_empty() {
            return Err(PredictionError::DataUnavailable {
                symbol: symbol.to_uppercase(),
            }
            .into());
        }
        info!(
            "Loaded {} bars for {} ({}) from {}",
            window.len(),
            symbol.to_uppercase(),
            period,
            self.data_dir.display()
        );
        Ok(BarSeries::new(symbol, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn create_test_dir() -> PathBuf {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "stockcast_csv_{}_{}",
            std::process::id(),
            unique_id
        ));
        fs::create_dir_all(&dir).expect("Failed to create test temp dir");
        dir
    }

    #[test]
    fn test_reads_sorts_and_drops_invalid_rows() {
        let dir = create_test_dir();
        fs::write(
            dir.join("ACME.csv"),
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-03,10.5,11,10,10.8,10.8,1200\n\
             2024-01-02,10,10.6,9.8,10.4,10.4,1000\n\
             2024-01-04,11,10,10.5,10.7,10.7,900\n\
             2024-01-05,not-a-number,11,10,10.9,10.9,800\n\
             2024-01-08,10.9,11.2,10.6,11.1,11.1,1500\n",
        )
        .unwrap();

        let provider = CsvBarProvider::new(&dir);
        let series = provider.fetch("acme", LookbackPeriod::Max).unwrap();
        let dates: Vec<String> = series.bars().iter().map(|b| b.date.to_string()).collect();
        assert_eq!(series.symbol, "ACME");
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-08"]);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_lookback_window_is_applied() {
        let dir = create_test_dir();
        fs::write(
            dir.join("XYZ.csv"),
            "date,open,high,low,close,volume\n\
             2023-01-02,1,2,0.5,1.5,10\n\
             2023-12-29,1,2,0.5,1.5,10\n\
             2024-01-02,1,2,0.5,1.5,10\n",
        )
        .unwrap();

        let provider = CsvBarProvider::new(&dir);
        let ytd = provider.fetch("XYZ", LookbackPeriod::YearToDate).unwrap();
        assert_eq!(ytd.len(), 1);
        let all = provider.fetch("XYZ", LookbackPeriod::Max).unwrap();
        assert_eq!(all.len(), 3);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_file_and_empty_file() {
        let dir = create_test_dir();
        let provider = CsvBarProvider::new(&dir);
        assert!(provider.fetch("NOPE", LookbackPeriod::OneYear).is_err());

        fs::write(dir.join("EMPTY.csv"), "date,open,high,low,close,volume\n").unwrap();
        let err = provider.fetch("EMPTY", LookbackPeriod::Max).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictionError>(),
            Some(PredictionError::DataUnavailable { .. })
        ));

        fs::remove_dir_all(dir).ok();
    }
}

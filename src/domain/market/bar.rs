use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Ascending daily bars for a single symbol.
///
/// Dates are strictly increasing; non-trading days are simply absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawBarSeries")]
pub struct BarSeries {
    pub symbol: String,
    bars: Vec<Bar>,
}

/// Deserialized form; goes through `BarSeries::new` so ordering holds.
#[derive(Deserialize)]
struct RawBarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl From<RawBarSeries> for BarSeries {
    fn from(raw: RawBarSeries) -> Self {
        BarSeries::new(raw.symbol, raw.bars)
    }
}

impl BarSeries {
    /// Builds a series, sorting by date and keeping the first bar of any duplicated date.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Self {
            symbol: symbol.into().to_uppercase(),
            bars,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        Bar::new(date, close, close + 1.0, close - 1.0, close, 1_000.0)
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let series = BarSeries::new("aapl", vec![bar(5, 3.0), bar(1, 1.0), bar(5, 9.0), bar(2, 2.0)]);

        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_deserialized_series_is_sorted_and_deduplicated() {
        let bars = vec![bar(4, 4.0), bar(2, 2.0), bar(4, 8.0), bar(3, 3.0)];
        let json = serde_json::json!({ "symbol": "msft", "bars": bars }).to_string();

        let series: BarSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(series.symbol, "MSFT");
        assert_eq!(series.closes(), vec![2.0, 3.0, 4.0]);

        let again: BarSeries = serde_json::from_str(&serde_json::to_string(&series).unwrap()).unwrap();
        assert_eq!(again.bars(), series.bars());
    }
}

use crate::domain::market::bar::BarSeries;
use crate::domain::market::lookback::LookbackPeriod;
use anyhow::Result;

/// Source of historical daily bars (market-data collaborator).
///
/// Implementations return bars ascending by date for the requested window; an
/// empty series is a valid answer and is rejected by the prediction core.
pub trait BarSeriesProvider: Send + Sync {
    fn fetch(&self, symbol: &str, period: LookbackPeriod) -> Result<BarSeries>;
}

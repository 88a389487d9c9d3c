use crate::domain::market::bar::Bar;
use tracing::warn;

/// Centralized validator for historical bar integrity.
///
/// Rejects bars that are physically impossible before they reach the indicator library.
pub struct BarValidator;

impl BarValidator {
    /// Validates a single bar. Returns true if valid, false otherwise.
    pub fn validate_bar(symbol: &str, bar: &Bar) -> bool {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            warn!(
                "Validation FAILED: Bar for {} on {} has non-positive or non-finite price component(s)",
                symbol, bar.date
            );
            return false;
        }

        if bar.low > bar.high {
            warn!(
                "Validation FAILED: Bar for {} on {} has low {} > high {}",
                symbol, bar.date, bar.low, bar.high
            );
            return false;
        }

        if !bar.volume.is_finite() || bar.volume < 0.0 {
            warn!(
                "Validation FAILED: Bar for {} on {} has invalid volume: {}",
                symbol, bar.date, bar.volume
            );
            return false;
        }

        true
    }

    /// Keeps valid bars whose dates strictly increase, in input order.
    pub fn sanitize(symbol: &str, bars: Vec<Bar>) -> Vec<Bar> {
        let mut kept: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            if !Self::validate_bar(symbol, &bar) {
                continue;
            }
            if let Some(prev) = kept.last() {
                if bar.date <= prev.date {
                    warn!(
                        "Validation FAILED: Bar for {} on {} is not after {}",
                        symbol, bar.date, prev.date
                    );
                    continue;
                }
            }
            kept.push(bar);
        }
        kept
    }
}

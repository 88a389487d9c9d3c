//! Binary candle pattern flags (1.0 / 0.0).

use super::Series;
use crate::domain::market::bar::Bar;

fn flag(condition: bool) -> Option<f64> {
    Some(if condition { 1.0 } else { 0.0 })
}

#[derive(Debug, Clone)]
pub struct CandlePatterns {
    pub gap_up: Series,
    pub gap_down: Series,
    pub doji: Series,
    pub hammer: Series,
}

/// Gap and candle-shape flags. The first bar has no prior bar, so it never gaps.
pub fn candle_patterns(bars: &[Bar]) -> CandlePatterns {
    let mut patterns = CandlePatterns {
        gap_up: Vec::with_capacity(bars.len()),
        gap_down: Vec::with_capacity(bars.len()),
        doji: Vec::with_capacity(bars.len()),
        hammer: Vec::with_capacity(bars.len()),
    };

    for (i, bar) in bars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| &bars[p]);
        patterns
            .gap_up
            .push(flag(prev.is_some_and(|p| bar.open > p.high)));
        patterns
            .gap_down
            .push(flag(prev.is_some_and(|p| bar.open < p.low)));

        let body = (bar.close - bar.open).abs();
        let range = bar.high - bar.low;
        let lower_shadow = bar.open.min(bar.close) - bar.low;
        let upper_shadow = bar.high - bar.open.max(bar.close);
        patterns.doji.push(flag(body < range * 0.1));
        patterns
            .hammer
            .push(flag(lower_shadow > 2.0 * body && upper_shadow < body));
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(i: u64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i);
        Bar::new(date, open, high, low, close, 1.0)
    }

    #[test]
    fn test_gaps() {
        let bars = vec![
            bar(0, 10.0, 11.0, 9.0, 10.5),
            bar(1, 11.5, 12.0, 11.2, 11.8),
            bar(2, 10.0, 10.5, 9.5, 10.2),
        ];
        let p = candle_patterns(&bars);
        assert_eq!(p.gap_up, vec![Some(0.0), Some(1.0), Some(0.0)]);
        assert_eq!(p.gap_down, vec![Some(0.0), Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_doji_and_hammer() {
        let bars = vec![
            // Tiny body inside a wide range
            bar(0, 10.0, 11.0, 9.0, 10.05),
            // Long lower shadow, small upper shadow
            bar(1, 10.0, 10.6, 7.0, 10.5),
            // Flat bar: zero body is not below zero range
            bar(2, 5.0, 5.0, 5.0, 5.0),
        ];
        let p = candle_patterns(&bars);
        assert_eq!(p.doji, vec![Some(1.0), Some(0.0), Some(0.0)]);
        assert_eq!(p.hammer, vec![Some(0.0), Some(1.0), Some(0.0)]);
    }
}

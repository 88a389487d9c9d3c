//! Volatility measures: Bollinger Bands, ATR and the ADX family.

use super::{Series, combine, ratio, rolling_mean, rolling_std, sma};
use crate::domain::market::bar::Bar;

#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Series,
    pub lower: Series,
    pub middle: Series,
    pub width: Series,
    /// (close - lower) / width; missing when the bands collapse
    pub position: Series,
}

pub fn bollinger_bands(closes: &[f64], window: usize, k: f64) -> BollingerBands {
    let middle = sma(closes, window);
    let std = rolling_std(closes, window);
    let upper = combine(&middle, &std, |m, s| Some(m + k * s));
    let lower = combine(&middle, &std, |m, s| Some(m - k * s));
    let width = combine(&upper, &lower, |u, l| Some(u - l));
    let position = (0..closes.len())
        .map(|i| match (lower[i], upper[i]) {
            (Some(l), Some(u)) => band_position(closes[i], l, u),
            _ => None,
        })
        .collect();

    BollingerBands {
        upper,
        lower,
        middle,
        width,
        position,
    }
}

/// Where `close` sits between the bands: 0 at the lower band, 1 at the upper band.
pub fn band_position(close: f64, lower: f64, upper: f64) -> Option<f64> {
    ratio(close - lower, upper - lower)
}

/// True range per bar. The first bar has no previous close, so its range is high - low.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let high_low = bar.high - bar.low;
            if i == 0 {
                return high_low;
            }
            let prev_close = bars[i - 1].close;
            high_low
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        })
        .collect()
}

/// Average True Range: simple rolling mean of the true range.
pub fn atr(bars: &[Bar], window: usize) -> Series {
    sma(&true_range(bars), window)
}

#[derive(Debug, Clone)]
pub struct DirectionalIndex {
    pub di_plus: Series,
    pub di_minus: Series,
    pub adx: Series,
}

/// Directional movement indicators and ADX using simple rolling means.
///
/// +DM / -DM keep only the dominant move of each bar (clipped at zero). The first
/// bar has no predecessor and contributes zero movement.
pub fn directional_index(bars: &[Bar], window: usize) -> DirectionalIndex {
    let mut plus_dm = Vec::with_capacity(bars.len());
    let mut minus_dm = Vec::with_capacity(bars.len());
    for i in 0..bars.len() {
        if i == 0 {
            plus_dm.push(Some(0.0));
            minus_dm.push(Some(0.0));
            continue;
        }
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;
        plus_dm.push(Some(if up_move > down_move { up_move.max(0.0) } else { 0.0 }));
        minus_dm.push(Some(if down_move > up_move { down_move.max(0.0) } else { 0.0 }));
    }

    let tr_mean = sma(&true_range(bars), window);
    let di = |dm: &Series| {
        combine(&rolling_mean(dm, window), &tr_mean, |d, t| {
            ratio(d, t).map(|v| 100.0 * v)
        })
    };
    let di_plus = di(&plus_dm);
    let di_minus = di(&minus_dm);
    let dx = combine(&di_plus, &di_minus, |p, m| {
        ratio((p - m).abs(), p + m).map(|v| 100.0 * v)
    });
    let adx = rolling_mean(&dx, window);

    DirectionalIndex {
        di_plus,
        di_minus,
        adx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(i: u64, high: f64, low: f64, close: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i);
        Bar::new(date, close, high, low, close, 1_000.0)
    }

    /// Close that lands exactly `k` sample deviations from the mean of `prefix` plus itself.
    fn close_on_band(prefix: &[f64], k: f64, upper: bool) -> f64 {
        let n = (prefix.len() + 1) as f64;
        let mu = prefix.iter().sum::<f64>() / (n - 1.0);
        let ss: f64 = prefix.iter().map(|v| (v - mu).powi(2)).sum();
        let denom = (n - 1.0).powi(3) / (n * n) - k * k * (n - 1.0) / n;
        let offset = (k * k * ss / denom).sqrt();
        if upper { mu + offset } else { mu - offset }
    }

    #[test]
    fn test_bollinger_position_at_bands() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.9).sin() * 2.0).collect();
        let window = closes[11..30].to_vec();

        closes.push(close_on_band(&window, 2.0, true));
        let bb = bollinger_bands(&closes, 20, 2.0);
        assert!((closes[30] - bb.upper[30].unwrap()).abs() < 1e-9);
        assert!((bb.position[30].unwrap() - 1.0).abs() < 1e-9);

        closes[30] = close_on_band(&window, 2.0, false);
        let bb = bollinger_bands(&closes, 20, 2.0);
        assert!((closes[30] - bb.lower[30].unwrap()).abs() < 1e-9);
        assert!(bb.position[30].unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_bollinger_position_matches_definition() {
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.4).cos() * 3.0).collect();
        let bb = bollinger_bands(&closes, 20, 2.0);
        assert!(bb.position[18].is_none());
        for i in 19..60 {
            let expected = (closes[i] - bb.lower[i].unwrap()) / bb.width[i].unwrap();
            assert!((bb.position[i].unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bollinger_zero_width_is_missing() {
        let bb = bollinger_bands(&[10.0; 25], 20, 2.0);
        assert_eq!(bb.width[24], Some(0.0));
        assert_eq!(bb.position[24], None);
    }

    #[test]
    fn test_true_range_uses_previous_close() {
        let bars = vec![bar(0, 11.0, 9.0, 10.0), bar(1, 15.0, 12.0, 14.0), bar(2, 13.5, 13.0, 13.2)];
        let tr = true_range(&bars);
        assert_eq!(tr[0], 2.0);
        assert_eq!(tr[1], 5.0); // |15 - 10|
        assert!((tr[2] - 1.0).abs() < 1e-12); // |13 - 14|
        assert!((atr(&bars, 2)[2].unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_directional_index_uptrend() {
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let base = 100.0 + i as f64;
                bar(i, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let dmi = directional_index(&bars, 14);

        let last = 59;
        assert!(dmi.di_plus[last].unwrap() > dmi.di_minus[last].unwrap());
        assert!((dmi.adx[last].unwrap() - 100.0).abs() < 1e-9);
        assert!(dmi.adx[20].is_none());
    }
}

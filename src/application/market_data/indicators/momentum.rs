//! Momentum oscillators: RSI, stochastic and Williams %R.

use super::{Series, combine, ratio, rolling_max, rolling_mean, rolling_min};
use crate::domain::market::bar::Bar;

/// Relative Strength Index over simple rolling averages of gains and losses.
///
/// The first bar has no delta, so values start at row `window`. A zero average
/// loss leaves the ratio undefined and the row missing.
pub fn rsi(closes: &[f64], window: usize) -> Series {
    let mut gains: Series = Vec::with_capacity(closes.len());
    let mut losses: Series = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
            continue;
        }
        let delta = closes[i] - closes[i - 1];
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let avg_gain = rolling_mean(&gains, window);
    let avg_loss = rolling_mean(&losses, window);
    combine(&avg_gain, &avg_loss, |g, l| {
        ratio(g, l).map(|rs| 100.0 - 100.0 / (1.0 + rs))
    })
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    pub k: Series,
    pub d: Series,
}

/// %K = 100 * (close - lowest low) / (highest high - lowest low); %D = SMA(%K).
pub fn stochastic(bars: &[Bar], window: usize, smoothing: usize) -> Stochastic {
    let (highest, lowest, closes) = extremes(bars, window);
    let k: Series = (0..bars.len())
        .map(|i| match (highest[i], lowest[i]) {
            (Some(h), Some(l)) => ratio(closes[i] - l, h - l).map(|v| 100.0 * v),
            _ => None,
        })
        .collect();
    let d = rolling_mean(&k, smoothing);
    Stochastic { k, d }
}

/// Williams %R = -100 * (highest high - close) / (highest high - lowest low).
pub fn williams_r(bars: &[Bar], window: usize) -> Series {
    let (highest, lowest, closes) = extremes(bars, window);
    (0..bars.len())
        .map(|i| match (highest[i], lowest[i]) {
            (Some(h), Some(l)) => ratio(h - closes[i], h - l).map(|v| -100.0 * v),
            _ => None,
        })
        .collect()
}

fn extremes(bars: &[Bar], window: usize) -> (Series, Series, Vec<f64>) {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    (rolling_max(&highs, window), rolling_min(&lows, window), closes)
}

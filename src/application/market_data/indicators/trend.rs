//! Trend-following indicators: moving averages and MACD.

use super::{Series, defined, diff};

/// Simple moving average of closes plus its first difference ("slope").
pub fn sma_with_slope(closes: &[f64], window: usize) -> (Series, Series) {
    let sma = super::sma(closes, window);
    let slope = diff(&sma);
    (sma, slope)
}

/// Exponential moving average with `alpha = 2 / (span + 1)`.
///
/// Uses the adjusted form: each value is the exponentially weighted mean of all
/// observations so far, normalized by the sum of the weights. It is defined from
/// the first bar and converges to the plain recursive EMA as history grows.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    values
        .iter()
        .map(|v| {
            weighted_sum = v + decay * weighted_sum;
            weight_total = 1.0 + decay * weight_total;
            weighted_sum / weight_total
        })
        .collect()
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone)]
pub struct Macd {
    pub line: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> Macd {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal = ema(&line, signal_span);
    let histogram: Vec<f64> = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

    Macd {
        line: defined(&line),
        signal: defined(&signal),
        histogram: defined(&histogram),
    }
}

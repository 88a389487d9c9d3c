//! Technical indicator library
//!
//! Every function maps an ascending price history onto one or more columns aligned
//! with the input: the value at row `i` only ever depends on rows `0..=i`.
//! Missing values are `None`; they appear during warm-up and wherever a ratio
//! would divide by zero, and are never clamped or imputed here.

pub mod momentum;
pub mod patterns;
pub mod trend;
pub mod volatility;
pub mod volume;

use ta::Next;
use ta::indicators::{Maximum, Minimum, SimpleMovingAverage};

/// Column of optional values aligned with the bar series.
pub type Series = Vec<Option<f64>>;

/// Guarded division: zero or non-finite results become missing.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Wraps fully-defined values into a series.
pub fn defined(values: &[f64]) -> Series {
    values.iter().map(|v| Some(*v)).collect()
}

/// Element-wise combination, missing if either side is missing.
pub fn combine<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Series
where
    F: Fn(f64, f64) -> Option<f64>,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => f(*x, *y),
            _ => None,
        })
        .collect()
}

/// Value `lag` rows earlier; the first `lag` rows are missing.
pub fn shift(series: &[Option<f64>], lag: usize) -> Series {
    (0..series.len())
        .map(|i| if i >= lag { series[i - lag] } else { None })
        .collect()
}

/// First difference.
pub fn diff(series: &[Option<f64>]) -> Series {
    combine(&shift(series, 1), series, |prev, cur| Some(cur - prev))
}

/// Fractional change over `periods` rows.
pub fn pct_change(values: &[f64], periods: usize) -> Series {
    (0..values.len())
        .map(|i| {
            if i < periods {
                return None;
            }
            ratio(values[i] - values[i - periods], values[i - periods])
        })
        .collect()
}

/// Trailing mean over exactly `window` fully-defined values.
pub fn rolling_mean(series: &[Option<f64>], window: usize) -> Series {
    rolling(series, window, |w| Some(w.iter().sum::<f64>() / w.len() as f64))
}

/// Trailing sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[f64], window: usize) -> Series {
    rolling(&defined(values), window, |w| {
        if w.len() < 2 {
            return None;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        Some(var.sqrt())
    })
}

fn rolling<F>(series: &[Option<f64>], window: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> Option<f64>,
{
    if window == 0 {
        return vec![None; series.len()];
    }
    let mut out = Vec::with_capacity(series.len());
    let mut buf: Vec<f64> = Vec::with_capacity(window);
    for i in 0..series.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        buf.clear();
        for v in &series[i + 1 - window..=i] {
            match v {
                Some(x) => buf.push(*x),
                None => break,
            }
        }
        out.push(if buf.len() == window { f(&buf) } else { None });
    }
    out
}

/// Streams `values` through a `ta` indicator, masking the first `window - 1` rows.
fn streamed<I>(values: &[f64], window: usize, mut indicator: I) -> Series
where
    I: Next<f64, Output = f64>,
{
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let out = indicator.next(*v);
            (i + 1 >= window).then_some(out)
        })
        .collect()
}

/// Simple moving average of fully-defined values.
pub fn sma(values: &[f64], window: usize) -> Series {
    match SimpleMovingAverage::new(window) {
        Ok(indicator) => streamed(values, window, indicator),
        Err(_) => vec![None; values.len()],
    }
}

/// Trailing maximum over `window` rows.
pub fn rolling_max(values: &[f64], window: usize) -> Series {
    match Maximum::new(window) {
        Ok(indicator) => streamed(values, window, indicator),
        Err(_) => vec![None; values.len()],
    }
}

/// Trailing minimum over `window` rows.
pub fn rolling_min(values: &[f64], window: usize) -> Series {
    match Minimum::new(window) {
        Ok(indicator) => streamed(values, window, indicator),
        Err(_) => vec![None; values.len()],
    }
}

/// Running total treating missing entries as zero contribution.
pub fn cumsum_filled(series: &[Option<f64>]) -> Series {
    let mut total = 0.0;
    series
        .iter()
        .map(|v| {
            total += v.unwrap_or(0.0);
            Some(total)
        })
        .collect()
}

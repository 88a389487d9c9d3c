//! Ordered catalog of engineered feature columns.
//!
//! The assembler emits columns in exactly this order. Trained ensembles record the
//! list and look inference values up by name, so a reordering here is caught as a
//! mismatch rather than silently feeding the wrong inputs.

/// Trailing windows of the simple moving averages (and their slopes / price ratios).
pub const SMA_WINDOWS: &[usize] = &[5, 10, 20, 50, 100, 200];

/// Spans of the exponential moving averages.
pub const EMA_SPANS: &[usize] = &[12, 26, 50, 100];

/// Lags applied to close, volume and RSI.
pub const LAGS: &[usize] = &[1, 2, 3, 5];

pub const BOLLINGER_WINDOW: usize = 20;
pub const BOLLINGER_K: f64 = 2.0;
pub const RSI_WINDOW: usize = 14;
pub const RSI_SLOW_WINDOW: usize = 21;
pub const STOCHASTIC_WINDOW: usize = 14;
pub const STOCHASTIC_SMOOTHING: usize = 3;
pub const ATR_WINDOW: usize = 14;
pub const ADX_WINDOW: usize = 14;

/// Raw bar columns that are never fed to the models.
pub const RAW_COLUMNS: &[&str] = &["open", "high", "low", "close", "volume"];

pub const TARGET_COLUMN: &str = "target";

/// Longest trailing window any indicator needs before producing a value.
pub fn warmup_bars() -> usize {
    SMA_WINDOWS.iter().copied().max().unwrap_or(0)
}

/// Full ordered list of feature column names.
pub fn feature_names() -> Vec<String> {
    let mut names: Vec<String> = [
        "price_change",
        "price_change_2d",
        "price_change_5d",
        "high_low_ratio",
        "open_close_ratio",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for w in SMA_WINDOWS {
        names.push(format!("sma_{w}"));
        names.push(format!("sma_{w}_slope"));
    }
    for s in EMA_SPANS {
        names.push(format!("ema_{s}"));
    }
    for w in SMA_WINDOWS {
        names.push(format!("price_sma_{w}_ratio"));
    }

    names.extend(
        [
            "bb_upper",
            "bb_lower",
            "bb_middle",
            "bb_width",
            "bb_position",
            "rsi",
            "rsi_21",
            "macd",
            "macd_signal",
            "macd_histogram",
            "stoch_k",
            "stoch_d",
            "williams_r",
            "atr",
            "atr_ratio",
            "di_plus",
            "di_minus",
            "adx",
            "volume_sma_10",
            "volume_sma_20",
            "volume_ratio",
            "obv",
            "vpt",
            "gap_up",
            "gap_down",
            "doji",
            "hammer",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    for lag in LAGS {
        names.push(format!("close_lag_{lag}"));
        names.push(format!("volume_lag_{lag}"));
        names.push(format!("rsi_lag_{lag}"));
    }

    names.extend(
        [
            "close_rolling_std_10",
            "close_rolling_std_20",
            "volume_rolling_std_10",
            "day_of_week",
            "month",
            "quarter",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_feature_names_unique() {
        let names = feature_names();
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names.len(), 72);
    }

    #[test]
    fn test_raw_and_target_columns_excluded() {
        let names = feature_names();
        for raw in RAW_COLUMNS {
            assert!(!names.iter().any(|n| n == raw));
        }
        assert!(!names.iter().any(|n| n == TARGET_COLUMN));
        assert_eq!(warmup_bars(), 200);
    }
}

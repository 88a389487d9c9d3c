use crate::application::market_data::indicators::{
    self, Series, combine, defined, momentum, patterns, ratio, shift, trend, volatility, volume,
};
use crate::domain::errors::PredictionError;
use crate::domain::market::bar::{Bar, BarSeries};
use crate::domain::ml::feature_registry::{
    self, ADX_WINDOW, ATR_WINDOW, BOLLINGER_K, BOLLINGER_WINDOW, EMA_SPANS, LAGS, RSI_SLOW_WINDOW,
    RSI_WINDOW, SMA_WINDOWS, STOCHASTIC_SMOOTHING, STOCHASTIC_WINDOW,
};
use crate::domain::ml::feature_table::{FeatureRow, FeatureTable, LatestFeatures};
use chrono::Datelike;
use tracing::{debug, info, warn};

/// Builds leakage-free feature tables from daily bars.
///
/// Every indicator runs over the full history first; only then are rows with any
/// missing value dropped, so all retained rows share one shape and one date set.
#[derive(Debug, Clone, Default)]
pub struct FeatureAssembler;

impl FeatureAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Longest indicator window (bars consumed before the first complete row).
    pub fn warmup_bars(&self) -> usize {
        feature_registry::warmup_bars()
    }

    /// Shortest series that can yield one training row: the warm-up, the first
    /// complete row and its next-day close.
    pub fn min_history(&self) -> usize {
        self.warmup_bars() + 2
    }

    /// Feature table with a next-day close target; rows missing any value are dropped.
    pub fn assemble(&self, series: &BarSeries) -> Result<FeatureTable, PredictionError> {
        let bars = self.require_bars(series)?;
        let (columns, values) = self.compute_columns(bars);

        let rows: Vec<FeatureRow> = (0..bars.len().saturating_sub(1))
            .filter_map(|i| {
                let features = complete_row(&values, i)?;
                let target = bars[i + 1].close;
                target.is_finite().then(|| FeatureRow {
                    date: bars[i].date,
                    close: bars[i].close,
                    features,
                    target,
                })
            })
            .collect();

        info!(
            "Created {} features for {} from {} bars ({} usable rows)",
            columns.len(),
            series.symbol,
            bars.len(),
            rows.len()
        );
        Ok(FeatureTable::new(columns, rows))
    }

    /// Most recent row whose features are all defined, ignoring the (absent) target.
    pub fn latest_row(&self, series: &BarSeries) -> Result<LatestFeatures, PredictionError> {
        let bars = self.require_bars(series)?;
        let (columns, values) = self.compute_columns(bars);

        (0..bars.len())
            .rev()
            .find_map(|i| {
                complete_row(&values, i).map(|row| LatestFeatures {
                    date: bars[i].date,
                    close: bars[i].close,
                    columns: columns.clone(),
                    values: row,
                })
            })
            .ok_or(PredictionError::InsufficientHistory {
                rows: 0,
                required: self.min_history(),
            })
    }

    fn require_bars<'a>(&self, series: &'a BarSeries) -> Result<&'a [Bar], PredictionError> {
        if series.is_empty() {
            return Err(PredictionError::DataUnavailable {
                symbol: series.symbol.clone(),
            });
        }
        if series.len() < self.min_history() {
            warn!(
                "{} has {} bars; at least {} are needed for a complete feature row",
                series.symbol,
                series.len(),
                self.min_history()
            );
        }
        Ok(series.bars())
    }

    fn compute_columns(&self, bars: &[Bar]) -> (Vec<String>, Vec<Series>) {
        let mut frame = Frame::default();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        // Price action
        frame.push("price_change", indicators::pct_change(&closes, 1));
        frame.push("price_change_2d", indicators::pct_change(&closes, 2));
        frame.push("price_change_5d", indicators::pct_change(&closes, 5));
        frame.push(
            "high_low_ratio",
            bars.iter().map(|b| ratio(b.high, b.low)).collect(),
        );
        frame.push(
            "open_close_ratio",
            bars.iter().map(|b| ratio(b.open, b.close)).collect(),
        );

        // Moving averages
        let mut smas: Vec<(usize, Series)> = Vec::with_capacity(SMA_WINDOWS.len());
        for &w in SMA_WINDOWS {
            let (sma, slope) = trend::sma_with_slope(&closes, w);
            frame.push(format!("sma_{w}"), sma.clone());
            frame.push(format!("sma_{w}_slope"), slope);
            smas.push((w, sma));
        }
        for &s in EMA_SPANS {
            frame.push(format!("ema_{s}"), defined(&trend::ema(&closes, s)));
        }
        let close_series = defined(&closes);
        for (w, sma) in &smas {
            frame.push(
                format!("price_sma_{w}_ratio"),
                combine(&close_series, sma, ratio),
            );
        }

        let bb = volatility::bollinger_bands(&closes, BOLLINGER_WINDOW, BOLLINGER_K);
        frame.push("bb_upper", bb.upper);
        frame.push("bb_lower", bb.lower);
        frame.push("bb_middle", bb.middle);
        frame.push("bb_width", bb.width);
        frame.push("bb_position", bb.position);

        // Momentum
        let rsi = momentum::rsi(&closes, RSI_WINDOW);
        frame.push("rsi", rsi.clone());
        frame.push("rsi_21", momentum::rsi(&closes, RSI_SLOW_WINDOW));

        let macd = trend::macd(&closes, 12, 26, 9);
        frame.push("macd", macd.line);
        frame.push("macd_signal", macd.signal);
        frame.push("macd_histogram", macd.histogram);

        let stoch = momentum::stochastic(bars, STOCHASTIC_WINDOW, STOCHASTIC_SMOOTHING);
        frame.push("stoch_k", stoch.k);
        frame.push("stoch_d", stoch.d);
        frame.push("williams_r", momentum::williams_r(bars, STOCHASTIC_WINDOW));

        // Volatility
        let atr = volatility::atr(bars, ATR_WINDOW);
        let atr_ratio = combine(&atr, &close_series, ratio);
        frame.push("atr", atr);
        frame.push("atr_ratio", atr_ratio);

        let dmi = volatility::directional_index(bars, ADX_WINDOW);
        frame.push("di_plus", dmi.di_plus);
        frame.push("di_minus", dmi.di_minus);
        frame.push("adx", dmi.adx);

        // Volume
        let vol = volume::volume_indicators(&closes, &volumes);
        frame.push("volume_sma_10", vol.sma_10);
        frame.push("volume_sma_20", vol.sma_20);
        frame.push("volume_ratio", vol.ratio);
        frame.push("obv", vol.obv);
        frame.push("vpt", vol.vpt);

        let candles = patterns::candle_patterns(bars);
        frame.push("gap_up", candles.gap_up);
        frame.push("gap_down", candles.gap_down);
        frame.push("doji", candles.doji);
        frame.push("hammer", candles.hammer);

        // Lags
        let volume_series = defined(&volumes);
        for &lag in LAGS {
            frame.push(format!("close_lag_{lag}"), shift(&close_series, lag));
            frame.push(format!("volume_lag_{lag}"), shift(&volume_series, lag));
            frame.push(format!("rsi_lag_{lag}"), shift(&rsi, lag));
        }

        // Rolling dispersion
        frame.push("close_rolling_std_10", indicators::rolling_std(&closes, 10));
        frame.push("close_rolling_std_20", indicators::rolling_std(&closes, 20));
        frame.push("volume_rolling_std_10", indicators::rolling_std(&volumes, 10));

        // Calendar
        frame.push(
            "day_of_week",
            bars.iter()
                .map(|b| Some(b.date.weekday().num_days_from_monday() as f64))
                .collect(),
        );
        frame.push("month", bars.iter().map(|b| Some(b.date.month() as f64)).collect());
        frame.push(
            "quarter",
            bars.iter()
                .map(|b| Some(((b.date.month() - 1) / 3 + 1) as f64))
                .collect(),
        );

        debug!("Computed {} indicator columns", frame.columns.len());
        frame.into_parts()
    }
}

/// All feature values of row `i`, or `None` if any is missing or non-finite.
fn complete_row(columns: &[Series], i: usize) -> Option<Vec<f64>> {
    columns
        .iter()
        .map(|c| c[i].filter(|v| v.is_finite()))
        .collect()
}

#[derive(Default)]
struct Frame {
    columns: Vec<(String, Series)>,
}

impl Frame {
    fn push(&mut self, name: impl Into<String>, series: Series) {
        self.columns.push((name.into(), series));
    }

    fn into_parts(self) -> (Vec<String>, Vec<Series>) {
        self.columns.into_iter().unzip()
    }
}

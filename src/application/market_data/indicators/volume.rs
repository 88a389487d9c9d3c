//! Volume-based indicators.

use super::{Series, cumsum_filled, pct_change, ratio, sma};

#[derive(Debug, Clone)]
pub struct VolumeIndicators {
    pub sma_10: Series,
    pub sma_20: Series,
    /// Volume relative to its 20-day average
    pub ratio: Series,
    pub obv: Series,
    pub vpt: Series,
}

pub fn volume_indicators(closes: &[f64], volumes: &[f64]) -> VolumeIndicators {
    let sma_10 = sma(volumes, 10);
    let sma_20 = sma(volumes, 20);
    let volume_ratio = volumes
        .iter()
        .zip(&sma_20)
        .map(|(v, avg)| avg.and_then(|a| ratio(*v, a)))
        .collect();

    VolumeIndicators {
        sma_10,
        sma_20,
        ratio: volume_ratio,
        obv: on_balance_volume(closes, volumes),
        vpt: volume_price_trend(closes, volumes),
    }
}

/// Cumulative volume signed by the direction of each day's close change.
///
/// Unchanged closes and the first bar contribute nothing.
pub fn on_balance_volume(closes: &[f64], volumes: &[f64]) -> Series {
    let signed: Series = (0..closes.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            let change = closes[i] - closes[i - 1];
            let direction = if change > 0.0 {
                1.0
            } else if change < 0.0 {
                -1.0
            } else {
                0.0
            };
            Some(direction * volumes[i])
        })
        .collect();
    cumsum_filled(&signed)
}

/// Cumulative volume times fractional close change.
pub fn volume_price_trend(closes: &[f64], volumes: &[f64]) -> Series {
    let flows: Series = pct_change(closes, 1)
        .iter()
        .zip(volumes)
        .map(|(pct, v)| pct.map(|p| p * v))
        .collect();
    cumsum_filled(&flows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obv_signs_and_flat_days() {
        let closes = [10.0, 11.0, 11.0, 9.0, 12.0];
        let volumes = [100.0, 200.0, 300.0, 400.0, 500.0];
        let obv = on_balance_volume(&closes, &volumes);
        assert_eq!(
            obv,
            vec![Some(0.0), Some(200.0), Some(200.0), Some(-200.0), Some(300.0)]
        );
    }

    #[test]
    fn test_vpt_accumulates_percent_moves() {
        let closes = [100.0, 110.0, 99.0];
        let volumes = [1_000.0, 1_000.0, 2_000.0];
        let vpt = volume_price_trend(&closes, &volumes);
        assert_eq!(vpt[0], Some(0.0));
        assert!((vpt[1].unwrap() - 100.0).abs() < 1e-9);
        assert!((vpt[2].unwrap() - (100.0 - 200.0)).abs() < 1e-9);
    }

    #[test]
    fn test_volume_ratio_zero_average_is_missing() {
        let closes = vec![10.0; 25];
        let volumes = vec![0.0; 25];
        let ind = volume_indicators(&closes, &volumes);
        assert_eq!(ind.sma_20[24], Some(0.0));
        assert_eq!(ind.ratio[24], None);
        assert_eq!(ind.ratio[10], None);
    }
}

//! Technical indicators over a price history.
//!
//! Every indicator returns one value per input point. Points where the
//! lookback window is not yet full are `None`; nothing is computed from a
//! partial window.

use coin_model::{IndicatedPoint, IndicatedSeries, PricePoint};

pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT_PERIOD: usize = 50;
pub const SMA_LONG_PERIOD: usize = 200;

/// Appends RSI-14, SMA-50 and SMA-200 to every point of `series`.
pub fn augment(series: &[PricePoint]) -> IndicatedSeries {
    let prices: Vec<f64> = series.iter().map(|point| point.price_eur).collect();
    let rsi_14 = rsi(&prices, RSI_PERIOD);
    let sma_50 = sma(&prices, SMA_SHORT_PERIOD);
    let sma_200 = sma(&prices, SMA_LONG_PERIOD);

    series
        .iter()
        .enumerate()
        .map(|(i, point)| IndicatedPoint {
            timestamp: point.timestamp,
            price_eur: point.price_eur,
            rsi_14: rsi_14[i],
            sma_50: sma_50[i],
            sma_200: sma_200[i],
        })
        .collect()
}

/// Simple moving average of the trailing `period` prices.
pub fn sma(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if period == 0 {
        return out;
    }

    for (i, window) in prices.windows(period).enumerate() {
        out[i + period - 1] = Some(window.iter().sum::<f64>() / period as f64);
    }
    out
}

/// Relative strength index with Wilder smoothing.
///
/// The first value lands at index `period`: it needs `period` price changes,
/// so `period + 1` prices.
pub fn rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; prices.len()];
    if period == 0 || prices.len() <= period {
        return out;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let n = period as f64;

    let (gain_sum, loss_sum) = changes[..period]
        .iter()
        .fold((0.0, 0.0), |(gain, loss), change| {
            (gain + change.max(0.0), loss + (-change).max(0.0))
        });
    let mut avg_gain = gain_sum / n;
    let mut avg_loss = loss_sum / n;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for (i, change) in changes.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (n - 1.0) + change.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-change).max(0.0)) / n;
        out[i + 1] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        return 0.0;
    }
    100.0 * avg_gain / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use proptest::prelude::*;

    fn series(prices: &[f64]) -> Vec<PricePoint> {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                timestamp: start + Duration::hours(i as i64),
                price_eur: *price,
            })
            .collect()
    }

    #[test]
    fn sma_pass_trailing_mean() {
        let result = sma(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(result, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn sma_pass_exact_length() {
        let result = sma(&[2.0, 4.0, 6.0], 3);
        assert_eq!(result, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn sma_pass_too_short() {
        assert!(sma(&[1.0; 49], 50).iter().all(Option::is_none));
    }

    #[test]
    fn sma_pass_zero_period() {
        assert_eq!(sma(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn rsi_pass_wilder_smoothing() {
        let result = rsi(&[1.0, 2.0, 1.0, 2.0], 2);
        assert_eq!(result, vec![None, None, Some(50.0), Some(75.0)]);
    }

    #[test]
    fn rsi_pass_only_gains() {
        let prices: Vec<f64> = (0..20).map(f64::from).collect();
        let result = rsi(&prices, RSI_PERIOD);
        assert!(result[..RSI_PERIOD].iter().all(Option::is_none));
        assert!(result[RSI_PERIOD..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn rsi_pass_only_losses() {
        let prices: Vec<f64> = (0..20).rev().map(f64::from).collect();
        let result = rsi(&prices, RSI_PERIOD);
        assert_eq!(result[RSI_PERIOD], Some(0.0));
    }

    #[test]
    fn rsi_pass_flat() {
        let result = rsi(&[5.0; 16], RSI_PERIOD);
        assert_eq!(result[15], Some(0.0));
    }

    #[test]
    fn rsi_pass_too_short() {
        assert!(rsi(&[1.0, 2.0, 3.0], RSI_PERIOD).iter().all(Option::is_none));
        assert!(rsi(&[1.0; 14], RSI_PERIOD).iter().all(Option::is_none));
    }

    #[test]
    fn augment_pass_keeps_points() {
        let input = series(&[10.0, 11.0, 12.0]);
        let output = augment(&input);
        assert_eq!(output.len(), 3);
        for (point, indicated) in input.iter().zip(&output) {
            assert_eq!(point.timestamp, indicated.timestamp);
            assert_eq!(point.price_eur, indicated.price_eur);
        }
    }

    #[test]
    fn augment_pass_sma_50_defined_from_fiftieth_point() {
        let prices: Vec<f64> = (1..=60).map(f64::from).collect();
        let output = augment(&series(&prices));
        assert!(output[..49].iter().all(|p| p.sma_50.is_none()));
        assert_eq!(output[49].sma_50, Some(25.5));
        assert!(output.iter().all(|p| p.sma_200.is_none()));
    }

    #[test]
    fn augment_pass_thirty_days_hourly() {
        let prices: Vec<f64> = (0..720).map(|i| 100.0 + (i % 7) as f64).collect();
        let output = augment(&series(&prices));
        assert!(output[199].sma_200.is_some());
        assert!(output[198].sma_200.is_none());
    }

    proptest! {
        #[test]
        fn augment_short_series_has_no_averages(prices in prop::collection::vec(1.0f64..1e6, 0..50)) {
            let output = augment(&series(&prices));
            prop_assert!(output.iter().all(|p| p.sma_50.is_none() && p.sma_200.is_none()));
            if prices.len() < RSI_PERIOD {
                prop_assert!(output.iter().all(|p| p.rsi_14.is_none()));
            }
        }

        #[test]
        fn augment_is_deterministic(prices in prop::collection::vec(1.0f64..1e6, 0..300)) {
            let input = series(&prices);
            prop_assert_eq!(augment(&input), augment(&input));
        }

        #[test]
        fn rsi_is_bounded(prices in prop::collection::vec(1.0f64..1e6, 15..100)) {
            for value in rsi(&prices, RSI_PERIOD).into_iter().flatten() {
                prop_assert!((0.0..=100.0).contains(&value));
            }
        }
    }
}

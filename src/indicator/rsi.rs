use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices, ratio_oscillator, rolling_mean};
use crate::model::Bar;

/// RSI (Relative Strength Index) using simple rolling means of gains and losses.
///
/// The first bar has no predecessor and counts as a zero change, so the
/// first defined value sits at index `period - 1`.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_values(&self, prices: &[f64]) -> Vec<f64> {
        let (gains, losses) = split_changes(prices);
        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        avg_gain
            .into_iter()
            .zip(avg_loss)
            .map(|(gain, loss)| ratio_oscillator(gain, loss))
            .collect()
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn calculate(&self, bars: &[Bar]) -> Vec<f64> {
        self.calculate_values(&close_prices(bars))
    }
}

/// Positive changes and magnitudes of negative changes, aligned with `prices`.
fn split_changes(prices: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());
    if prices.is_empty() {
        return (gains, losses);
    }

    gains.push(0.0);
    losses.push(0.0);
    for w in prices.windows(2) {
        let delta = w[1] - w[0];
        gains.push(if delta > 0.0 { delta } else { 0.0 });
        losses.push(if delta < 0.0 { -delta } else { 0.0 });
    }
    (gains, losses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::{bars_from_closes, linear_bars};

    #[test]
    fn rsi_period_zero_invalid() {
        assert!(Rsi::new(0).is_err());
    }

    #[test]
    fn rsi_output_is_aligned() {
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.calculate(&bars_from_closes(&[100.0; 20]));
        assert_eq!(values.len(), 20);
        assert!(values[..13].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate(&bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        for v in &values[3..] {
            assert_eq!(*v, 100.0);
        }
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate(&bars_from_closes(&[5.0, 4.0, 3.0, 2.0, 1.0]));
        for v in &values[3..] {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn rsi_constant_prices_is_nan() {
        // gain and loss are both zero: 0/0 propagates as NaN, not 100
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.calculate(&bars_from_closes(&[50.0; 30]));
        assert!(values[14..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_known_value() {
        // changes over the last 3 bars: +2, -1, +1 -> gain 1.0, loss 1/3, RS 3
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate(&bars_from_closes(&[10.0, 10.0, 12.0, 11.0, 12.0]));
        assert!((values[4] - 75.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_14_on_linear_series_is_100() {
        let values = Rsi::new(14).unwrap().calculate(&linear_bars(30));
        assert_eq!(values[29], 100.0);
        for v in &values[14..] {
            assert_eq!(*v, 100.0);
        }
    }

    #[test]
    fn rsi_empty_input() {
        assert!(Rsi::new(14).unwrap().calculate(&[]).is_empty());
    }
}

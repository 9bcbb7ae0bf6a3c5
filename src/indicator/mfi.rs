use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ratio_oscillator, rolling_sum};
use crate::model::Bar;

/// Money Flow Index: a volume-weighted RSI over typical price.
///
/// A bar's money flow is positive when its typical price rises versus the
/// previous bar and negative when it falls. Unchanged bars and the first bar
/// count toward neither side.
pub struct Mfi {
    period: usize,
}

impl Mfi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &str {
        "mfi"
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn calculate(&self, bars: &[Bar]) -> Vec<f64> {
        let typical: Vec<f64> = bars.iter().map(typical_price).collect();

        let mut positive = vec![0.0; bars.len()];
        let mut negative = vec![0.0; bars.len()];
        for i in 1..bars.len() {
            let flow = typical[i] * bars[i].volume;
            if typical[i] > typical[i - 1] {
                positive[i] = flow;
            } else if typical[i] < typical[i - 1] {
                negative[i] = flow;
            }
        }

        rolling_sum(&positive, self.period)
            .into_iter()
            .zip(rolling_sum(&negative, self.period))
            .map(|(pos, neg)| ratio_oscillator(pos, neg))
            .collect()
    }
}

pub fn typical_price(bar: &Bar) -> f64 {
    (bar.high + bar.low + bar.close) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::{bar, linear_bars};

    #[test]
    fn mfi_period_zero_invalid() {
        assert!(Mfi::new(0).is_err());
    }

    #[test]
    fn mfi_rising_typical_price_saturates() {
        let values = Mfi::new(14).unwrap().calculate(&linear_bars(30));
        assert_eq!(values.len(), 30);
        assert!(values[..13].iter().all(|v| v.is_nan()));
        assert!(values[13..].iter().all(|v| *v == 100.0));
    }

    #[test]
    fn mfi_zero_volume_is_nan() {
        let bars: Vec<Bar> = (0..20)
            .map(|i| {
                let c = 10.0 + (i % 3) as f64;
                bar(i, c, c + 1.0, c - 1.0, c, 0.0)
            })
            .collect();
        let values = Mfi::new(14).unwrap().calculate(&bars);
        assert!(values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn mfi_known_value() {
        // typical prices 10, 11, 10, 12 with volume 1 everywhere
        let bars = vec![
            bar(0, 10.0, 10.0, 10.0, 10.0, 1.0),
            bar(1, 11.0, 11.0, 11.0, 11.0, 1.0),
            bar(2, 10.0, 10.0, 10.0, 10.0, 1.0),
            bar(3, 12.0, 12.0, 12.0, 12.0, 1.0),
        ];
        let values = Mfi::new(3).unwrap().calculate(&bars);
        // window 1..=3: positive 11 + 12 = 23, negative 10
        let expected = 100.0 - 100.0 / (1.0 + 23.0 / 10.0);
        assert!((values[3] - expected).abs() < 1e-9);
    }

    #[test]
    fn mfi_unchanged_typical_price_counts_nowhere() {
        let bars = vec![
            bar(0, 10.0, 10.0, 10.0, 10.0, 5.0),
            bar(1, 10.0, 10.0, 10.0, 10.0, 5.0),
            bar(2, 9.0, 9.0, 9.0, 9.0, 1.0),
        ];
        let values = Mfi::new(2).unwrap().calculate(&bars);
        // window 1..=2: positive 0, negative 9 -> 0
        assert!(values[2].abs() < 1e-9);
    }

    #[test]
    fn mfi_empty_input() {
        assert!(Mfi::new(14).unwrap().calculate(&[]).is_empty());
    }
}

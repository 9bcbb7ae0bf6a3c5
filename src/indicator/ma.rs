use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices, rolling_mean};
use crate::model::Bar;

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_values(&self, values: &[f64]) -> Vec<f64> {
        rolling_mean(values, self.period)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn calculate(&self, bars: &[Bar]) -> Vec<f64> {
        self.calculate_values(&close_prices(bars))
    }
}

/// Exponential Moving Average without bias adjustment, the building block of MACD.
///
/// Seeded with the first value, then `ema = alpha * x + (1 - alpha) * ema`
/// with `alpha = 2 / (span + 1)`. Every position is defined.
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, Report<IndicatorError>> {
        if span == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "span must be > 0".into(),
            });
        }
        Ok(Self { span })
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }

    pub fn calculate_values(&self, values: &[f64]) -> Vec<f64> {
        let alpha = self.alpha();
        let mut results = Vec::with_capacity(values.len());
        let mut iter = values.iter();
        let Some(&first) = iter.next() else {
            return results;
        };

        let mut ema = first;
        results.push(ema);
        for &value in iter {
            ema = alpha * value + (1.0 - alpha) * ema;
            results.push(ema);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::test_support::{bars_from_closes, linear_bars};

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_warmup_is_nan() {
        let sma = Sma::new(5).unwrap();
        let values = sma.calculate(&bars_from_closes(&[1.0; 4]));
        assert_eq!(values.len(), 4);
        assert!(values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_known_value() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&bars_from_closes(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(values.len(), 4);
        assert!(values[1].is_nan());
        // (1+2+3)/3 = 2.0, (2+3+4)/3 = 3.0
        assert!((values[2] - 2.0).abs() < 1e-9);
        assert!((values[3] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn sma_20_on_linear_series() {
        let bars = linear_bars(30);
        let values = Sma::new(20).unwrap().calculate(&bars);
        let expected: f64 = bars[10..30].iter().map(|b| b.close).sum::<f64>() / 20.0;
        assert!((values[29] - expected).abs() < 1e-9);
        assert!(values[18].is_nan());
        assert!(!values[19].is_nan());
    }

    #[test]
    fn ema_span_zero_invalid() {
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn ema_seeded_by_first_value() {
        let ema = Ema::new(3).unwrap();
        let values = ema.calculate_values(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(values[0], 1.0);
        // alpha = 0.5
        assert!((values[1] - 1.5).abs() < 1e-12);
        assert!((values[2] - 2.25).abs() < 1e-12);
        assert!((values[3] - 3.125).abs() < 1e-12);
    }

    #[test]
    fn ema_flat_prices() {
        let ema = Ema::new(9).unwrap();
        for v in ema.calculate_values(&[10.0; 6]) {
            assert!((v - 10.0).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(Sma::new(20).unwrap().calculate(&[]).is_empty());
        assert!(Ema::new(12).unwrap().calculate_values(&[]).is_empty());
    }
}

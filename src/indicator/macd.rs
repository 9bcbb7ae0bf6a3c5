use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::ma::Ema;
use crate::indicator::{Indicator, close_prices};
use crate::model::Bar;

pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

/// MACD line, signal line and histogram, each aligned with the input.
#[derive(Debug, Clone, Default)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidParameter {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast: Ema::new(fast_period)?,
            slow: Ema::new(slow_period)?,
            signal: Ema::new(signal_period)?,
        })
    }

    pub fn calculate_full(&self, bars: &[Bar]) -> MacdOutput {
        let prices = close_prices(bars);
        let fast_ema = self.fast.calculate_values(&prices);
        let slow_ema = self.slow.calculate_values(&prices);

        let macd: Vec<f64> = fast_ema
            .iter()
            .zip(&slow_ema)
            .map(|(f, s)| f - s)
            .collect();
        let signal = self.signal.calculate_values(&macd);
        let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

        MacdOutput {
            macd,
            signal,
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn warmup(&self) -> usize {
        0
    }

    /// Returns MACD line values only.
    fn calculate(&self, bars: &[Bar]) -> Vec<f64> {
        self.calculate_full(bars).macd
    }
}

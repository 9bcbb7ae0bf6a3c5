pub mod ma;
pub mod macd;
pub mod mfi;
pub mod pressure;
pub mod rsi;
pub mod sentiment;

use crate::model::Bar;

/// A technical analysis indicator that operates on a slice of bars.
///
/// Bars must be in ascending chronological order (oldest first). The output
/// is aligned 1:1 with the input; positions without enough history are NaN.
/// An empty input yields an empty output.
pub trait Indicator: Send + Sync {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    #[allow(dead_code)]
    fn name(&self) -> &str;

    /// Number of leading positions that are NaN by construction.
    fn warmup(&self) -> usize;

    fn calculate(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Extract close prices from a slice of bars.
pub fn close_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Rolling sum over a full window of `period` values, NaN until the window fills.
pub fn rolling_sum(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for (i, window) in values.windows(period).enumerate() {
        out[i + period - 1] = window.iter().sum();
    }
    out
}

/// Rolling arithmetic mean over a full window of `period` values.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling_sum(values, period)
        .into_iter()
        .map(|s| s / period as f64)
        .collect()
}

/// `100 - 100 / (1 + up / down)` with plain IEEE semantics.
///
/// `down == 0` with `up > 0` saturates at 100; `up == down == 0` is NaN.
pub fn ratio_oscillator(up: f64, down: f64) -> f64 {
    100.0 - 100.0 / (1.0 + up / down)
}

/// Map NaN to `None` for presentation.
pub fn defined(value: f64) -> Option<f64> {
    if value.is_nan() { None } else { Some(value) }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};

    use crate::model::Bar;

    pub fn bar(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
                + Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i, c, c, c, c, 1.0))
            .collect()
    }

    /// Close rising by 1 per bar from 100, open one below close, volume 1000.
    pub fn linear_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                bar(i, close - 1.0, close + 0.5, close - 1.5, close, 1000.0)
            })
            .collect()
    }
}

use chrono::{DateTime, Utc};
use error_stack::Report;
use serde::Serialize;

use crate::config::IndicatorConfig;
use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::macd::Macd;
use crate::indicator::mfi::Mfi;
use crate::indicator::pressure::Pressure;
use crate::indicator::rsi::Rsi;
use crate::indicator::sentiment::{self, SessionChange, Sentiment};
use crate::indicator::{Indicator, defined};
use crate::model::{Bar, Interval, Series};

/// One bar with its derived indicator values. `None` marks a value that is
/// unavailable (warm-up or undefined arithmetic).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
    pub mfi: Option<f64>,
    pub sma: Option<f64>,
    pub pressure: Pressure,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorTable {
    pub symbol: String,
    pub interval: Interval,
    pub rows: Vec<IndicatorRow>,
    pub sentiment: Option<Sentiment>,
    pub session: Option<SessionChange>,
}

impl IndicatorTable {
    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// Last `n` rows, oldest first.
    pub fn tail(&self, n: usize) -> &[IndicatorRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }
}

/// The indicators computed for every series, built once from config.
pub struct IndicatorSet {
    rsi: Rsi,
    macd: Macd,
    mfi: Mfi,
    sma: Sma,
    sentiment_threshold: f64,
}

impl IndicatorSet {
    pub fn new(config: &IndicatorConfig) -> Result<Self, Report<IndicatorError>> {
        Ok(Self {
            rsi: Rsi::new(config.rsi_period)?,
            macd: Macd::new(config.macd_fast, config.macd_slow, config.macd_signal)?,
            mfi: Mfi::new(config.mfi_period)?,
            sma: Sma::new(config.sma_period)?,
            sentiment_threshold: config.sentiment_threshold,
        })
    }

    /// Bars needed before every column has a defined value.
    pub fn warmup(&self) -> usize {
        [
            self.rsi.warmup(),
            self.macd.warmup(),
            self.mfi.warmup(),
            self.sma.warmup(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    pub fn compute(&self, series: &Series) -> IndicatorTable {
        let bars = &series.bars;
        let required = self.warmup();
        if bars.len() < required {
            tracing::debug!(
                symbol = %series.symbol,
                interval = %series.interval,
                available = bars.len(),
                required,
                "series shorter than indicator warm-up"
            );
        }

        IndicatorTable {
            symbol: series.symbol.clone(),
            interval: series.interval,
            rows: self.rows(bars),
            sentiment: sentiment::analyze(bars, self.sentiment_threshold),
            session: sentiment::session_change(bars),
        }
    }

    pub fn rows(&self, bars: &[Bar]) -> Vec<IndicatorRow> {
        let rsi = self.rsi.calculate(bars);
        let macd = self.macd.calculate_full(bars);
        let mfi = self.mfi.calculate(bars);
        let sma = self.sma.calculate(bars);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRow {
                timestamp: bar.timestamp,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                rsi: defined(rsi[i]),
                macd: defined(macd.macd[i]),
                signal: defined(macd.signal[i]),
                histogram: defined(macd.histogram[i]),
                mfi: defined(mfi[i]),
                sma: defined(sma[i]),
                pressure: Pressure::of(bar),
            })
            .collect()
    }
}

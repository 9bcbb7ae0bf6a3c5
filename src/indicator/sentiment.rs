use std::fmt;

use serde::Serialize;

use crate::indicator::close_prices;
use crate::model::Bar;

/// Mean-return threshold separating the three sentiment buckets (0.1%).
pub const DEFAULT_THRESHOLD: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentLabel {
    Bullish,
    Neutral,
    Bearish,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Bearish => write!(f, "Bearish"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: u8,
    pub mean_return: f64,
    /// Sample standard deviation of returns; `None` with a single return.
    pub volatility: Option<f64>,
}

/// Fixed three-bucket classifier over the mean fractional return.
pub fn classify(mean_return: f64, threshold: f64) -> (SentimentLabel, u8) {
    if mean_return > threshold {
        (SentimentLabel::Bullish, 70)
    } else if mean_return < -threshold {
        (SentimentLabel::Bearish, 30)
    } else {
        (SentimentLabel::Neutral, 50)
    }
}

/// Fractional close-to-close returns; one fewer than the number of bars.
pub fn pct_returns(bars: &[Bar]) -> Vec<f64> {
    close_prices(bars)
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Sentiment over the whole series. `None` with fewer than two bars.
pub fn analyze(bars: &[Bar], threshold: f64) -> Option<Sentiment> {
    let returns = pct_returns(bars);
    if returns.is_empty() {
        return None;
    }

    let n = returns.len() as f64;
    let mean_return = returns.iter().sum::<f64>() / n;
    let volatility = (returns.len() > 1).then(|| {
        let var = returns
            .iter()
            .map(|r| (r - mean_return).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        var.sqrt()
    });

    let (label, score) = classify(mean_return, threshold);
    Some(Sentiment {
        label,
        score,
        mean_return,
        volatility,
    })
}

/// Price move across the session and the score derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionChange {
    pub change_pct: f64,
    /// `50 + change_pct`, clamped to `[0, 100]`.
    pub score: f64,
}

pub fn session_change(bars: &[Bar]) -> Option<SessionChange> {
    let first = bars.first()?.close;
    let last = bars.last()?.close;
    let change_pct = (last - first) / first * 100.0;
    Some(SessionChange {
        change_pct,
        score: (50.0 + change_pct).clamp(0.0, 100.0),
    })
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bar interval supported by the dashboard.
///
/// String representations match the provider and config format (e.g. `"1m"`, `"60m"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "30m")]
    Min30,
    #[serde(rename = "60m", alias = "1h")]
    Min60,
    #[serde(rename = "1d")]
    Day1,
}

impl Interval {
    /// Parse a config-format string into an `Interval`. `"1h"` is an alias of `"60m"`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "1m" => Some(Self::Min1),
            "5m" => Some(Self::Min5),
            "15m" => Some(Self::Min15),
            "30m" => Some(Self::Min30),
            "60m" | "1h" => Some(Self::Min60),
            "1d" => Some(Self::Day1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min1 => "1m",
            Self::Min5 => "5m",
            Self::Min15 => "15m",
            Self::Min30 => "30m",
            Self::Min60 => "60m",
            Self::Day1 => "1d",
        }
    }

    /// Lookback range requested from the provider when none is configured.
    ///
    /// The provider caps how far back intraday intervals reach, so finer
    /// intervals ask for shorter ranges.
    pub fn default_range(self) -> &'static str {
        match self {
            Self::Min1 => "1d",
            Self::Min5 | Self::Min15 => "5d",
            Self::Min30 | Self::Min60 => "1mo",
            Self::Day1 => "6mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trim and upper-case free-text symbol input.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Whether a normalized symbol is made only of `A-Z`, `0-9` and `.^=-`.
///
/// Covers tickers like `BRK-B`, `^GSPC`, `EURUSD=X` and `SAP.DE`. Anything
/// else is refused before it reaches a URL or an export file name.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || ".^=-".contains(c))
}

/// One OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Bars for one symbol/interval, ascending by timestamp, as returned by a single fetch.
#[derive(Debug, Clone)]
pub struct Series {
    pub symbol: String,
    pub interval: Interval,
    pub fetched_at: DateTime<Utc>,
    pub bars: Vec<Bar>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_round_trip() {
        let intervals = [
            ("1m", Interval::Min1),
            ("5m", Interval::Min5),
            ("15m", Interval::Min15),
            ("30m", Interval::Min30),
            ("60m", Interval::Min60),
            ("1d", Interval::Day1),
        ];
        for (s, interval) in intervals {
            assert_eq!(Interval::from_str(s), Some(interval));
            assert_eq!(interval.as_str(), s);
        }
    }

    #[test]
    fn one_hour_is_alias_of_sixty_minutes() {
        assert_eq!(Interval::from_str("1h"), Some(Interval::Min60));
        let parsed: Interval = serde_json::from_str("\"1h\"").unwrap();
        assert_eq!(parsed, Interval::Min60);
    }

    #[test]
    fn interval_invalid_string_returns_none() {
        assert_eq!(Interval::from_str("2m"), None);
        assert_eq!(Interval::from_str("4h"), None);
        assert_eq!(Interval::from_str(""), None);
    }

    #[test]
    fn interval_serializes_as_provider_string() {
        assert_eq!(serde_json::to_string(&Interval::Min15).unwrap(), "\"15m\"");
    }

    #[test]
    fn default_range_shrinks_for_fine_intervals() {
        assert_eq!(Interval::Min1.default_range(), "1d");
        assert_eq!(Interval::Min60.default_range(), "1mo");
        assert_eq!(Interval::Day1.default_range(), "6mo");
    }

    #[test]
    fn symbol_is_trimmed_and_upper_cased() {
        assert_eq!(normalize_symbol("  nvda "), "NVDA");
        assert_eq!(normalize_symbol("brk-b"), "BRK-B");
    }

    #[test]
    fn provider_symbols_are_valid() {
        for symbol in ["NVDA", "BRK-B", "^GSPC", "EURUSD=X", "SAP.DE", "BTC-USD"] {
            assert!(is_valid_symbol(symbol), "{symbol}");
        }
    }

    #[test]
    fn url_and_path_characters_are_invalid() {
        let rejected = [
            "", "NVDA?X", "NVDA#X", "../ESCAPE", "A/B", "A\\B", "NV DA", "nvda", "ÄPFEL",
        ];
        for symbol in rejected {
            assert!(!is_valid_symbol(symbol), "{symbol}");
        }
    }
}

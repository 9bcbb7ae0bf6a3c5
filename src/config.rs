use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::indicator::sentiment::DEFAULT_THRESHOLD;
use crate::model::{Interval, is_valid_symbol, normalize_symbol};

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_output_format() -> String {
    "text".into()
}

fn default_tail_rows() -> usize {
    10
}

fn default_precision() -> usize {
    2
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; ticker-intel)".into()
}

fn default_requests_per_second() -> u32 {
    4
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_mfi_period() -> usize {
    14
}

fn default_sma_period() -> usize {
    20
}

fn default_sentiment_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_watchlist() -> Vec<WatchConfig> {
    vec![WatchConfig {
        symbol: "NVDA".into(),
        intervals: vec!["1m".into()],
        range: None,
    }]
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<WatchConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            provider: ProviderConfig::default(),
            indicators: IndicatorConfig::default(),
            watchlist: default_watchlist(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Dashboard output on stdout. Accepted values: `"text"` | `"json"`
    #[serde(default = "default_output_format")]
    pub output_format: String,
    #[serde(default = "default_tail_rows")]
    pub tail_rows: usize,
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// Write `{SYMBOL}_{interval}_indicators.csv` here when set.
    pub export_dir: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            output_format: default_output_format(),
            tail_rows: default_tail_rows(),
            precision: default_precision(),
            export_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_mfi_period")]
    pub mfi_period: usize,
    #[serde(default = "default_sma_period")]
    pub sma_period: usize,
    #[serde(default = "default_sentiment_threshold")]
    pub sentiment_threshold: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            mfi_period: default_mfi_period(),
            sma_period: default_sma_period(),
            sentiment_threshold: default_sentiment_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub symbol: String,
    pub intervals: Vec<String>,
    /// Provider lookback range; defaults per interval when omitted.
    pub range: Option<String>,
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let mut config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    normalize(&mut config);
    validate(&config)?;

    Ok(config)
}

/// Upper-case watchlist symbols so lookups and export names are consistent.
pub fn normalize(config: &mut AppConfig) {
    for watch in &mut config.watchlist {
        watch.symbol = normalize_symbol(&watch.symbol);
    }
}

const VALID_FORMATS: &[&str] = &["text", "json"];

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_formats(config)?;
    validate_provider(config)?;
    validate_indicators(&config.indicators)?;
    validate_watchlist(config)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_formats(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let general = &config.general;
    if !VALID_FORMATS.contains(&general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not valid",
            general.log_format
        )));
    }
    if !VALID_FORMATS.contains(&general.output_format.as_str()) {
        return Err(invalid(format!(
            "general.output_format \"{}\" is not valid",
            general.output_format
        )));
    }
    Ok(())
}

fn validate_provider(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.provider.requests_per_second == 0 {
        return Err(invalid("provider.requests_per_second must be > 0".into()));
    }
    if config.provider.base_url.trim().is_empty() {
        return Err(invalid("provider.base_url must not be empty".into()));
    }
    Ok(())
}

pub fn validate_indicators(indicators: &IndicatorConfig) -> Result<(), Report<ConfigError>> {
    let periods = [
        ("rsi_period", indicators.rsi_period),
        ("macd_fast", indicators.macd_fast),
        ("macd_slow", indicators.macd_slow),
        ("macd_signal", indicators.macd_signal),
        ("mfi_period", indicators.mfi_period),
        ("sma_period", indicators.sma_period),
    ];
    for (name, period) in periods {
        if period == 0 {
            return Err(invalid(format!("indicators.{name} must be > 0")));
        }
    }

    if indicators.macd_fast >= indicators.macd_slow {
        return Err(invalid(format!(
            "indicators.macd_fast ({}) must be < macd_slow ({})",
            indicators.macd_fast, indicators.macd_slow
        )));
    }

    let threshold = indicators.sentiment_threshold;
    if threshold.is_nan() || threshold < 0.0 {
        return Err(invalid(
            "indicators.sentiment_threshold must be a non-negative number".into(),
        ));
    }
    Ok(())
}

fn validate_watchlist(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    for watch in &config.watchlist {
        if watch.symbol.is_empty() {
            return Err(invalid("watchlist: symbol must not be empty".into()));
        }
        if !is_valid_symbol(&watch.symbol) {
            return Err(invalid(format!(
                "watchlist: symbol \"{}\" may only contain A-Z, 0-9 and .^=-",
                watch.symbol
            )));
        }
        if watch.intervals.is_empty() {
            return Err(invalid(format!(
                "watchlist[symbol={}].intervals must not be empty",
                watch.symbol
            )));
        }
        for interval in &watch.intervals {
            if Interval::from_str(interval).is_none() {
                return Err(invalid(format!(
                    "watchlist[symbol={}].intervals: unknown interval \"{}\"",
                    watch.symbol, interval
                )));
            }
        }
    }
    Ok(())
}

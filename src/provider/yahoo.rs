use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::model::{Bar, Interval, Series};
use crate::provider::MarketDataProvider;

const PROVIDER_NAME: &str = "yahoo";

/// Yahoo Finance chart API client.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, Report<ProviderError>> {
        let per_second =
            NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(4u32));
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .change_context(ProviderError::Client {
                provider: PROVIDER_NAME.into(),
            })?;
        let base_url = Url::parse(&config.base_url)
            .change_context(ProviderError::Client {
                provider: PROVIDER_NAME.into(),
            })
            .attach_with(|| format!("base_url: {}", config.base_url))?;

        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        })
    }

    async fn request_chart(
        &self,
        symbol: &str,
        interval: Interval,
        range: &str,
    ) -> Result<ChartData, Report<ProviderError>> {
        self.rate_limiter.until_ready().await;

        let url = self.chart_url(symbol)?;
        let params = [("interval", interval.as_str()), ("range", range)];
        debug!(url = %url, interval = %interval, range, "requesting chart");

        let response = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .change_context(request_error())?;

        let status = response.status();
        let body = response.text().await.change_context(request_error())?;

        if !status.is_success() {
            // Unknown symbols come back as 404 with an error object in the body
            let api_error = serde_json::from_str::<ChartEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.chart.error);
            return Err(match api_error {
                Some(error) => error.into_report(),
                None => Report::new(request_error()).attach(format!("HTTP status: {status}")),
            });
        }

        let envelope: ChartEnvelope =
            serde_json::from_str(&body).change_context(ProviderError::ResponseParse {
                provider: PROVIDER_NAME.into(),
            })?;

        if let Some(error) = envelope.chart.error {
            return Err(error.into_report());
        }

        Ok(envelope
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .unwrap_or_default())
    }

    /// `{base_url}/v8/finance/chart/{symbol}` with the symbol as one
    /// percent-encoded path segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, Report<ProviderError>> {
        let mut url = self.base_url.clone();
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments
                    .pop_if_empty()
                    .extend(["v8", "finance", "chart", symbol]);
            }
            Err(()) => {
                return Err(Report::new(request_error())
                    .attach(format!("base_url cannot carry a path: {}", self.base_url)));
            }
        }
        Ok(url)
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        range: &str,
    ) -> BoxFuture<'_, Result<Series, Report<ProviderError>>> {
        let symbol = symbol.to_owned();
        let range = range.to_owned();
        Box::pin(async move {
            let chart = self
                .request_chart(&symbol, interval, &range)
                .await
                .attach_with(|| format!("symbol: {symbol}, interval: {interval}, range: {range}"))?;
            let bars = chart.into_bars();

            info!(
                symbol = %symbol,
                interval = %interval,
                fetched = bars.len(),
                "yahoo chart fetch complete"
            );

            Ok(Series {
                symbol,
                interval,
                fetched_at: Utc::now(),
                bars,
            })
        })
    }
}

fn request_error() -> ProviderError {
    ProviderError::Request {
        provider: PROVIDER_NAME.into(),
    }
}

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl ChartError {
    fn into_report(self) -> Report<ProviderError> {
        let report = Report::new(ProviderError::Api {
            provider: PROVIDER_NAME.into(),
            code: self.code,
        });
        match self.description {
            Some(description) => report.attach(description),
            None => report,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChartData {
    /// Absent when the symbol has no bars in the requested range.
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

/// Column-oriented OHLCV; entries are `null` for bars without trades.
#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartData {
    /// Zip the columns into bars, ascending and unique by timestamp.
    ///
    /// Rows missing any price are dropped; a missing volume counts as zero.
    fn into_bars(self) -> Vec<Bar> {
        let Some(quote) = self.indicators.quote.into_iter().next() else {
            return Vec::new();
        };
        let at = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

        let mut bars: Vec<Bar> = self
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                Some(Bar {
                    timestamp: DateTime::from_timestamp(ts, 0)?,
                    open: at(&quote.open, i)?,
                    high: at(&quote.high, i)?,
                    low: at(&quote.low, i)?,
                    close: at(&quote.close, i)?,
                    volume: at(&quote.volume, i).unwrap_or(0.0),
                })
            })
            .collect();

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        bars
    }
}

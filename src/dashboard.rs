use std::sync::Arc;

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use serde::Serialize;
use tracing::info;

use crate::analysis::{IndicatorRow, IndicatorSet, IndicatorTable};
use crate::error::DashboardError;
use crate::indicator::pressure::Pressure;
use crate::model::{Interval, normalize_symbol};
use crate::provider::MarketDataProvider;

/// One symbol/interval to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    pub symbol: String,
    pub interval: Interval,
    /// Provider lookback range; `None` uses the interval default.
    pub range: Option<String>,
}

impl DashboardRequest {
    pub fn new(symbol: &str, interval: Interval) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            interval,
            range: None,
        }
    }

    pub fn with_range(mut self, range: Option<String>) -> Self {
        self.range = range;
        self
    }

    pub fn range(&self) -> &str {
        self.range
            .as_deref()
            .unwrap_or_else(|| self.interval.default_range())
    }
}

/// Everything the presentation layer needs for one symbol/interval.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub fetched_at: DateTime<Utc>,
    pub table: IndicatorTable,
}

/// Latest-value metrics. `None` marks an unavailable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestMetrics {
    pub price: f64,
    /// Percent change from the first bar in the series.
    pub change_pct: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub mfi: Option<f64>,
    pub sma: Option<f64>,
    pub pressure: Pressure,
}

/// Column-oriented series for candlestick/line charts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub sma: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub mfi: Vec<Option<f64>>,
}

impl Dashboard {
    pub fn symbol(&self) -> &str {
        &self.table.symbol
    }

    pub fn interval(&self) -> Interval {
        self.table.interval
    }

    pub fn latest_metrics(&self) -> Option<LatestMetrics> {
        let last = self.table.latest()?;
        Some(LatestMetrics {
            price: last.close,
            change_pct: self.table.session.as_ref().map(|s| s.change_pct),
            rsi: last.rsi,
            macd: last.macd,
            signal: last.signal,
            mfi: last.mfi,
            sma: last.sma,
            pressure: last.pressure,
        })
    }

    pub fn tail(&self, n: usize) -> &[IndicatorRow] {
        self.table.tail(n)
    }

    pub fn chart_series(&self) -> ChartSeries {
        let mut chart = ChartSeries::default();
        for row in &self.table.rows {
            chart.timestamps.push(row.timestamp);
            chart.open.push(row.open);
            chart.high.push(row.high);
            chart.low.push(row.low);
            chart.close.push(row.close);
            chart.sma.push(row.sma);
            chart.rsi.push(row.rsi);
            chart.macd.push(row.macd);
            chart.signal.push(row.signal);
            chart.mfi.push(row.mfi);
        }
        chart
    }
}

/// Fetch one series and derive its dashboard.
///
/// An empty series is reported as `DashboardError::NoData` so callers can warn
/// and move on.
pub async fn build(
    provider: &dyn MarketDataProvider,
    indicators: &IndicatorSet,
    request: &DashboardRequest,
) -> Result<Dashboard, Report<DashboardError>> {
    let series = provider
        .fetch_series(&request.symbol, request.interval, request.range())
        .await
        .change_context_lazy(|| DashboardError::Fetch {
            symbol: request.symbol.clone(),
            interval: request.interval.to_string(),
        })?;

    if series.is_empty() {
        return Err(Report::new(DashboardError::NoData {
            symbol: request.symbol.clone(),
            interval: request.interval.to_string(),
        })
        .attach(format!("provider: {}, range: {}", provider.name(), request.range())));
    }

    let table = indicators.compute(&series);
    info!(
        symbol = %request.symbol,
        interval = %request.interval,
        rows = table.rows.len(),
        "indicators computed"
    );

    Ok(Dashboard {
        fetched_at: series.fetched_at,
        table,
    })
}

pub struct JobOutcome {
    pub request: DashboardRequest,
    pub result: Result<Dashboard, Report<DashboardError>>,
}

/// Build every requested dashboard concurrently, returning outcomes in request order.
///
/// The provider paces its own requests, so all jobs are spawned at once. A
/// failure in one job never affects the others.
pub async fn build_all(
    provider: Arc<dyn MarketDataProvider>,
    indicators: Arc<IndicatorSet>,
    requests: Vec<DashboardRequest>,
) -> Vec<JobOutcome> {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let provider = Arc::clone(&provider);
            let indicators = Arc::clone(&indicators);
            let job = request.clone();
            let handle = tokio::spawn(async move {
                build(provider.as_ref(), indicators.as_ref(), &job).await
            });
            (request, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (request, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(Report::new(e).change_context(DashboardError::Task {
                symbol: request.symbol.clone(),
                interval: request.interval.to_string(),
            })),
        };
        outcomes.push(JobOutcome { request, result });
    }
    outcomes
}

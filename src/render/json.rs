use std::io::Write;

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::analysis::IndicatorRow;
use crate::dashboard::{ChartSeries, Dashboard, DashboardRequest, LatestMetrics};
use crate::error::RenderError;
use crate::indicator::sentiment::{SessionChange, Sentiment};
use crate::model::Interval;
use crate::render::{RenderConfig, Renderer};

/// One JSON document per line, for piping into other tools.
///
/// Every row is emitted in the chart series; `tail` repeats the last rows
/// with the full indicator schema.
pub struct JsonRenderer {
    config: RenderConfig,
}

impl JsonRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }
}

#[derive(Serialize)]
struct DashboardView<'a> {
    symbol: &'a str,
    interval: Interval,
    fetched_at: DateTime<Utc>,
    latest: Option<LatestMetrics>,
    sentiment: Option<&'a Sentiment>,
    session: Option<&'a SessionChange>,
    tail: &'a [IndicatorRow],
    chart: ChartSeries,
}

#[derive(Serialize)]
struct UnavailableView<'a> {
    symbol: &'a str,
    interval: Interval,
    error: &'a str,
}

fn write_line<T: Serialize>(value: &T, out: &mut dyn Write) -> Result<(), Report<RenderError>> {
    let mut line = serde_json::to_vec(value).change_context(RenderError::Serialize)?;
    line.push(b'\n');
    out.write_all(&line).change_context(RenderError::Write)
}

impl Renderer for JsonRenderer {
    fn render(&self, dashboard: &Dashboard, out: &mut dyn Write) -> Result<(), Report<RenderError>> {
        let view = DashboardView {
            symbol: dashboard.symbol(),
            interval: dashboard.interval(),
            fetched_at: dashboard.fetched_at,
            latest: dashboard.latest_metrics(),
            sentiment: dashboard.table.sentiment.as_ref(),
            session: dashboard.table.session.as_ref(),
            tail: dashboard.tail(self.config.tail_rows),
            chart: dashboard.chart_series(),
        };
        write_line(&view, out)
    }

    fn render_unavailable(
        &self,
        request: &DashboardRequest,
        reason: &str,
        out: &mut dyn Write,
    ) -> Result<(), Report<RenderError>> {
        write_line(
            &UnavailableView {
                symbol: &request.symbol,
                interval: request.interval,
                error: reason,
            },
            out,
        )
    }
}

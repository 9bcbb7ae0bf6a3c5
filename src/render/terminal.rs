use std::io::Write;

use error_stack::{Report, ResultExt};

use crate::analysis::IndicatorRow;
use crate::dashboard::{Dashboard, DashboardRequest, LatestMetrics};
use crate::error::RenderError;
use crate::render::{RenderConfig, Renderer, UNAVAILABLE, fmt_opt};

/// Plain-text dashboard for a terminal.
pub struct TerminalRenderer {
    config: RenderConfig,
}

impl TerminalRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn metric_lines(&self, latest: &LatestMetrics) -> Vec<String> {
        let p = self.config.precision;
        let change = latest
            .change_pct
            .map(|c| format!(" ({c:+.2}%)"))
            .unwrap_or_default();
        vec![
            format!("  {:<10} ${:.p$}{}", "Price", latest.price, change),
            format!("  {:<10} {}", "RSI", fmt_opt(latest.rsi, p)),
            format!(
                "  {:<10} {} / signal {}",
                "MACD",
                fmt_opt(latest.macd, p),
                fmt_opt(latest.signal, p)
            ),
            format!("  {:<10} {}", "MFI", fmt_opt(latest.mfi, p)),
            format!("  {:<10} {}", "SMA", fmt_opt(latest.sma, p)),
            format!("  {:<10} {}", "Pressure", latest.pressure),
        ]
    }

    fn table_lines(&self, rows: &[IndicatorRow]) -> Vec<String> {
        let p = self.config.precision;
        let mut lines = vec![format!(
            "  {:<20} {:>12} {:>8} {:>10} {:>10} {:>8} {:>12} {:>4}",
            "timestamp", "close", "rsi", "macd", "signal", "mfi", "sma", "pr"
        )];
        for row in rows {
            lines.push(format!(
                "  {:<20} {:>12.p$} {:>8} {:>10} {:>10} {:>8} {:>12} {:>4}",
                row.timestamp.format("%Y-%m-%d %H:%M"),
                row.close,
                fmt_opt(row.rsi, p),
                fmt_opt(row.macd, p),
                fmt_opt(row.signal, p),
                fmt_opt(row.mfi, p),
                fmt_opt(row.sma, p),
                row.pressure,
            ));
        }
        lines
    }

    pub fn lines(&self, dashboard: &Dashboard) -> Vec<String> {
        let mut lines = vec![format!(
            "== {} ({}) · {} bars · fetched {} ==",
            dashboard.symbol(),
            dashboard.interval(),
            dashboard.table.rows.len(),
            dashboard.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )];

        if let Some(latest) = dashboard.latest_metrics() {
            lines.extend(self.metric_lines(&latest));
        }

        match &dashboard.table.sentiment {
            Some(s) => lines.push(format!(
                "  {:<10} {} (score {}) · mean return {:+.3}% · volatility {}",
                "Sentiment",
                s.label,
                s.score,
                s.mean_return * 100.0,
                s.volatility
                    .map(|v| format!("{:.3}%", v * 100.0))
                    .unwrap_or_else(|| UNAVAILABLE.to_owned()),
            )),
            None => lines.push(format!("  {:<10} {}", "Sentiment", UNAVAILABLE)),
        }
        if let Some(session) = &dashboard.table.session {
            lines.push(format!("  {:<10} {:.0}/100", "Momentum", session.score));
        }

        let tail = dashboard.tail(self.config.tail_rows);
        if !tail.is_empty() {
            lines.push(String::new());
            lines.push(format!("  Last {} bars", tail.len()));
            lines.extend(self.table_lines(tail));
        }
        lines
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, dashboard: &Dashboard, out: &mut dyn Write) -> Result<(), Report<RenderError>> {
        let mut text = self.lines(dashboard).join("\n");
        text.push_str("\n\n");
        out.write_all(text.as_bytes())
            .change_context(RenderError::Write)
    }

    fn render_unavailable(
        &self,
        request: &DashboardRequest,
        reason: &str,
        out: &mut dyn Write,
    ) -> Result<(), Report<RenderError>> {
        writeln!(
            out,
            "== {} ({}) ==\n  {reason}\n",
            request.symbol, request.interval
        )
        .change_context(RenderError::Write)
    }
}

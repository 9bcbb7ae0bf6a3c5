pub mod json;
pub mod terminal;

use std::io::Write;

use error_stack::Report;

use crate::dashboard::{Dashboard, DashboardRequest};
use crate::error::RenderError;

/// Marker shown in place of an indicator value that is not available.
pub const UNAVAILABLE: &str = "n/a";

/// Presentation settings passed explicitly to every renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Number of most recent rows in the indicator table.
    pub tail_rows: usize,
    /// Decimal places for prices and indicator values.
    pub precision: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tail_rows: 10,
            precision: 2,
        }
    }
}

/// Sink for rendered dashboards.
pub trait Renderer: Send + Sync {
    fn render(&self, dashboard: &Dashboard, out: &mut dyn Write) -> Result<(), Report<RenderError>>;

    /// Report a request that produced no dashboard (no data or a failed fetch).
    fn render_unavailable(
        &self,
        request: &DashboardRequest,
        reason: &str,
        out: &mut dyn Write,
    ) -> Result<(), Report<RenderError>>;
}

pub fn build_renderer(format: &str, config: RenderConfig) -> Box<dyn Renderer> {
    match format {
        "json" => Box::new(json::JsonRenderer::new(config)),
        _ => Box::new(terminal::TerminalRenderer::new(config)),
    }
}

/// Format an optional value with `precision` decimals, or the unavailable marker.
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => UNAVAILABLE.to_owned(),
    }
}

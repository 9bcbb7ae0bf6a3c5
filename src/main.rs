mod analysis;
mod config;
mod dashboard;
mod error;
mod export;
mod indicator;
mod model;
mod provider;
mod render;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use analysis::IndicatorSet;
use config::AppConfig;
use dashboard::{DashboardRequest, JobOutcome};
use error::DashboardError;
use model::{Interval, is_valid_symbol};
use provider::MarketDataProvider;
use provider::yahoo::YahooProvider;
use render::{RenderConfig, Renderer};

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("provider setup error")]
    Provider,
    #[display("output error")]
    Render,
}

#[derive(Parser)]
#[command(
    name = "ticker-intel",
    about = "Intraday stock indicators (RSI, MACD, MFI, SMA, pressure, sentiment)"
)]
struct Cli {
    /// Path to a TOML configuration file; built-in defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Symbol to analyze (repeatable); replaces the configured watchlist
    #[arg(short = 's', long = "symbol")]
    symbols: Vec<String>,

    /// Interval (repeatable): 1m, 5m, 15m, 30m, 60m (or 1h), 1d
    #[arg(short = 'i', long = "interval", value_parser = parse_interval)]
    intervals: Vec<Interval>,

    /// Provider lookback range (e.g. 1d, 5d, 1mo); defaults per interval
    #[arg(long)]
    range: Option<String>,

    /// Dashboard output format
    #[arg(long, value_parser = ["text", "json"])]
    format: Option<String>,

    /// Directory for CSV exports of the full indicator table
    #[arg(long)]
    export: Option<PathBuf>,

    /// Number of most recent rows in the indicator table
    #[arg(long)]
    tail: Option<usize>,
}

fn parse_interval(s: &str) -> Result<Interval, String> {
    Interval::from_str(s).ok_or_else(|| format!("unknown interval \"{s}\""))
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => config::load(path).change_context(AppError::Config)?,
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &cli);

    init_tracing(&config);

    let requests = build_requests(&cli, &config);
    if requests.is_empty() {
        warn!("no symbols requested; nothing to do");
        return Ok(());
    }

    let indicators = Arc::new(
        IndicatorSet::new(&config.indicators).change_context(AppError::Config)?,
    );
    let provider: Arc<dyn MarketDataProvider> = Arc::new(
        YahooProvider::new(&config.provider).change_context(AppError::Provider)?,
    );

    info!(jobs = requests.len(), provider = provider.name(), "fetching market data");
    let outcomes = dashboard::build_all(provider, indicators, requests).await;

    let render_config = RenderConfig {
        tail_rows: config.general.tail_rows,
        precision: config.general.precision,
    };
    let renderer = render::build_renderer(&config.general.output_format, render_config);
    let export_dir = config.general.export_dir.as_deref().map(Path::new);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut rendered = 0usize;
    for outcome in &outcomes {
        if present(outcome, renderer.as_ref(), export_dir, &mut out)? {
            rendered += 1;
        }
    }
    out.flush().change_context(AppError::Render)?;

    info!(
        rendered,
        unavailable = outcomes.len() - rendered,
        "dashboard complete"
    );
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(format) = &cli.format {
        config.general.output_format = format.clone();
    }
    if let Some(dir) = &cli.export {
        config.general.export_dir = Some(dir.display().to_string());
    }
    if let Some(tail) = cli.tail {
        config.general.tail_rows = tail;
    }
}

/// CLI symbols replace the watchlist; CLI intervals and range override the
/// configured ones. Duplicate symbol/interval pairs are fetched once.
fn build_requests(cli: &Cli, config: &AppConfig) -> Vec<DashboardRequest> {
    let candidates: Vec<DashboardRequest> = if cli.symbols.is_empty() {
        config
            .watchlist
            .iter()
            .flat_map(|watch| {
                let intervals: Vec<Interval> = if cli.intervals.is_empty() {
                    watch
                        .intervals
                        .iter()
                        .filter_map(|i| Interval::from_str(i))
                        .collect()
                } else {
                    cli.intervals.clone()
                };
                let range = cli.range.clone().or_else(|| watch.range.clone());
                intervals.into_iter().map(move |interval| {
                    DashboardRequest::new(&watch.symbol, interval).with_range(range.clone())
                })
            })
            .collect()
    } else {
        let intervals = if cli.intervals.is_empty() {
            vec![Interval::Min1]
        } else {
            cli.intervals.clone()
        };
        cli.symbols
            .iter()
            .flat_map(|symbol| {
                intervals.iter().map(|&interval| {
                    DashboardRequest::new(symbol, interval).with_range(cli.range.clone())
                })
            })
            .collect()
    };

    let mut requests: Vec<DashboardRequest> = Vec::with_capacity(candidates.len());
    for request in candidates {
        if !is_valid_symbol(&request.symbol) {
            warn!(symbol = %request.symbol, "skipping invalid symbol");
            continue;
        }
        let duplicate = requests
            .iter()
            .any(|r| r.symbol == request.symbol && r.interval == request.interval);
        if !duplicate {
            requests.push(request);
        }
    }
    requests
}

/// Render one outcome. Returns whether a dashboard was rendered.
///
/// Fetch failures and empty series are reported per request and never abort
/// the remaining ones; only a broken output stream does.
fn present(
    outcome: &JobOutcome,
    renderer: &dyn Renderer,
    export_dir: Option<&Path>,
    out: &mut dyn Write,
) -> Result<bool, Report<AppError>> {
    let request = &outcome.request;
    match &outcome.result {
        Ok(dashboard) => {
            renderer
                .render(dashboard, out)
                .change_context(AppError::Render)?;

            if let Some(dir) = export_dir {
                match export::export_to_dir(&dashboard.table, dir) {
                    Ok(path) => info!(path = %path.display(), "indicator table exported"),
                    Err(e) => warn!(error = ?e, symbol = %request.symbol, "csv export failed"),
                }
            }
            Ok(true)
        }
        Err(report) => {
            let reason = match report.current_context() {
                DashboardError::NoData { .. } => {
                    warn!(
                        symbol = %request.symbol,
                        interval = %request.interval,
                        "no data found"
                    );
                    "No data found. Try another symbol.".to_owned()
                }
                other => {
                    error!(error = ?report, "dashboard unavailable");
                    format!("Error fetching data: {other}")
                }
            };
            renderer
                .render_unavailable(request, &reason, out)
                .change_context(AppError::Render)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;
    use crate::dashboard::tests::sample_dashboard;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["ticker-intel"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cli_symbols_default_to_one_minute() {
        let requests = build_requests(&cli(&["-s", "nvda", "-s", "aapl"]), &AppConfig::default());
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].symbol, "NVDA");
        assert_eq!(requests[1].symbol, "AAPL");
        assert!(requests.iter().all(|r| r.interval == Interval::Min1));
    }

    #[test]
    fn cli_symbols_cross_intervals() {
        let requests = build_requests(
            &cli(&["-s", "msft", "-i", "5m", "-i", "1h", "--range", "5d"]),
            &AppConfig::default(),
        );
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].interval, Interval::Min60);
        assert!(requests.iter().all(|r| r.range() == "5d"));
    }

    #[test]
    fn watchlist_used_without_cli_symbols() {
        let mut config = AppConfig::default();
        config.watchlist = vec![
            WatchConfig {
                symbol: "TSLA".into(),
                intervals: vec!["1m".into(), "1d".into()],
                range: Some("5d".into()),
            },
            WatchConfig {
                symbol: "AMD".into(),
                intervals: vec!["15m".into()],
                range: None,
            },
        ];
        let requests = build_requests(&cli(&[]), &config);
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].interval, Interval::Day1);
        assert_eq!(requests[1].range(), "5d");
        assert_eq!(requests[2].range(), "5d"); // 15m default
    }

    #[test]
    fn duplicate_and_blank_symbols_are_dropped() {
        let requests = build_requests(
            &cli(&["-s", "nvda", "-s", "NVDA ", "-s", "  "]),
            &AppConfig::default(),
        );
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn symbols_with_url_or_path_characters_are_skipped() {
        let requests = build_requests(
            &cli(&["-s", "NVDA?X", "-s", "../escape", "-s", "a/b", "-s", "brk-b"]),
            &AppConfig::default(),
        );
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].symbol, "BRK-B");
    }

    #[test]
    fn unknown_interval_rejected_by_cli() {
        assert!(Cli::try_parse_from(["ticker-intel", "-i", "2h"]).is_err());
        assert!(Cli::try_parse_from(["ticker-intel", "--format", "html"]).is_err());
    }

    #[test]
    fn overrides_apply_to_config() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            &cli(&["--format", "json", "--tail", "3", "--export", "out"]),
        );
        assert_eq!(config.general.output_format, "json");
        assert_eq!(config.general.tail_rows, 3);
        assert_eq!(config.general.export_dir.as_deref(), Some("out"));
    }

    #[test]
    fn failed_outcome_renders_warning_and_continues() {
        let renderer = render::build_renderer("text", RenderConfig::default());
        let outcomes = vec![
            JobOutcome {
                request: DashboardRequest::new("ZZZZ", Interval::Min1),
                result: Err(Report::new(DashboardError::NoData {
                    symbol: "ZZZZ".into(),
                    interval: "1m".into(),
                })),
            },
            JobOutcome {
                request: DashboardRequest::new("NVDA", Interval::Min5),
                result: Ok(sample_dashboard(30)),
            },
        ];

        let mut buf = Vec::new();
        let rendered: Vec<bool> = outcomes
            .iter()
            .map(|o| present(o, renderer.as_ref(), None, &mut buf).unwrap())
            .collect();
        assert_eq!(rendered, vec![false, true]);

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("No data found. Try another symbol."));
        assert!(text.contains("== NVDA (5m)"));
    }

    #[test]
    fn successful_outcome_is_exported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = render::build_renderer("json", RenderConfig::default());
        let outcome = JobOutcome {
            request: DashboardRequest::new("NVDA", Interval::Min5),
            result: Ok(sample_dashboard(30)),
        };
        let mut buf = Vec::new();
        assert!(present(&outcome, renderer.as_ref(), Some(dir.path()), &mut buf).unwrap());
        assert!(dir.path().join("NVDA_5m_indicators.csv").exists());
    }
}

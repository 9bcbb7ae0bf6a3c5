use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};

use crate::analysis::IndicatorTable;
use crate::error::ExportError;
use crate::model::{Interval, is_valid_symbol};

const HEADER: [&str; 13] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "rsi",
    "macd",
    "signal",
    "histogram",
    "mfi",
    "sma",
    "pressure",
];

/// Export file name for a symbol and interval, e.g. `NVDA_5m_indicators.csv`.
pub fn file_name(symbol: &str, interval: Interval) -> String {
    format!("{symbol}_{interval}_indicators.csv")
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write the full indicator table as CSV. Unavailable values are empty cells.
pub fn write_csv<W: Write>(table: &IndicatorTable, writer: W) -> Result<(), Report<ExportError>> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(HEADER)
        .change_context(ExportError::Write)?;

    for row in &table.rows {
        writer
            .write_record([
                row.timestamp.to_rfc3339(),
                row.open.to_string(),
                row.high.to_string(),
                row.low.to_string(),
                row.close.to_string(),
                row.volume.to_string(),
                cell(row.rsi),
                cell(row.macd),
                cell(row.signal),
                cell(row.histogram),
                cell(row.mfi),
                cell(row.sma),
                row.pressure.sign().to_string(),
            ])
            .change_context(ExportError::Write)
            .attach_with(|| format!("row: {}", row.timestamp))?;
    }

    writer.flush().change_context(ExportError::Write)?;
    Ok(())
}

/// Write `table` into `dir` and return the created path.
///
/// Symbols outside `A-Z0-9.^=-` are refused so the file always lands inside `dir`.
pub fn export_to_dir(table: &IndicatorTable, dir: &Path) -> Result<PathBuf, Report<ExportError>> {
    if !is_valid_symbol(&table.symbol) {
        return Err(Report::new(ExportError::Create)
            .attach(format!("symbol not usable as a file name: {:?}", table.symbol)));
    }

    std::fs::create_dir_all(dir)
        .change_context(ExportError::Create)
        .attach_with(|| format!("dir: {}", dir.display()))?;

    let path = dir.join(file_name(&table.symbol, table.interval));
    let file = File::create(&path)
        .change_context(ExportError::Create)
        .attach_with(|| format!("path: {}", path.display()))?;

    write_csv(table, file).attach_with(|| format!("path: {}", path.display()))?;
    Ok(path)
}

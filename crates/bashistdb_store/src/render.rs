//! Text rendering of query results.

use crate::error::StoreResult;
use crate::types::{CommandFrequency, HistoryRecord};
use bashistdb_protocol::OutputFormat;
use chrono::{DateTime, FixedOffset};

/// Plain output when nothing matched.
pub const NO_MATCHES: &str = "No matching commands.";

const PLAIN_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S %z";

fn plain_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format(PLAIN_TIMESTAMP).to_string()
}

/// Renders history records in `format`.
///
/// Restore output is what bash reads back with `history -r`: a `#<epoch>`
/// line before each command, with no newline after the last one.
pub fn render_records(rows: &[HistoryRecord], format: OutputFormat) -> StoreResult<String> {
    let text = match format {
        OutputFormat::Plain if rows.is_empty() => NO_MATCHES.to_string(),
        OutputFormat::Plain => rows
            .iter()
            .map(|r| {
                format!(
                    "{} {}@{} {}",
                    plain_timestamp(&r.timestamp),
                    r.user,
                    r.host,
                    r.command
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Restore => rows
            .iter()
            .map(|r| format!("#{}\n{}", r.timestamp.timestamp(), r.command))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
    };
    Ok(text)
}

/// Renders command frequencies in `format`.
///
/// In restore format each command is stamped with its latest occurrence.
pub fn render_frequencies(
    rows: &[CommandFrequency],
    format: OutputFormat,
) -> StoreResult<String> {
    let text = match format {
        OutputFormat::Plain if rows.is_empty() => NO_MATCHES.to_string(),
        OutputFormat::Plain => rows
            .iter()
            .map(|r| format!("{}: {}", r.count, r.command))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Restore => rows
            .iter()
            .map(|r| format!("#{}\n{}", r.last_seen.timestamp(), r.command))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
    };
    Ok(text)
}

/// The frequency half of the stats report.
pub fn top_k_report(k: u32, rows: &[CommandFrequency]) -> String {
    let mut out = format!("Top-{k} commands:");
    for row in rows {
        out.push_str(&format!("\n{}: {}", row.count, row.command));
    }
    out
}

/// The recency half of the stats report.
pub fn last_k_report(k: u32, rows: &[HistoryRecord]) -> String {
    let mut out = format!("Last {k} commands:");
    for row in rows {
        out.push_str(&format!("\n{} {}", plain_timestamp(&row.timestamp), row.command));
    }
    out
}

//! Read-only queries over stored history.

use crate::error::StoreResult;
use crate::render;
use crate::store::Store;
use crate::types::{CommandFrequency, HistoryRecord};
use bashistdb_protocol::{QueryOrder, QueryParams};
use rusqlite::{params, Row};
use tracing::debug;

/// Rows in the frequency half of the stats report.
pub const STATS_TOP_K: u32 = 20;

/// Rows in the recency half of the stats report.
pub const STATS_LAST_K: u32 = 10;

const FILTER: &str = "user LIKE ?1 ESCAPE '\\' \
     AND host LIKE ?2 ESCAPE '\\' \
     AND command LIKE ?3 ESCAPE '\\'";

/// SQLite treats a negative LIMIT as no limit.
fn sql_limit(limit: u32) -> i64 {
    if limit == 0 {
        -1
    } else {
        i64::from(limit)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        user: row.get(0)?,
        host: row.get(1)?,
        command: row.get(2)?,
        timestamp: row.get(3)?,
    })
}

impl Store {
    /// Most frequent matching commands, most frequent first.
    ///
    /// Ties are broken by the most recent occurrence.
    pub fn top_k(&self, params: &QueryParams) -> StoreResult<Vec<CommandFrequency>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT command, COUNT(*) AS count, datetime, MAX(julianday(datetime)) AS latest \
             FROM history WHERE {FILTER} \
             GROUP BY command \
             ORDER BY count DESC, latest DESC, command ASC \
             LIMIT ?4"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    params.user,
                    params.host,
                    params.command,
                    sql_limit(params.limit)
                ],
                |row| {
                    let count: i64 = row.get(1)?;
                    Ok(CommandFrequency {
                        command: row.get(0)?,
                        count: u64::try_from(count).unwrap_or_default(),
                        last_seen: row.get(2)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Most recent matching records, newest first.
    pub fn last_k(&self, params: &QueryParams) -> StoreResult<Vec<HistoryRecord>> {
        self.records(params, "DESC")
    }

    /// Oldest matching records, oldest first.
    pub fn first_k(&self, params: &QueryParams) -> StoreResult<Vec<HistoryRecord>> {
        self.records(params, "ASC")
    }

    fn records(&self, params: &QueryParams, direction: &str) -> StoreResult<Vec<HistoryRecord>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT user, host, command, datetime FROM history WHERE {FILTER} \
             ORDER BY julianday(datetime) {direction}, rowid {direction} \
             LIMIT ?4"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    params.user,
                    params.host,
                    params.command,
                    sql_limit(params.limit)
                ],
                record_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Runs a filtered query and renders it in the requested format.
    pub fn run_query(&self, params: &QueryParams) -> StoreResult<String> {
        debug!(
            parent: self.span(),
            user = %params.user,
            host = %params.host,
            command = %params.command,
            limit = params.limit,
            order = %params.order,
            format = %params.format,
            "running query"
        );
        match params.order {
            QueryOrder::Frequent => render::render_frequencies(&self.top_k(params)?, params.format),
            QueryOrder::Recent => render::render_records(&self.last_k(params)?, params.format),
            QueryOrder::Oldest => render::render_records(&self.first_k(params)?, params.format),
        }
    }

    /// The stats report: the top commands over all history, a blank line,
    /// then the latest commands.
    pub fn stats_report(&self) -> StoreResult<String> {
        let top = self.top_k(&QueryParams::new().with_limit(STATS_TOP_K))?;
        let last = self.last_k(&QueryParams::new().with_limit(STATS_LAST_K))?;
        Ok(format!(
            "{}\n\n{}",
            render::top_k_report(STATS_TOP_K, &top),
            render::last_k_report(STATS_LAST_K, &last)
        ))
    }
}

//! Parsing and bulk import of `history` output.
//!
//! Lines are expected in the format bash prints with
//! `HISTTIMEFORMAT="%FT%T%z "`:
//!
//! ```text
//!   812  2015-06-23T10:01:02+0300 ls -la
//!   813* 2015-06-23T10:01:09+0300 vim notes.txt
//! ```

use crate::error::{StoreError, StoreResult};
use crate::store::{insert_with, Store, INSERT_HISTORY};
use crate::types::{HistoryRecord, ImportStats, InsertOutcome};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use rusqlite::TransactionBehavior;
use std::sync::LazyLock;
use tracing::{debug, info};

/// chrono layout of the timestamp in a history line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

#[allow(clippy::expect_used)]
static HISTORY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ *[0-9]+\*? *([0-9T:+-]{24}) *(.*)$").expect("history line regex compiles")
});

/// Splits a history line into its timestamp text and command.
///
/// Returns `None` when the line does not have the expected layout.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let caps = HISTORY_LINE.captures(line)?;
    let stamp = caps.get(1)?.as_str();
    let command = caps.get(2).map_or("", |m| m.as_str());
    Some((stamp, command))
}

/// Parses a timestamp as found in a history line.
pub fn parse_timestamp(stamp: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
}

impl Store {
    /// Imports raw `history` output for `user` on `host`.
    ///
    /// Every line counts towards `total`. Lines that do not match the
    /// expected layout and lines already stored count as `failed`. The whole
    /// import is one transaction: a line that matches but carries an
    /// impossible timestamp aborts it and nothing is stored.
    pub fn import_history(&self, raw: &str, user: &str, host: &str) -> StoreResult<ImportStats> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut stats = ImportStats::default();
        {
            let mut stmt = tx.prepare(INSERT_HISTORY)?;
            for (index, line) in raw.lines().enumerate() {
                let line = line.strip_suffix('\r').unwrap_or(line);
                stats.total += 1;

                let Some((stamp, command)) = parse_line(line) else {
                    debug!(parent: self.span(), line = index + 1, "skipping unparseable line");
                    stats.failed += 1;
                    continue;
                };
                let timestamp =
                    parse_timestamp(stamp).map_err(|source| StoreError::InvalidTimestamp {
                        line: index + 1,
                        stamp: stamp.to_string(),
                        source,
                    })?;

                let record = HistoryRecord::new(user, host, command, timestamp);
                match insert_with(&mut stmt, &record)? {
                    InsertOutcome::Inserted => stats.inserted += 1,
                    InsertOutcome::Duplicate => stats.failed += 1,
                }
            }
        }
        tx.commit()?;

        info!(
            parent: self.span(),
            %user,
            %host,
            total = stats.total,
            inserted = stats.inserted,
            failed = stats.failed,
            "imported history"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(StoreConfig::new(dir.path().join("h.sqlite3"))).unwrap();
        (dir, store)
    }

    #[test]
    fn parse_plain_line() {
        let (stamp, command) = parse_line("  812  2015-06-23T10:01:02+0300 ls -la").unwrap();
        assert_eq!(stamp, "2015-06-23T10:01:02+0300");
        assert_eq!(command, "ls -la");
    }

    #[test]
    fn parse_modified_line() {
        let (_, command) = parse_line("  813* 2015-06-23T10:01:09+0300 vim notes.txt").unwrap();
        assert_eq!(command, "vim notes.txt");
    }

    #[test]
    fn parse_rejects_other_layouts() {
        assert!(parse_line("ls -la").is_none());
        assert!(parse_line("  12  ls -la").is_none());
        assert!(parse_line("  12  2015-06-23 10:01:02 ls").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn parse_keeps_inner_spacing() {
        let (_, command) =
            parse_line("1 2015-06-23T10:01:02+0300 echo 'a  b'   ").unwrap();
        assert_eq!(command, "echo 'a  b'   ");
    }

    #[test]
    fn timestamp_keeps_offset() {
        let ts = parse_timestamp("2015-06-23T10:01:02-0730").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -(7 * 3600 + 30 * 60));
        assert!(parse_timestamp("2015-13-23T10:01:02+0300").is_err());
    }

    #[test]
    fn import_counts() {
        let (_dir, store) = open_temp();
        let raw = "    1  2015-06-23T10:01:02+0300 ls -la\n\
                   garbage\n\
                   \x20   2  2015-06-23T10:01:05+0300 cd /tmp\r\n\
                   \x20   3  2015-06-23T10:01:09+0300 make";
        let stats = store.import_history(raw, "alice", "laptop").unwrap();
        assert_eq!(
            stats,
            ImportStats {
                total: 4,
                inserted: 3,
                failed: 1
            }
        );
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn reimport_is_all_duplicates() {
        let (_dir, store) = open_temp();
        let raw = "1 2015-06-23T10:01:02+0300 ls\n2 2015-06-23T10:01:03+0300 pwd\n";
        store.import_history(raw, "alice", "laptop").unwrap();
        let again = store.import_history(raw, "alice", "laptop").unwrap();
        assert_eq!(again.to_string(), "Processed 2 entries, successful 0, failed 2.");
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn bad_timestamp_aborts_everything() {
        let (_dir, store) = open_temp();
        let raw = "1 2015-06-23T10:01:02+0300 ls\n2 2015-19-23T10:01:03+0300 pwd\n";
        let err = store.import_history(raw, "alice", "laptop").unwrap_err();
        assert!(err.is_invalid_timestamp());
        assert!(err.to_string().contains("line 2"));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn empty_payload() {
        let (_dir, store) = open_temp();
        let stats = store.import_history("", "alice", "laptop").unwrap();
        assert_eq!(stats, ImportStats::default());
    }
}

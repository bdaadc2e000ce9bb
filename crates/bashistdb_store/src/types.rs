//! Records stored and returned by the history store.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::fmt;

/// One executed command as stored.
///
/// Two records are the same entry when all four fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// Account that ran the command.
    pub user: String,
    /// Machine the command ran on.
    pub host: String,
    /// Command text, verbatim.
    pub command: String,
    /// When the command ran, with its original UTC offset.
    pub timestamp: DateTime<FixedOffset>,
}

impl HistoryRecord {
    /// Creates a record.
    pub fn new(
        user: impl Into<String>,
        host: impl Into<String>,
        command: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            command: command.into(),
            timestamp,
        }
    }
}

/// A command with the number of times it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandFrequency {
    /// Command text.
    pub command: String,
    /// Number of matching records.
    pub count: u64,
    /// Latest matching timestamp.
    pub last_seen: DateTime<FixedOffset>,
}

/// One row of the connection log joined with its reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionEntry {
    /// Accept time.
    pub datetime: DateTime<Utc>,
    /// Remote address, without port.
    pub remote: String,
    /// Comma-separated reverse names, if a lookup succeeded.
    pub reverse: Option<String>,
}

/// What happened to a single insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// An identical row already existed.
    Duplicate,
}

/// Counters for one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Lines seen, including unparseable ones.
    pub total: u64,
    /// Lines stored as new rows.
    pub inserted: u64,
    /// Lines that did not parse or were already stored.
    pub failed: u64,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} entries, successful {}, failed {}.",
            self.total, self.inserted, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_stats_summary() {
        let stats = ImportStats {
            total: 13,
            inserted: 10,
            failed: 3,
        };
        assert_eq!(
            stats.to_string(),
            "Processed 13 entries, successful 10, failed 3."
        );
    }

    #[test]
    fn record_serializes_with_offset() {
        let ts = DateTime::parse_from_rfc3339("2015-06-23T10:01:02+03:00").unwrap();
        let record = HistoryRecord::new("alice", "laptop", "ls -la", ts);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"timestamp\":\"2015-06-23T10:01:02+03:00\""));
        assert!(json.contains("\"command\":\"ls -la\""));
    }
}

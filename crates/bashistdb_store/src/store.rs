//! The store handle: opening, inserting, connection logging.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::migration::MigrationManager;
use crate::schema;
use crate::types::{ConnectionEntry, HistoryRecord, InsertOutcome};
use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension, Statement};
use std::fs;
use tracing::{debug, info, info_span, Span};

pub(crate) const INSERT_HISTORY: &str =
    "INSERT INTO history (user, host, command, datetime) VALUES (?1, ?2, ?3, ?4)";

/// Handle to a history store on disk.
///
/// Cloning is cheap. Each operation opens its own connection, so a handle
/// can be moved into blocking tasks freely.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
    span: Span,
}

impl Store {
    /// Opens the store described by `config`, creating or upgrading it as
    /// needed.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let span = info_span!("store", path = %config.path.display());
        Self::open_with_span(config, span)
    }

    /// Opens the store, logging under `span`.
    ///
    /// A missing or zero-length file gets a fresh schema. Anything else is
    /// migrated to the current version; a version this build does not know
    /// fails the open.
    pub fn open_with_span(config: StoreConfig, span: Span) -> StoreResult<Self> {
        let fresh = match fs::metadata(&config.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self { config, span };
        let mut conn = store.connect()?;
        if store.config.wal {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        if fresh {
            info!(parent: &store.span, "database file not found, creating new store");
            schema::initialize(&mut conn)?;
        } else {
            let result = MigrationManager::with_builtin().run(&mut conn)?;
            for step in &result.applied {
                info!(
                    parent: &store.span,
                    from = step.from,
                    to = step.to,
                    name = %step.name,
                    "applied migration"
                );
            }
        }
        Ok(store)
    }

    /// Returns the configuration this store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the logging span of this store.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub(crate) fn connect(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&self.config.path)?;
        conn.busy_timeout(self.config.busy_timeout)?;
        Ok(conn)
    }

    /// Reads the stored schema version.
    pub fn schema_version(&self) -> StoreResult<u32> {
        let conn = self.connect()?;
        let raw = schema::read_version(&conn)?.unwrap_or_default();
        raw.trim()
            .parse()
            .map_err(|_| StoreError::unsupported_version(raw))
    }

    /// Inserts one record. Inserting an identical record again is not an
    /// error and reports [`InsertOutcome::Duplicate`].
    pub fn insert(&self, record: &HistoryRecord) -> StoreResult<InsertOutcome> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(INSERT_HISTORY)?;
        insert_with(&mut stmt, record)
    }

    /// Number of stored history records.
    pub fn count(&self) -> StoreResult<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Appends an accepted connection to the connection log.
    pub fn log_connection(&self, at: DateTime<Utc>, remote: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO connlog (datetime, remote) VALUES (?1, ?2)",
            params![at, remote],
        )?;
        debug!(parent: &self.span, %remote, "logged connection");
        Ok(())
    }

    /// Returns true if a reverse lookup is already cached for `ip`.
    pub fn has_reverse_lookup(&self, ip: &str) -> StoreResult<bool> {
        let conn = self.connect()?;
        let found = conn
            .query_row("SELECT 1 FROM rlookup WHERE ip = ?1", [ip], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Caches the reverse names of `ip`, replacing any earlier entry.
    pub fn record_reverse_lookup(&self, ip: &str, names: &[String]) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO rlookup (ip, reverse) VALUES (?1, ?2)",
            params![ip, names.join(",")],
        )?;
        Ok(())
    }

    /// Lists the connection log, oldest first.
    pub fn connections(&self) -> StoreResult<Vec<ConnectionEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT datetime, remote, reverse FROM connections \
             ORDER BY julianday(datetime) ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ConnectionEntry {
                    datetime: row.get(0)?,
                    remote: row.get(1)?,
                    reverse: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Runs a prepared [`INSERT_HISTORY`] for `record`, mapping a primary key
/// conflict to [`InsertOutcome::Duplicate`].
pub(crate) fn insert_with(
    stmt: &mut Statement<'_>,
    record: &HistoryRecord,
) -> StoreResult<InsertOutcome> {
    match stmt.execute(params![
        record.user,
        record.host,
        record.command,
        record.timestamp
    ]) {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Ok(InsertOutcome::Duplicate)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(StoreConfig::new(dir.path().join("history.sqlite3"))).unwrap();
        (dir, store)
    }

    fn record(command: &str, stamp: &str) -> HistoryRecord {
        HistoryRecord::new(
            "alice",
            "laptop",
            command,
            DateTime::parse_from_rfc3339(stamp).unwrap(),
        )
    }

    #[test]
    fn fresh_store_is_current() {
        let (_dir, store) = open_temp();
        assert_eq!(store.schema_version().unwrap(), schema::CURRENT_VERSION);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn zero_length_file_is_initialized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.sqlite3");
        fs::write(&path, b"").unwrap();
        let store = Store::open(StoreConfig::new(&path)).unwrap();
        assert_eq!(store.schema_version().unwrap(), schema::CURRENT_VERSION);
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("h.sqlite3");
        Store::open(StoreConfig::new(&path)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn journal_mode_and_busy_timeout() {
        let (_dir, store) = open_temp();
        let conn = store.connect().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5_000);
    }

    #[test]
    fn insert_is_idempotent() {
        let (_dir, store) = open_temp();
        let r = record("ls -la", "2015-06-23T10:01:02+03:00");
        assert_eq!(store.insert(&r).unwrap(), InsertOutcome::Inserted);
        assert_eq!(store.insert(&r).unwrap(), InsertOutcome::Duplicate);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn same_command_other_time_is_new() {
        let (_dir, store) = open_temp();
        store
            .insert(&record("ls", "2015-06-23T10:01:02+03:00"))
            .unwrap();
        let outcome = store
            .insert(&record("ls", "2015-06-23T10:01:03+03:00"))
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.sqlite3");
        {
            let store = Store::open(StoreConfig::new(&path)).unwrap();
            store
                .insert(&record("make", "2015-06-23T10:01:02+03:00"))
                .unwrap();
        }
        let store = Store::open(StoreConfig::new(&path)).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn connection_log_and_reverse_cache() {
        let (_dir, store) = open_temp();
        let at = DateTime::parse_from_rfc3339("2015-06-23T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        store.log_connection(at, "10.0.0.1").unwrap();
        assert!(!store.has_reverse_lookup("10.0.0.1").unwrap());

        let entries = store.connections().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].remote, "10.0.0.1");
        assert_eq!(entries[0].reverse, None);
        assert_eq!(entries[0].datetime, at);

        store
            .record_reverse_lookup("10.0.0.1", &["a.example.".into(), "b.example.".into()])
            .unwrap();
        store
            .record_reverse_lookup("10.0.0.1", &["c.example.".into()])
            .unwrap();
        assert!(store.has_reverse_lookup("10.0.0.1").unwrap());
        let entries = store.connections().unwrap();
        assert_eq!(entries[0].reverse.as_deref(), Some("c.example."));
    }
}

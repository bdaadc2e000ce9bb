//! Current schema and fresh-store initialization.

use crate::error::StoreResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Schema version written by this build.
pub const CURRENT_VERSION: u32 = 2;

/// Key of the schema version row in the `admin` table.
pub const VERSION_KEY: &str = "version";

/// DDL for a fresh store at [`CURRENT_VERSION`].
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS history (
    user     TEXT NOT NULL,
    host     TEXT NOT NULL,
    command  TEXT NOT NULL,
    datetime TEXT NOT NULL,
    PRIMARY KEY (user, command, datetime)
);
CREATE TABLE IF NOT EXISTS admin (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS connlog (
    datetime TEXT PRIMARY KEY,
    remote   TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS rlookup (
    ip      TEXT PRIMARY KEY,
    reverse TEXT NOT NULL
);
CREATE VIEW IF NOT EXISTS connections AS
    SELECT c.datetime AS datetime, c.remote AS remote, r.reverse AS reverse
    FROM connlog c LEFT JOIN rlookup r ON c.remote = r.ip;
";

/// Creates every table of the current schema and stamps the version.
pub fn initialize(conn: &mut Connection) -> StoreResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;
    tx.execute(
        "INSERT OR REPLACE INTO admin (key, value) VALUES (?1, ?2)",
        params![VERSION_KEY, CURRENT_VERSION.to_string()],
    )?;
    tx.commit()?;
    Ok(())
}

/// Reads the raw schema version text, if the store has one.
pub fn read_version(conn: &Connection) -> StoreResult<Option<String>> {
    let version = conn
        .query_row(
            "SELECT value FROM admin WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(version)
}

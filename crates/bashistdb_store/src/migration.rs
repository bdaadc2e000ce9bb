//! Schema migration.
//!
//! Each registered [`Migration`] moves the store from one version to the
//! next. Steps run in order, each inside its own transaction together with
//! the update of the stored version, so an interrupted upgrade leaves the
//! store at the last completed version.
//!
//! ## Usage
//!
//! ```ignore
//! let manager = MigrationManager::with_builtin();
//! let result = manager.run(&mut conn)?;
//! assert_eq!(result.final_version, CURRENT_VERSION);
//! ```

use crate::error::{StoreError, StoreResult};
use crate::schema::{self, CURRENT_VERSION, VERSION_KEY};
use rusqlite::{params, Connection, Transaction};
use std::collections::BTreeMap;

/// Schema version number.
pub type SchemaVersion = u32;

/// Information about a registered migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationInfo {
    /// Version the step upgrades from.
    pub from: SchemaVersion,
    /// Version the step produces.
    pub to: SchemaVersion,
    /// Human-readable name.
    pub name: String,
}

/// Result of bringing a store up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRunResult {
    /// Version found when the run started.
    pub initial_version: SchemaVersion,
    /// Version after the run.
    pub final_version: SchemaVersion,
    /// Steps applied, in order.
    pub applied: Vec<MigrationInfo>,
}

/// One step of the upgrade path.
pub trait Migration: Send + Sync {
    /// Version this step upgrades from.
    fn from_version(&self) -> SchemaVersion;

    /// Version this step produces.
    fn to_version(&self) -> SchemaVersion {
        self.from_version() + 1
    }

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Applies the step inside `tx`.
    ///
    /// The caller updates the stored version and commits.
    fn up(&self, tx: &Transaction<'_>) -> StoreResult<()>;
}

/// Moves reverse lookups out of the connection log.
///
/// Version 1 kept a `reverse` column on every `connlog` row. Version 2 keeps
/// one lookup per address in `rlookup` and exposes the joined data through
/// the `connections` view.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitReverseLookup;

impl Migration for SplitReverseLookup {
    fn from_version(&self) -> SchemaVersion {
        1
    }

    fn name(&self) -> &str {
        "split_reverse_lookup"
    }

    fn up(&self, tx: &Transaction<'_>) -> StoreResult<()> {
        tx.execute_batch(
            "
            CREATE TABLE connlog_new (
                datetime TEXT PRIMARY KEY,
                remote   TEXT NOT NULL
            );
            INSERT INTO connlog_new (datetime, remote)
                SELECT datetime, COALESCE(remote, '') FROM connlog;
            DROP TABLE connlog;
            ALTER TABLE connlog_new RENAME TO connlog;
            CREATE TABLE IF NOT EXISTS rlookup (
                ip      TEXT PRIMARY KEY,
                reverse TEXT NOT NULL
            );
            CREATE VIEW IF NOT EXISTS connections AS
                SELECT c.datetime AS datetime, c.remote AS remote, r.reverse AS reverse
                FROM connlog c LEFT JOIN rlookup r ON c.remote = r.ip;
            ",
        )?;
        Ok(())
    }
}

/// Registry of migration steps keyed by the version they upgrade from.
pub struct MigrationManager {
    migrations: BTreeMap<SchemaVersion, Box<dyn Migration>>,
}

impl MigrationManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            migrations: BTreeMap::new(),
        }
    }

    /// Creates a manager holding every step this build knows.
    pub fn with_builtin() -> Self {
        let mut manager = Self::new();
        manager.migrations.insert(1, Box::new(SplitReverseLookup));
        manager
    }

    /// Registers a step.
    ///
    /// Fails if a step from the same version is already registered.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> StoreResult<()> {
        let from = migration.from_version();
        if self.migrations.contains_key(&from) {
            return Err(StoreError::migration_failed(
                migration.name(),
                format!("a step from version {from} is already registered"),
            ));
        }
        self.migrations.insert(from, migration);
        Ok(())
    }

    /// Lists registered steps in version order.
    pub fn list(&self) -> Vec<MigrationInfo> {
        self.migrations.values().map(|m| info(m.as_ref())).collect()
    }

    /// Brings the store behind `conn` up to [`CURRENT_VERSION`].
    ///
    /// A store already at the current version is left untouched. A version
    /// that is not a number, is newer than this build, or has no registered
    /// step is an [`StoreError::UnsupportedVersion`].
    pub fn run(&self, conn: &mut Connection) -> StoreResult<MigrationRunResult> {
        self.run_to(conn, CURRENT_VERSION)
    }

    /// Brings the store behind `conn` up to `target`.
    pub fn run_to(
        &self,
        conn: &mut Connection,
        target: SchemaVersion,
    ) -> StoreResult<MigrationRunResult> {
        let raw = schema::read_version(conn)?.unwrap_or_default();
        let initial_version: SchemaVersion = raw
            .trim()
            .parse()
            .map_err(|_| StoreError::unsupported_version(raw.clone()))?;
        if initial_version > target {
            return Err(StoreError::unsupported_version(raw));
        }

        let mut version = initial_version;
        let mut applied = Vec::new();
        while version < target {
            let step = self
                .migrations
                .get(&version)
                .ok_or_else(|| StoreError::unsupported_version(version.to_string()))?;

            let tx = conn.transaction()?;
            step.up(&tx)
                .map_err(|e| StoreError::migration_failed(step.name(), e.to_string()))?;
            tx.execute(
                "UPDATE admin SET value = ?1 WHERE key = ?2",
                params![step.to_version().to_string(), VERSION_KEY],
            )?;
            tx.commit()?;

            applied.push(info(step.as_ref()));
            version = step.to_version();
        }

        Ok(MigrationRunResult {
            initial_version,
            final_version: version,
            applied,
        })
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::with_builtin()
    }
}

fn info(migration: &dyn Migration) -> MigrationInfo {
    MigrationInfo {
        from: migration.from_version(),
        to: migration.to_version(),
        name: migration.name().to_string(),
    }
}

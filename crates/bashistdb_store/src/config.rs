//! Store configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for opening a [`Store`](crate::Store).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    pub path: PathBuf,
    /// How long an operation waits for a lock held by another connection.
    pub busy_timeout: Duration,
    /// Whether to switch the database to write-ahead logging.
    pub wal: bool,
}

impl StoreConfig {
    /// Creates a configuration for the database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(5_000),
            wal: true,
        }
    }

    /// Sets the busy timeout.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Enables or disables write-ahead logging.
    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }
}

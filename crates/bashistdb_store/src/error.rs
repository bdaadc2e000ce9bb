//! Error types for the history store.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON rendering failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A history line matched the expected layout but its timestamp did not
    /// parse. Aborts the whole import.
    #[error("invalid timestamp {stamp:?} on line {line}: {source}")]
    InvalidTimestamp {
        /// 1-based line number within the imported text.
        line: usize,
        /// The timestamp text as found.
        stamp: String,
        /// Parser error.
        #[source]
        source: chrono::ParseError,
    },

    /// The stored schema version is neither current nor migratable.
    #[error("unsupported schema version {found:?} (this build supports {supported})")]
    UnsupportedVersion {
        /// Version text found in the store.
        found: String,
        /// Version this build writes.
        supported: u32,
    },

    /// A migration step failed and was rolled back.
    #[error("migration {name} failed: {message}")]
    MigrationFailed {
        /// Name of the failed step.
        name: String,
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates an unsupported version error.
    pub fn unsupported_version(found: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            found: found.into(),
            supported: crate::schema::CURRENT_VERSION,
        }
    }

    /// Creates a migration failed error.
    pub fn migration_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MigrationFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error aborted an import because of a bad
    /// timestamp.
    pub fn is_invalid_timestamp(&self) -> bool {
        matches!(self, StoreError::InvalidTimestamp { .. })
    }
}

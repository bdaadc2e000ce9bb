//! # bashistdb Store
//!
//! The SQLite-backed history store behind the bashistdb server.
//!
//! This crate provides:
//! - Schema creation and versioned, transactional migration
//! - Idempotent insertion of history records
//! - Bulk import of `history` output in a single transaction
//! - Frequency, recency and filtered queries with plain, restore and JSON
//!   rendering
//! - The connection log and its reverse-lookup cache
//!
//! ## Concurrency
//!
//! A [`Store`] is a cheap handle holding the database path. Every operation
//! opens its own SQLite connection with a busy timeout, so concurrent callers
//! are serialized by SQLite's locking rather than by locks in this crate.
//!
//! ## Usage
//!
//! ```no_run
//! use bashistdb_store::{Store, StoreConfig};
//! use bashistdb_protocol::QueryParams;
//!
//! let store = Store::open(StoreConfig::new("/tmp/history.sqlite3"))?;
//! let stats = store.import_history("    1  2015-06-23T10:01:02+0300 ls -la\n", "alice", "laptop")?;
//! assert_eq!(stats.inserted, 1);
//!
//! let text = store.run_query(&QueryParams::default().with_user("alice"))?;
//! println!("{text}");
//! # Ok::<(), bashistdb_store::StoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod import;
pub mod migration;
mod query;
pub mod render;
pub mod schema;
mod store;
mod types;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use import::{parse_line, parse_timestamp, TIMESTAMP_FORMAT};
pub use query::{STATS_LAST_K, STATS_TOP_K};
pub use schema::CURRENT_VERSION;
pub use store::Store;
pub use types::{CommandFrequency, ConnectionEntry, HistoryRecord, ImportStats, InsertOutcome};

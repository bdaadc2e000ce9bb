//! # bashistdb Testkit
//!
//! Test utilities for bashistdb.
//!
//! This crate provides:
//! - Temporary stores that clean up after themselves
//! - A builder for `history` output, good and bad lines alike
//! - proptest strategies for commands, history text and query parameters
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bashistdb_testkit::prelude::*;
//!
//! #[test]
//! fn imports() {
//!     with_temp_store(|store| {
//!         let text = HistoryBuilder::new().command("ls").command("pwd").build();
//!         assert_eq!(store.import_history(&text, "u", "h").unwrap().inserted, 2);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod history;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::history::*;
}

pub use fixtures::*;
pub use generators::*;
pub use history::*;

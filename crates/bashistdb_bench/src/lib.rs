//! Benchmark utilities for bashistdb.

#![allow(missing_docs)]

pub mod utils;

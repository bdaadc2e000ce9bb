//! CLI command implementations.

pub mod client;
pub mod inspect;
pub mod local;
pub mod server;

//! # bashistdb Server
//!
//! TCP server that accepts encrypted history uploads and queries.
//!
//! This crate provides:
//! - The accept loop, one task per connection
//! - The per-connection handler: read one request, reply once, close
//! - Message dispatch against a [`Store`](bashistdb_store::Store), shared
//!   with local mode
//! - Best-effort reverse DNS of connecting addresses
//!
//! # Protocol
//!
//! Each connection carries exactly one request envelope and one reply
//! envelope. A request that cannot be read or authenticated is dropped
//! without a reply.
//!
//! ```rust,ignore
//! let store = Store::open(StoreConfig::new(path))?;
//! let key = SharedKey::from_passphrase("secret")?;
//! let server = SyncServer::bind(ServerConfig::default(), store, key).await?;
//! server.run_until(tokio::signal::ctrl_c().map(|_| ())).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod dispatch;
mod error;
mod handler;
mod rlookup;
mod server;

pub use config::ServerConfig;
pub use dispatch::dispatch;
pub use error::{ServerError, ServerResult};
pub use handler::{ConnectionHandler, ConnectionOutcome, ConnectionState};
pub use rlookup::{spawn_reverse_lookup, ReverseResolver, SystemResolver};
pub use server::SyncServer;

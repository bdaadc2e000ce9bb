//! # bashistdb Client
//!
//! One-shot client sessions against a bashistdb server.
//!
//! A session turns an [`Intent`] into exactly one request message, performs
//! one exchange over a [`Transport`], and returns the reply text. There is
//! no retry.
//!
//! ```rust,no_run
//! use bashistdb_client::{ClientConfig, Intent, SyncSession, TcpTransport};
//! use bashistdb_protocol::SharedKey;
//!
//! let key = SharedKey::from_passphrase("secret")?;
//! let config = ClientConfig::new("alice", "laptop");
//! let transport = TcpTransport::new("history.example.org", key);
//! let session = SyncSession::new(config, transport);
//! println!("{}", session.run(Intent::Stats)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod session;
mod transport;

pub use config::ClientConfig;
pub use error::{SessionError, SessionResult};
pub use session::{Intent, SyncSession};
pub use transport::{with_default_port, TcpTransport, Transport};

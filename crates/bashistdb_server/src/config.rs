//! Server configuration.

use bashistdb_protocol::DEFAULT_PORT;
use std::net::SocketAddr;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Whether to resolve connecting addresses to names.
    pub reverse_lookup: bool,
}

impl ServerConfig {
    /// Creates a configuration listening on `bind_addr`.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            reverse_lookup: true,
        }
    }

    /// Enables or disables reverse lookups.
    pub fn with_reverse_lookup(mut self, enabled: bool) -> Self {
        self.reverse_lookup = enabled;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }
}

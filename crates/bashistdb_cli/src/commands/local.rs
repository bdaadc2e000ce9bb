//! Local mode: the server's dispatch without the network.

use bashistdb_client::{SessionResult, Transport};
use bashistdb_protocol::Message;
use bashistdb_server::dispatch;
use bashistdb_store::Store;

/// Transport that answers requests from a store in this process.
pub struct LocalTransport {
    store: Store,
}

impl LocalTransport {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl Transport for LocalTransport {
    fn exchange(&self, request: &Message) -> SessionResult<Message> {
        Ok(dispatch(&self.store, request.clone()))
    }
}

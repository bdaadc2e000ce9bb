//! Per-connection request handling.

use crate::dispatch::dispatch;
use bashistdb_protocol::{envelope, Message, MessageType, ProtocolError, SharedKey};
use bashistdb_store::Store;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, trace, warn, Span};

/// Where a connection is in its single request/reply exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, nothing read yet.
    Accepted,
    /// A request envelope was read and opened.
    Received,
    /// The request was answered by the store.
    Dispatched,
    /// The reply was written.
    Replied,
    /// The stream was shut down.
    Closed,
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// A request was answered. `request` is `None` for unrecognized types.
    Replied {
        /// Type of the request.
        request: Option<MessageType>,
    },
    /// The request could not be read or opened and no reply was sent.
    Dropped {
        /// Why.
        error: ProtocolError,
    },
    /// The request was answered but the reply could not be written.
    ReplyFailed {
        /// Why.
        error: ProtocolError,
    },
    /// Dispatch did not complete.
    Aborted,
}

/// Handles one accepted connection.
pub struct ConnectionHandler {
    store: Store,
    key: Arc<SharedKey>,
    span: Span,
    state: ConnectionState,
}

impl ConnectionHandler {
    /// Creates a handler for a freshly accepted connection.
    pub fn new(store: Store, key: Arc<SharedKey>, span: Span) -> Self {
        Self {
            store,
            key,
            span,
            state: ConnectionState::Accepted,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn advance(&mut self, next: ConnectionState) {
        trace!(parent: &self.span, from = ?self.state, to = ?next, "connection state");
        self.state = next;
    }

    /// Reads one request from `stream`, answers it and closes the stream.
    ///
    /// Every path ends in [`ConnectionState::Closed`].
    pub async fn handle<S>(&mut self, mut stream: S) -> ConnectionOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let outcome = self.exchange(&mut stream).await;
        if let Err(e) = stream.shutdown().await {
            trace!(parent: &self.span, error = %e, "shutdown failed");
        }
        self.advance(ConnectionState::Closed);
        outcome
    }

    async fn exchange<S>(&mut self, stream: &mut S) -> ConnectionOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let request = match envelope::read_message_async(stream, &self.key).await {
            Ok(message) => message,
            Err(error) => {
                debug!(parent: &self.span, %error, "dropping connection");
                return ConnectionOutcome::Dropped { error };
            }
        };
        self.advance(ConnectionState::Received);

        let request_type = request.message_type();
        if let Some((user, hostname)) = request.origin() {
            info!(
                parent: &self.span,
                r#type = request.type_tag(),
                %user,
                %hostname,
                "request"
            );
        }

        let store = self.store.clone();
        let reply: Message =
            match tokio::task::spawn_blocking(move || dispatch(&store, request)).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(parent: &self.span, error = %e, "dispatch task failed");
                    return ConnectionOutcome::Aborted;
                }
            };
        self.advance(ConnectionState::Dispatched);

        if let Err(error) = envelope::write_message_async(stream, &reply, &self.key).await {
            warn!(parent: &self.span, %error, "failed to send reply");
            return ConnectionOutcome::ReplyFailed { error };
        }
        self.advance(ConnectionState::Replied);

        ConnectionOutcome::Replied {
            request: request_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashistdb_protocol::{frame, ProtocolErrorKind};
    use bashistdb_store::StoreConfig;
    use tempfile::TempDir;
    use tokio::io::{duplex, AsyncReadExt};

    fn setup() -> (TempDir, Store, Arc<SharedKey>) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(StoreConfig::new(dir.path().join("h.sqlite3"))).unwrap();
        let key = Arc::new(SharedKey::from_passphrase("handler-test").unwrap());
        (dir, store, key)
    }

    #[tokio::test]
    async fn answers_one_request() {
        let (_dir, store, key) = setup();
        let (mut client, server) = duplex(64 * 1024);

        let request = Message::history(
            "alice",
            "laptop",
            b"1 2015-06-23T10:01:02+0300 ls".to_vec(),
        );
        envelope::write_message_async(&mut client, &request, &key)
            .await
            .unwrap();

        let mut handler = ConnectionHandler::new(store, Arc::clone(&key), Span::none());
        let outcome = handler.handle(server).await;

        assert_eq!(
            outcome,
            ConnectionOutcome::Replied {
                request: Some(MessageType::History)
            }
        );
        assert_eq!(handler.state(), ConnectionState::Closed);

        let reply = envelope::read_message_async(&mut client, &key).await.unwrap();
        assert_eq!(
            reply.payload(),
            b"Processed 1 entries, successful 1, failed 0."
        );
    }

    #[tokio::test]
    async fn wrong_key_is_dropped_without_reply() {
        let (_dir, store, key) = setup();
        let (mut client, server) = duplex(64 * 1024);

        let other = SharedKey::from_passphrase("intruder").unwrap();
        envelope::write_message_async(&mut client, &Message::stats("eve", "x"), &other)
            .await
            .unwrap();

        let mut handler = ConnectionHandler::new(store, key, Span::none());
        let outcome = handler.handle(server).await;
        match outcome {
            ConnectionOutcome::Dropped { error } => {
                assert_eq!(error.kind(), ProtocolErrorKind::Integrity)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(handler.state(), ConnectionState::Closed);

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn early_close_is_transport_error() {
        let (_dir, store, key) = setup();
        let (mut client, server) = duplex(1024);
        client.write_all(&[0, 0]).await.unwrap();
        drop(client);

        let mut handler = ConnectionHandler::new(store, key, Span::none());
        match handler.handle(server).await {
            ConnectionOutcome::Dropped { error } => {
                assert_eq!(error.kind(), ProtocolErrorKind::Transport)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_type_gets_empty_reply() {
        let (_dir, store, key) = setup();
        let (mut client, server) = duplex(64 * 1024);

        let body = key
            .seal(&Message::Unsupported {
                type_tag: "PING".into(),
            }
            .to_plaintext()
            .unwrap())
            .unwrap();
        frame::write_frame_async(&mut client, &body).await.unwrap();

        let mut handler = ConnectionHandler::new(store, Arc::clone(&key), Span::none());
        assert_eq!(
            handler.handle(server).await,
            ConnectionOutcome::Replied { request: None }
        );
        let reply = envelope::read_message_async(&mut client, &key).await.unwrap();
        assert!(reply.payload().is_empty());
    }
}

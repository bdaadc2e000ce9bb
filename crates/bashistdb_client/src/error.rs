//! Error types for client sessions.

use bashistdb_protocol::ProtocolError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that end a session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Could not reach the server.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address as given.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error on an established connection.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope error: transport, integrity or malformed reply.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// The server answered with something other than a result.
    #[error("unexpected reply of type {type_tag:?}")]
    UnexpectedReply {
        /// Type tag of the reply.
        type_tag: String,
    },

    /// The session could not be carried out locally.
    #[error("{0}")]
    Local(String),
}

impl SessionError {
    /// Creates a local error.
    pub fn local(message: impl Into<String>) -> Self {
        Self::Local(message.into())
    }
}

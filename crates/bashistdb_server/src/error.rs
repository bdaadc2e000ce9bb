//! Error types for the sync server.

use bashistdb_protocol::ProtocolError;
use bashistdb_store::StoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// I/O error, typically binding or accepting.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Envelope error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An uploaded history payload is not UTF-8 text.
    #[error("history upload is not valid UTF-8: {0}")]
    InvalidHistory(#[from] std::string::FromUtf8Error),

    /// A blocking task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("blocking task failed: {err}"))
    }
}

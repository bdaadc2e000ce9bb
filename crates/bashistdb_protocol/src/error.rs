//! Error types for the protocol crate.

use std::io;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Broad category of a [`ProtocolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// The outer frame could not be read (I/O failure, truncation, bad length).
    Transport,
    /// Decryption or authentication failed.
    Integrity,
    /// The decrypted plaintext is not a valid message.
    Malformed,
}

/// Errors that can occur while encoding, decoding or moving envelopes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Unreadable frame.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// Authenticated decryption failed.
    #[error("integrity error: {message}")]
    Integrity {
        /// Description of the failure.
        message: String,
    },

    /// Structurally invalid plaintext.
    #[error("malformed message: {message}")]
    Malformed {
        /// Description of the failure.
        message: String,
    },

    /// The pre-shared key is unusable.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },
}

impl ProtocolError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an integrity error.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    /// Creates a malformed message error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns the category of this error.
    ///
    /// Key problems are reported as integrity failures: they are detected
    /// before any byte reaches the wire and mean the envelope cannot be
    /// authenticated.
    pub fn kind(&self) -> ProtocolErrorKind {
        match self {
            ProtocolError::Transport { .. } => ProtocolErrorKind::Transport,
            ProtocolError::Integrity { .. } | ProtocolError::InvalidKey { .. } => {
                ProtocolErrorKind::Integrity
            }
            ProtocolError::Malformed { .. } => ProtocolErrorKind::Malformed,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::transport("connection closed before a full frame"),
            _ => Self::transport(err.to_string()),
        }
    }
}

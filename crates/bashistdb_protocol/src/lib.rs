//! # bashistdb Protocol
//!
//! Message types and the encrypted envelope codec for bashistdb.
//!
//! This crate provides:
//! - `Message`, the unit of wire exchange between client and server
//! - `QueryParams` and its rendering/ordering options
//! - `SharedKey` for authenticated encryption with a pre-shared passphrase
//! - Envelope encoding: `Message` → CBOR → AES-256-GCM → length-prefixed frame
//! - Blocking and async helpers that move exactly one envelope over a stream
//!
//! ## Layering
//!
//! ```text
//! Message ──cbor──▶ plaintext ──seal──▶ ciphertext ──frame──▶ wire bytes
//! ```
//!
//! Decoding strips the frame, opens the ciphertext and parses the plaintext.
//! Every failure maps to one [`ProtocolError`] whose [`ProtocolErrorKind`]
//! tells transport, integrity and malformed failures apart.
//!
//! ## Usage
//!
//! ```
//! use bashistdb_protocol::{envelope, Message, SharedKey};
//!
//! let key = SharedKey::from_passphrase("correct horse battery staple").unwrap();
//! let message = Message::stats("alice", "laptop");
//!
//! let wire = envelope::encode(&message, &key).unwrap();
//! let decoded = envelope::decode(&wire, &key).unwrap();
//! assert_eq!(message, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod crypto;
pub mod envelope;
mod error;
pub mod frame;
mod message;
mod query;

pub use crypto::{SharedKey, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
pub use error::{ProtocolError, ProtocolErrorKind, ProtocolResult};
pub use message::{Message, MessageType};
pub use query::{escape_like, OutputFormat, QueryOrder, QueryParams};

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 35628;

//! The encrypted envelope: serialize, seal, frame.

use crate::crypto::SharedKey;
use crate::error::ProtocolResult;
use crate::frame;
use crate::message::Message;
use std::io::{Read, Write};
use tokio::io::{AsyncRead, AsyncWrite};

/// Serializes and seals a message, without the outer frame.
pub fn seal(message: &Message, key: &SharedKey) -> ProtocolResult<Vec<u8>> {
    let plaintext = message.to_plaintext()?;
    key.seal(&plaintext)
}

/// Opens a frame body and parses the message inside.
pub fn open(body: &[u8], key: &SharedKey) -> ProtocolResult<Message> {
    let plaintext = key.open(body)?;
    Message::from_plaintext(&plaintext)
}

/// Encodes a message into wire bytes.
pub fn encode(message: &Message, key: &SharedKey) -> ProtocolResult<Vec<u8>> {
    frame::encode_frame(&seal(message, key)?)
}

/// Decodes wire bytes produced by [`encode`].
///
/// # Errors
///
/// Fails with a transport error for an unreadable frame, an integrity error
/// if authentication fails, and a malformed error if the plaintext is not a
/// valid message.
pub fn decode(wire: &[u8], key: &SharedKey) -> ProtocolResult<Message> {
    open(frame::decode_frame(wire)?, key)
}

/// Writes one envelope to a blocking stream.
pub fn write_message<W: Write>(
    writer: &mut W,
    message: &Message,
    key: &SharedKey,
) -> ProtocolResult<()> {
    frame::write_frame(writer, &seal(message, key)?)
}

/// Reads one envelope from a blocking stream.
pub fn read_message<R: Read>(reader: &mut R, key: &SharedKey) -> ProtocolResult<Message> {
    let body = frame::read_frame(reader)?;
    open(&body, key)
}

/// Writes one envelope to an async stream.
pub async fn write_message_async<W>(
    writer: &mut W,
    message: &Message,
    key: &SharedKey,
) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let body = seal(message, key)?;
    frame::write_frame_async(writer, &body).await
}

/// Reads one envelope from an async stream.
pub async fn read_message_async<R>(reader: &mut R, key: &SharedKey) -> ProtocolResult<Message>
where
    R: AsyncRead + Unpin,
{
    let body = frame::read_frame_async(reader).await?;
    open(&body, key)
}

//! Protocol messages.

use crate::error::{ProtocolError, ProtocolResult};
use crate::query::QueryParams;
use ciborium::value::Value;
use std::fmt;
use std::str::FromStr;

/// The four message types understood by client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Raw history text to import.
    History,
    /// Request for aggregate statistics.
    Stats,
    /// Filtered history query.
    Query,
    /// Server reply.
    Result,
}

impl MessageType {
    /// Returns the wire tag of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::History => "history",
            MessageType::Stats => "stats",
            MessageType::Query => "query",
            MessageType::Result => "result",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "history" => Ok(MessageType::History),
            "stats" => Ok(MessageType::Stats),
            "query" => Ok(MessageType::Query),
            "result" => Ok(MessageType::Result),
            other => Err(ProtocolError::malformed(format!(
                "unknown message type: {other}"
            ))),
        }
    }
}

/// A protocol message.
///
/// Each variant carries only the fields that are meaningful for it: the
/// payload travels with `History` and `Result`, query parameters only with
/// `Query`. `Unsupported` holds a well-formed message whose type tag this
/// version does not know; it is answered, not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// History text to import under `user@hostname`.
    History {
        /// Originating user.
        user: String,
        /// Originating host.
        hostname: String,
        /// Raw multi-line history text.
        payload: Vec<u8>,
    },
    /// Statistics request.
    Stats {
        /// Originating user.
        user: String,
        /// Originating host.
        hostname: String,
    },
    /// Query request.
    Query {
        /// Originating user.
        user: String,
        /// Originating host.
        hostname: String,
        /// Filter to run.
        params: QueryParams,
    },
    /// Reply to any request.
    Result {
        /// Formatted result text.
        payload: Vec<u8>,
    },
    /// A message with an unrecognized type tag.
    Unsupported {
        /// The type tag as received.
        type_tag: String,
    },
}

impl Message {
    /// Creates a history import message.
    pub fn history(
        user: impl Into<String>,
        hostname: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Message::History {
            user: user.into(),
            hostname: hostname.into(),
            payload: payload.into(),
        }
    }

    /// Creates a statistics request.
    pub fn stats(user: impl Into<String>, hostname: impl Into<String>) -> Self {
        Message::Stats {
            user: user.into(),
            hostname: hostname.into(),
        }
    }

    /// Creates a query request.
    pub fn query(user: impl Into<String>, hostname: impl Into<String>, params: QueryParams) -> Self {
        Message::Query {
            user: user.into(),
            hostname: hostname.into(),
            params,
        }
    }

    /// Creates a result reply.
    pub fn result(payload: impl Into<Vec<u8>>) -> Self {
        Message::Result {
            payload: payload.into(),
        }
    }

    /// Returns the message type, or `None` for an unsupported tag.
    pub fn message_type(&self) -> Option<MessageType> {
        match self {
            Message::History { .. } => Some(MessageType::History),
            Message::Stats { .. } => Some(MessageType::Stats),
            Message::Query { .. } => Some(MessageType::Query),
            Message::Result { .. } => Some(MessageType::Result),
            Message::Unsupported { .. } => None,
        }
    }

    /// Returns the wire type tag.
    pub fn type_tag(&self) -> &str {
        match self {
            Message::Unsupported { type_tag } => type_tag,
            other => other
                .message_type()
                .map(|t| t.as_str())
                .unwrap_or_default(),
        }
    }

    /// Returns `(user, hostname)` for request messages.
    pub fn origin(&self) -> Option<(&str, &str)> {
        match self {
            Message::History { user, hostname, .. }
            | Message::Stats { user, hostname }
            | Message::Query { user, hostname, .. } => Some((user, hostname)),
            Message::Result { .. } | Message::Unsupported { .. } => None,
        }
    }

    /// Returns the payload bytes, empty for types that carry none.
    pub fn payload(&self) -> &[u8] {
        match self {
            Message::History { payload, .. } | Message::Result { payload } => payload,
            _ => &[],
        }
    }

    /// Serializes the message to its CBOR plaintext.
    pub fn to_plaintext(&self) -> ProtocolResult<Vec<u8>> {
        let (user, hostname) = self.origin().unwrap_or(("", ""));
        let mut pairs = vec![
            (
                Value::Text("type".into()),
                Value::Text(self.type_tag().to_string()),
            ),
            (Value::Text("user".into()), Value::Text(user.to_string())),
            (
                Value::Text("hostname".into()),
                Value::Text(hostname.to_string()),
            ),
            (
                Value::Text("payload".into()),
                Value::Bytes(self.payload().to_vec()),
            ),
        ];
        if let Message::Query { params, .. } = self {
            pairs.push((Value::Text("query".into()), params.to_value()));
        }

        let mut buf = Vec::new();
        ciborium::into_writer(&Value::Map(pairs), &mut buf)
            .map_err(|e| ProtocolError::malformed(format!("failed to serialize message: {e}")))?;
        Ok(buf)
    }

    /// Parses a message from its CBOR plaintext.
    pub fn from_plaintext(bytes: &[u8]) -> ProtocolResult<Self> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| ProtocolError::malformed(format!("invalid CBOR: {e}")))?;
        let Value::Map(map) = value else {
            return Err(ProtocolError::malformed("expected map"));
        };

        let type_tag = text_field(&map, "type")?
            .ok_or_else(|| ProtocolError::malformed("missing type"))?;
        let user = text_field(&map, "user")?.unwrap_or_default();
        let hostname = text_field(&map, "hostname")?.unwrap_or_default();
        let payload = match field(&map, "payload") {
            Some(Value::Bytes(b)) => b.clone(),
            Some(_) => return Err(ProtocolError::malformed("payload must be bytes")),
            None => Vec::new(),
        };

        let message = match type_tag.parse::<MessageType>() {
            Ok(MessageType::History) => Message::History {
                user,
                hostname,
                payload,
            },
            Ok(MessageType::Stats) => Message::Stats { user, hostname },
            Ok(MessageType::Query) => {
                let params = field(&map, "query")
                    .ok_or_else(|| ProtocolError::malformed("missing query parameters"))
                    .and_then(QueryParams::from_value)?;
                Message::Query {
                    user,
                    hostname,
                    params,
                }
            }
            Ok(MessageType::Result) => Message::Result { payload },
            Err(_) => Message::Unsupported { type_tag },
        };
        Ok(message)
    }
}

pub(crate) fn field<'a>(map: &'a [(Value, Value)], name: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Text(t) if t == name))
        .map(|(_, v)| v)
}

pub(crate) fn text_field(map: &[(Value, Value)], name: &str) -> ProtocolResult<Option<String>> {
    match field(map, name) {
        Some(Value::Text(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ProtocolError::malformed(format!("{name} must be text"))),
        None => Ok(None),
    }
}

pub(crate) fn integer_field(map: &[(Value, Value)], name: &str) -> ProtocolResult<Option<i128>> {
    match field(map, name) {
        Some(Value::Integer(n)) => Ok(Some(i128::from(*n))),
        Some(_) => Err(ProtocolError::malformed(format!("{name} must be an integer"))),
        None => Ok(None),
    }
}

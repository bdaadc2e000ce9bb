//! One-shot sessions.

use crate::config::ClientConfig;
use crate::error::{SessionError, SessionResult};
use crate::transport::Transport;
use bashistdb_protocol::{Message, QueryParams};
use tracing::{debug, info_span, Span};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Upload raw `history` output.
    Import(Vec<u8>),
    /// Ask for the stats report.
    Stats,
    /// Run a filtered query.
    Query(QueryParams),
}

/// A client session.
pub struct SyncSession<T> {
    config: ClientConfig,
    transport: T,
    span: Span,
}

impl<T: Transport> SyncSession<T> {
    /// Creates a session.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let span = info_span!("session", user = %config.user, hostname = %config.hostname);
        Self {
            config,
            transport,
            span,
        }
    }

    /// The session's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session's transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds the single request message for `intent`.
    pub fn build_message(&self, intent: Intent) -> Message {
        let user = self.config.user.clone();
        let hostname = self.config.hostname.clone();
        match intent {
            Intent::Import(payload) => Message::history(user, hostname, payload),
            Intent::Stats => Message::stats(user, hostname),
            Intent::Query(params) => Message::query(user, hostname, params),
        }
    }

    /// Performs the exchange for `intent` and returns the reply text.
    ///
    /// # Errors
    ///
    /// Any transport or decode failure, or a reply that is not a result.
    pub fn run(&self, intent: Intent) -> SessionResult<String> {
        let request = self.build_message(intent);
        debug!(parent: &self.span, r#type = request.type_tag(), "sending request");

        match self.transport.exchange(&request)? {
            Message::Result { payload } => Ok(String::from_utf8_lossy(&payload).into_owned()),
            other => Err(SessionError::UnexpectedReply {
                type_tag: other.type_tag().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashistdb_protocol::{OutputFormat, ProtocolError};
    use std::cell::RefCell;

    struct Scripted {
        reply: SessionResult<Message>,
        seen: RefCell<Vec<Message>>,
    }

    impl Scripted {
        fn replying(reply: Message) -> Self {
            Self {
                reply: Ok(reply),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Scripted {
        fn exchange(&self, request: &Message) -> SessionResult<Message> {
            self.seen.borrow_mut().push(request.clone());
            match &self.reply {
                Ok(m) => Ok(m.clone()),
                Err(SessionError::Protocol(e)) => Err(SessionError::Protocol(e.clone())),
                Err(e) => Err(SessionError::local(e.to_string())),
            }
        }
    }

    fn session(transport: Scripted) -> SyncSession<Scripted> {
        SyncSession::new(ClientConfig::new("alice", "laptop"), transport)
    }

    #[test]
    fn builds_one_message_per_intent() {
        let s = session(Scripted::replying(Message::result("")));
        assert_eq!(
            s.build_message(Intent::Import(b"x".to_vec())),
            Message::history("alice", "laptop", b"x".to_vec())
        );
        assert_eq!(
            s.build_message(Intent::Stats),
            Message::stats("alice", "laptop")
        );
        let params = QueryParams::new().with_format(OutputFormat::Json);
        assert_eq!(
            s.build_message(Intent::Query(params.clone())),
            Message::query("alice", "laptop", params)
        );
    }

    #[test]
    fn returns_reply_text() {
        let s = session(Scripted::replying(Message::result("5: ls")));
        assert_eq!(s.run(Intent::Stats).unwrap(), "5: ls");
        assert_eq!(s.transport().seen.borrow().len(), 1);
    }

    #[test]
    fn non_result_reply_is_an_error() {
        let s = session(Scripted::replying(Message::stats("x", "y")));
        let err = s.run(Intent::Stats).unwrap_err();
        assert!(matches!(err, SessionError::UnexpectedReply { ref type_tag } if type_tag == "stats"));
    }

    #[test]
    fn transport_failure_is_not_retried() {
        let s = session(Scripted {
            reply: Err(SessionError::Protocol(ProtocolError::integrity("bad tag"))),
            seen: RefCell::new(Vec::new()),
        });
        assert!(matches!(
            s.run(Intent::Stats).unwrap_err(),
            SessionError::Protocol(_)
        ));
        assert_eq!(s.transport().seen.borrow().len(), 1);
    }
}

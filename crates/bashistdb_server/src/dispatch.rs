//! Request dispatch against the store.

use crate::error::ServerResult;
use bashistdb_protocol::Message;
use bashistdb_store::Store;
use tracing::{debug, warn};

/// Answers one request.
///
/// Always produces a `Result` message. Failures become the text of the
/// reply; a history upload that is not UTF-8 is rejected whole rather than
/// stored with replacement characters. `Result` and unrecognized messages
/// get an empty reply. This is blocking; async callers run it on the
/// blocking pool.
pub fn dispatch(store: &Store, message: Message) -> Message {
    let reply: ServerResult<String> = match message {
        Message::History {
            user,
            hostname,
            payload,
        } => match String::from_utf8(payload) {
            Ok(text) => store
                .import_history(&text, &user, &hostname)
                .map(|stats| stats.to_string())
                .map_err(Into::into),
            Err(e) => Err(e.into()),
        },
        Message::Stats { user, hostname } => {
            debug!(parent: store.span(), %user, %hostname, "stats request");
            store.stats_report().map_err(Into::into)
        }
        Message::Query {
            user,
            hostname,
            params,
        } => {
            debug!(parent: store.span(), %user, %hostname, "query request");
            store.run_query(&params).map_err(Into::into)
        }
        Message::Result { .. } => {
            debug!(parent: store.span(), "ignoring result message sent as a request");
            Ok(String::new())
        }
        Message::Unsupported { type_tag } => {
            debug!(parent: store.span(), %type_tag, "unsupported message type");
            Ok(String::new())
        }
    };

    match reply {
        Ok(text) => Message::result(text),
        Err(e) => {
            warn!(parent: store.span(), error = %e, "request failed");
            Message::result(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bashistdb_protocol::{OutputFormat, QueryParams};
    use bashistdb_store::StoreConfig;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(StoreConfig::new(dir.path().join("h.sqlite3"))).unwrap();
        (dir, store)
    }

    fn text(reply: &Message) -> &str {
        assert!(matches!(reply, Message::Result { .. }));
        std::str::from_utf8(reply.payload()).unwrap()
    }

    #[test]
    fn history_reply_is_summary() {
        let (_dir, store) = open_temp();
        let msg = Message::history(
            "alice",
            "laptop",
            b"1 2015-06-23T10:01:02+0300 ls -la\nbogus\n".to_vec(),
        );
        let reply = dispatch(&store, msg);
        assert_eq!(text(&reply), "Processed 2 entries, successful 1, failed 1.");
    }

    #[test]
    fn query_reply_renders() {
        let (_dir, store) = open_temp();
        dispatch(
            &store,
            Message::history("alice", "laptop", b"1 2015-06-23T10:01:02+0300 ls -la".to_vec()),
        );
        let params = QueryParams::new()
            .with_user("alice")
            .with_format(OutputFormat::Restore);
        let reply = dispatch(&store, Message::query("alice", "laptop", params));
        assert_eq!(text(&reply), "#1435042862\nls -la");
    }

    #[test]
    fn stats_reply_is_not_empty() {
        let (_dir, store) = open_temp();
        let reply = dispatch(&store, Message::stats("alice", "laptop"));
        assert_eq!(text(&reply), "Top-20 commands:\n\nLast 10 commands:");
    }

    #[test]
    fn benign_messages_get_empty_reply() {
        let (_dir, store) = open_temp();
        let reply = dispatch(&store, Message::result("stray"));
        assert_eq!(text(&reply), "");
        let reply = dispatch(
            &store,
            Message::Unsupported {
                type_tag: "PING".into(),
            },
        );
        assert_eq!(text(&reply), "");
    }

    #[test]
    fn non_utf8_history_is_rejected() {
        let (_dir, store) = open_temp();
        let msg = Message::history(
            "alice",
            "laptop",
            b"1 2015-06-23T10:01:02+0300 ls\n2 2015-06-23T10:01:03+0300 echo caf\xe9\n".to_vec(),
        );
        let reply = dispatch(&store, msg);
        assert!(text(&reply).starts_with("history upload is not valid UTF-8"));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn store_error_becomes_reply_text() {
        let (_dir, store) = open_temp();
        let msg = Message::history(
            "alice",
            "laptop",
            b"1 2015-06-23T10:01:02+0300 ls\n2 2015-99-23T10:01:02+0300 ls\n".to_vec(),
        );
        let reply = dispatch(&store, msg);
        assert!(text(&reply).contains("invalid timestamp"));
        assert_eq!(store.count().unwrap(), 0);
    }
}

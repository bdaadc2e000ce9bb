//! Property tests for the envelope codec.

use bashistdb_protocol::frame::LENGTH_PREFIX_SIZE;
use bashistdb_protocol::{
    envelope, Message, OutputFormat, ProtocolErrorKind, QueryOrder, QueryParams, SharedKey,
};
use proptest::prelude::*;

fn arb_params() -> impl Strategy<Value = QueryParams> {
    (
        "[a-z%_]{0,8}",
        "[a-z%_.-]{0,12}",
        ".{0,24}",
        any::<u32>(),
        prop_oneof![
            Just(OutputFormat::Plain),
            Just(OutputFormat::Restore),
            Just(OutputFormat::Json)
        ],
        prop_oneof![
            Just(QueryOrder::Recent),
            Just(QueryOrder::Frequent),
            Just(QueryOrder::Oldest)
        ],
    )
        .prop_map(|(user, host, command, limit, format, order)| QueryParams {
            user,
            host,
            command,
            limit,
            format,
            order,
        })
}

fn arb_message() -> impl Strategy<Value = Message> {
    let name = "[a-zA-Z0-9._-]{0,16}";
    prop_oneof![
        (name, name, prop::collection::vec(any::<u8>(), 0..512))
            .prop_map(|(u, h, p)| Message::history(u, h, p)),
        (name, name).prop_map(|(u, h)| Message::stats(u, h)),
        (name, name, arb_params()).prop_map(|(u, h, q)| Message::query(u, h, q)),
        prop::collection::vec(any::<u8>(), 0..512).prop_map(|p| Message::result(p)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roundtrip(message in arb_message(), passphrase in "[ -~]{1,32}") {
        let key = SharedKey::from_passphrase(&passphrase).unwrap();
        let wire = envelope::encode(&message, &key).unwrap();
        prop_assert_eq!(envelope::decode(&wire, &key).unwrap(), message);
    }

    #[test]
    fn tampering_never_yields_a_message(
        message in arb_message(),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let key = SharedKey::from_passphrase("tamper").unwrap();
        let mut wire = envelope::encode(&message, &key).unwrap();
        let i = position.index(wire.len());
        wire[i] ^= flip;

        let err = envelope::decode(&wire, &key).unwrap_err();
        if i < LENGTH_PREFIX_SIZE {
            prop_assert_eq!(err.kind(), ProtocolErrorKind::Transport);
        } else {
            prop_assert_eq!(err.kind(), ProtocolErrorKind::Integrity);
        }
    }

    #[test]
    fn truncation_never_yields_a_message(message in arb_message(), cut in any::<prop::sample::Index>()) {
        let key = SharedKey::from_passphrase("truncate").unwrap();
        let wire = envelope::encode(&message, &key).unwrap();
        let len = cut.index(wire.len());
        prop_assert!(envelope::decode(&wire[..len], &key).is_err());
    }
}

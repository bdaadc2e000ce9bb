//! Property-based test generators using proptest.

use bashistdb_protocol::{OutputFormat, QueryOrder, QueryParams};
use proptest::prelude::*;

/// Strategy for command texts: printable ASCII, no newlines, no leading
/// blank (the line parser eats those).
pub fn command_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[!-~][ -~]{0,59}").expect("Invalid regex")
}

/// Strategy for user and host names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9._-]{0,15}").expect("Invalid regex")
}

/// Strategy for lines that never match the history layout.
pub fn malformed_line_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z#][ -~]{0,40}").expect("Invalid regex")
}

/// Strategy for query parameters over the whole table.
pub fn query_params_strategy() -> impl Strategy<Value = QueryParams> {
    (
        0u32..50,
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
        .prop_map(|(limit, format, order)| {
            QueryParams::new()
                .with_limit(limit)
                .with_format(format)
                .with_order(order)
        })
}

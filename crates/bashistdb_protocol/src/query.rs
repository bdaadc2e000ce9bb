//! Query parameters carried by QUERY messages.

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{field, integer_field, text_field};
use ciborium::value::{Integer, Value};
use std::fmt;
use std::str::FromStr;

/// How a query result is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One human-readable line per row.
    #[default]
    Plain,
    /// Timestamped bash_history format (`#<epoch>` line, then the command).
    Restore,
    /// A JSON array of row objects.
    Json,
}

impl OutputFormat {
    /// Returns the wire name of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Restore => "restore",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(OutputFormat::Plain),
            "restore" | "bash_history" => Ok(OutputFormat::Restore),
            "json" => Ok(OutputFormat::Json),
            other => Err(ProtocolError::malformed(format!(
                "unknown output format: {other}"
            ))),
        }
    }
}

/// Which rows a query keeps when a limit applies, and their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryOrder {
    /// Most recent executions first.
    #[default]
    Recent,
    /// Most frequently executed commands first.
    Frequent,
    /// Oldest executions first.
    Oldest,
}

impl QueryOrder {
    /// Returns the wire name of this ordering.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOrder::Recent => "recent",
            QueryOrder::Frequent => "frequent",
            QueryOrder::Oldest => "oldest",
        }
    }
}

impl fmt::Display for QueryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryOrder {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(QueryOrder::Recent),
            "frequent" => Ok(QueryOrder::Frequent),
            "oldest" => Ok(QueryOrder::Oldest),
            other => Err(ProtocolError::malformed(format!("unknown order: {other}"))),
        }
    }
}

/// Filter for QUERY and STATS requests.
///
/// `user`, `host` and `command` are SQL `LIKE` patterns: `%` matches any
/// sequence, `_` matches one character and `\` escapes either.
/// A `limit` of zero means no limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    /// User pattern.
    pub user: String,
    /// Host pattern.
    pub host: String,
    /// Command pattern.
    pub command: String,
    /// Maximum number of rows (0 = unlimited).
    pub limit: u32,
    /// Rendering mode.
    pub format: OutputFormat,
    /// Ordering intent.
    pub order: QueryOrder,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            user: "%".into(),
            host: "%".into(),
            command: "%".into(),
            limit: 10,
            format: OutputFormat::Plain,
            order: QueryOrder::Recent,
        }
    }
}

impl QueryParams {
    /// Creates parameters matching everything, with the default limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the user pattern.
    pub fn with_user(mut self, pattern: impl Into<String>) -> Self {
        self.user = pattern.into();
        self
    }

    /// Sets the host pattern.
    pub fn with_host(mut self, pattern: impl Into<String>) -> Self {
        self.host = pattern.into();
        self
    }

    /// Sets the command pattern.
    pub fn with_command(mut self, pattern: impl Into<String>) -> Self {
        self.command = pattern.into();
        self
    }

    /// Sets the row limit (0 = unlimited).
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the ordering intent.
    pub fn with_order(mut self, order: QueryOrder) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::Text("user".into()), Value::Text(self.user.clone())),
            (Value::Text("host".into()), Value::Text(self.host.clone())),
            (
                Value::Text("command".into()),
                Value::Text(self.command.clone()),
            ),
            (
                Value::Text("limit".into()),
                Value::Integer(Integer::from(self.limit)),
            ),
            (
                Value::Text("format".into()),
                Value::Text(self.format.as_str().into()),
            ),
            (
                Value::Text("order".into()),
                Value::Text(self.order.as_str().into()),
            ),
        ])
    }

    pub(crate) fn from_value(value: &Value) -> ProtocolResult<Self> {
        let Value::Map(map) = value else {
            return Err(ProtocolError::malformed("query parameters must be a map"));
        };

        let defaults = Self::default();
        let user = text_field(map, "user")?.unwrap_or(defaults.user);
        let host = text_field(map, "host")?.unwrap_or(defaults.host);
        let command = text_field(map, "command")?.unwrap_or(defaults.command);
        let limit = match integer_field(map, "limit")? {
            Some(n) => u32::try_from(n)
                .map_err(|_| ProtocolError::malformed("query limit out of range"))?,
            None => defaults.limit,
        };
        let format = match field(map, "format") {
            Some(Value::Text(s)) => s.parse()?,
            Some(_) => return Err(ProtocolError::malformed("format must be text")),
            None => defaults.format,
        };
        let order = match field(map, "order") {
            Some(Value::Text(s)) => s.parse()?,
            Some(_) => return Err(ProtocolError::malformed("order must be text")),
            None => defaults.order,
        };

        Ok(Self {
            user,
            host,
            command,
            limit,
            format,
            order,
        })
    }
}

/// Escapes `text` so that it matches only itself as a `LIKE` pattern.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_everything() {
        let params = QueryParams::default();
        assert_eq!(params.user, "%");
        assert_eq!(params.host, "%");
        assert_eq!(params.command, "%");
        assert_eq!(params.limit, 10);
        assert_eq!(params.order, QueryOrder::Recent);
    }

    #[test]
    fn builder_pattern() {
        let params = QueryParams::new()
            .with_user("alice")
            .with_command("git %")
            .with_limit(0)
            .with_format(OutputFormat::Restore)
            .with_order(QueryOrder::Frequent);

        assert_eq!(params.user, "alice");
        assert_eq!(params.host, "%");
        assert_eq!(params.command, "git %");
        assert_eq!(params.limit, 0);
        assert_eq!(params.format, OutputFormat::Restore);
        assert_eq!(params.order, QueryOrder::Frequent);
    }

    #[test]
    fn format_names() {
        assert_eq!("bash_history".parse::<OutputFormat>().unwrap(), OutputFormat::Restore);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Plain.to_string(), "plain");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let value = Value::Map(vec![(
            Value::Text("user".into()),
            Value::Text("bob".into()),
        )]);
        let params = QueryParams::from_value(&value).unwrap();
        assert_eq!(params.user, "bob");
        assert_eq!(params.limit, QueryParams::default().limit);
    }

    #[test]
    fn negative_limit_is_malformed() {
        let value = Value::Map(vec![(
            Value::Text("limit".into()),
            Value::Integer(Integer::from(-1i64)),
        )]);
        assert!(QueryParams::from_value(&value).is_err());
    }

    #[test]
    fn escape_like_literals() {
        assert_eq!(escape_like("alice"), "alice");
        assert_eq!(escape_like("a_b%c\\d"), "a\\_b\\%c\\\\d");
    }
}

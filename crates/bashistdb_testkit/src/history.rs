//! Builders for `history` output.

use chrono::{DateTime, Duration, FixedOffset};

/// Timestamp layout bash prints with `HISTTIMEFORMAT="%FT%T%z "`.
pub const HISTTIMEFORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Renders one history line the way bash prints it.
pub fn history_line(number: usize, at: DateTime<FixedOffset>, command: &str) -> String {
    format!("{number:>5}  {} {command}", at.format(HISTTIMEFORMAT))
}

/// Builds `history` output line by line.
///
/// Each command is one second after the previous one.
#[derive(Debug, Clone)]
pub struct HistoryBuilder {
    lines: Vec<String>,
    next_number: usize,
    clock: DateTime<FixedOffset>,
}

impl HistoryBuilder {
    /// Starts at 2015-06-23T10:00:00+0300.
    pub fn new() -> Self {
        let clock = DateTime::parse_from_rfc3339("2015-06-23T10:00:00+03:00")
            .expect("valid start time");
        Self::starting_at(clock)
    }

    /// Starts at `clock`.
    pub fn starting_at(clock: DateTime<FixedOffset>) -> Self {
        Self {
            lines: Vec::new(),
            next_number: 1,
            clock,
        }
    }

    /// Appends a well-formed line.
    pub fn command(mut self, command: &str) -> Self {
        self.lines
            .push(history_line(self.next_number, self.clock, command));
        self.next_number += 1;
        self.clock += Duration::seconds(1);
        self
    }

    /// Appends several well-formed lines.
    pub fn commands<'a>(self, commands: impl IntoIterator<Item = &'a str>) -> Self {
        commands.into_iter().fold(self, |b, c| b.command(c))
    }

    /// Appends a line that does not match the history layout.
    pub fn malformed(mut self, text: &str) -> Self {
        self.lines.push(text.to_string());
        self
    }

    /// Appends a line whose timestamp has the right shape but no valid date.
    pub fn impossible_timestamp(mut self, command: &str) -> Self {
        self.lines
            .push(format!("{:>5}  2015-19-45T10:00:00+0300 {command}", self.next_number));
        self.next_number += 1;
        self
    }

    /// Number of lines so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no lines were added.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Joins the lines, each terminated by a newline.
    pub fn build(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl Default for HistoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Record formatting
//!
//! Renders a `LogEvent` into the line layout persisted to the log file:
//! `2026/01/21 14:30:45 [INFO] message`, followed by the failure trace if any.

use super::record::{LogEvent, Severity};

/// Date-time layout used for every record
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Renders log events into text. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct RecordFormatter {
    date_format: String,
}

impl Default for RecordFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl RecordFormatter {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    /// Render an event as `<date-time> [<SEVERITY>] <message>\n[trace]`
    pub fn format(&self, event: &LogEvent) -> String {
        let mut line = format!(
            "{} [{}] {}\n",
            event.timestamp.format(&self.date_format),
            event.severity.label(),
            event.message
        );
        if let Some(failure) = &event.failure {
            line.push_str(&failure.render());
        }
        line
    }
}

/// Recover the severity from a rendered record line
///
/// Returns `None` if the line carries no bracketed severity token.
pub fn parse_severity_token(line: &str) -> Option<Severity> {
    let open = line.find(" [")?;
    let rest = &line[open + 2..];
    let close = rest.find("] ")?;
    let token = &rest[..close];
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    token.parse().ok()
}

//! Log record data model
//!
//! A `LogEvent` is immutable once built. It is rendered once by the formatter and
//! appended once by the rotating sink.

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};

/// Coarse importance of a log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Severe,
    /// Any label outside the three launcher levels (e.g. `debug` from tracing)
    Other(String),
}

impl Severity {
    /// Label as it appears between the brackets of a rendered record
    pub fn label(&self) -> String {
        match self {
            Severity::Info => "INFO".to_string(),
            Severity::Warning => "WARNING".to_string(),
            Severity::Severe => "SEVERE".to_string(),
            Severity::Other(raw) => raw.to_uppercase(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Severity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "INFO" => Severity::Info,
            "WARNING" => Severity::Warning,
            "SEVERE" => Severity::Severe,
            _ => Severity::Other(s.to_string()),
        })
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Severe,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            other => Severity::Other(other.as_str().to_string()),
        }
    }
}

/// A rendered failure: message, originating frames, and the chain of causes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureTrace {
    pub message: String,
    pub frames: Vec<String>,
    pub cause: Option<Box<FailureTrace>>,
}

impl FailureTrace {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
            cause: None,
        }
    }

    pub fn with_frames(mut self, frames: Vec<String>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_cause(mut self, cause: FailureTrace) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Build a trace from an error and its `source()` chain.
    ///
    /// Errors carry no frames of their own, so the frames are captured at the
    /// point the failure is being logged.
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(inner) = source {
            causes.push(FailureTrace::new(inner.to_string()));
            source = inner.source();
        }

        let mut trace = FailureTrace::new(err.to_string())
            .with_frames(capture_frames(&Backtrace::force_capture()));
        let chain = causes
            .into_iter()
            .rev()
            .reduce(|inner, outer| outer.with_cause(inner));
        if let Some(chain) = chain {
            trace = trace.with_cause(chain);
        }
        trace
    }

    /// Multi-line text appended after the record line
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(&self.message);
        out.push('\n');
        for frame in &self.frames {
            out.push_str("\tat ");
            out.push_str(frame);
            out.push('\n');
        }
        if let Some(cause) = &self.cause {
            out.push_str("Caused by: ");
            cause.render_into(out);
        }
    }
}

/// Split a captured backtrace into one entry per non-empty line
pub fn capture_frames(backtrace: &Backtrace) -> Vec<String> {
    backtrace
        .to_string()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A single log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    /// Which logger or bridged stream produced the record
    pub source_label: String,
    pub message: String,
    pub failure: Option<FailureTrace>,
}

impl LogEvent {
    /// Create an event stamped with the current local time
    pub fn new(
        severity: Severity,
        source_label: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            source_label: source_label.into(),
            message: message.into(),
            failure: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_failure(mut self, failure: FailureTrace) -> Self {
        self.failure = Some(failure);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "download failed")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Info.label(), "INFO");
        assert_eq!(Severity::Warning.label(), "WARNING");
        assert_eq!(Severity::Severe.label(), "SEVERE");
        assert_eq!(Severity::Other("fine".into()).label(), "FINE");
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("info".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("SEVERE".parse::<Severity>().unwrap(), Severity::Severe);
        assert_eq!(
            "DEBUG".parse::<Severity>().unwrap(),
            Severity::Other("DEBUG".into())
        );
    }

    #[test]
    fn test_severity_from_tracing_level() {
        assert_eq!(Severity::from(&tracing::Level::ERROR), Severity::Severe);
        assert_eq!(Severity::from(&tracing::Level::WARN), Severity::Warning);
        assert_eq!(Severity::from(&tracing::Level::INFO), Severity::Info);
        assert_eq!(Severity::from(&tracing::Level::DEBUG).label(), "DEBUG");
    }

    #[test]
    fn test_failure_from_error_chain() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "connection reset"));
        let trace = FailureTrace::from_error(&err);

        assert_eq!(trace.message, "download failed");
        assert_eq!(trace.cause.as_ref().unwrap().message, "connection reset");

        let rendered = trace.render();
        assert!(rendered.starts_with("download failed\n"));
        assert!(rendered.contains("Caused by: connection reset\n"));
    }

    #[test]
    fn test_failure_render_frames() {
        let trace =
            FailureTrace::new("boom").with_frames(vec!["main.rs:10".into(), "lib.rs:4".into()]);
        assert_eq!(trace.render(), "boom\n\tat main.rs:10\n\tat lib.rs:4\n");
    }
}

//! Logger handle
//!
//! The bootstrap code owns one `Logger` and hands out `Arc` clones to every
//! component that records diagnostics: the stream bridges, the tracing layer,
//! the panic hook and the orchestrator itself.

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::record::{FailureTrace, LogEvent, Severity};
use super::rotating::RotatingSink;

/// Records events into the rotating sink
pub struct Logger {
    name: String,
    sink: Arc<RotatingSink>,
    /// Debug mode: also print every record to the original standard error
    echo_to_stderr: bool,
    failed_writes: AtomicU64,
}

impl Logger {
    pub fn new(name: impl Into<String>, sink: Arc<RotatingSink>) -> Self {
        Self {
            name: name.into(),
            sink,
            echo_to_stderr: false,
            failed_writes: AtomicU64::new(0),
        }
    }

    pub fn with_stderr_echo(mut self, echo: bool) -> Self {
        self.echo_to_stderr = echo;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sink(&self) -> &Arc<RotatingSink> {
        &self.sink
    }

    /// Number of records the sink failed to persist
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Append an event to the log.
    ///
    /// Write failures are counted, never reported through the process
    /// streams: with the bridge installed that report would loop back here.
    pub fn log(&self, event: LogEvent) {
        if self.sink.write(&event).is_err() {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
        }
        if self.echo_to_stderr {
            eprint!("{}", self.sink.formatter().format(&event));
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogEvent::new(Severity::Info, self.name.as_str(), message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogEvent::new(Severity::Warning, self.name.as_str(), message));
    }

    pub fn severe(&self, message: impl Into<String>, failure: Option<FailureTrace>) {
        let mut event = LogEvent::new(Severity::Severe, self.name.as_str(), message);
        event.failure = failure;
        self.log(event);
    }

    /// Log an error and its cause chain at SEVERE
    pub fn error(&self, message: impl Into<String>, err: &(dyn Error + 'static)) {
        self.severe(message, Some(FailureTrace::from_error(err)));
    }
}

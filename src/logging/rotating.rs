//! Date-based rotating file sink
//!
//! The sink writes into a file whose name is derived from a path template by
//! substituting `%D` with the current date (`techniclauncher_%D.log` becomes
//! `techniclauncher_2026-01-21.log`). Writes never rotate; every flush checks the
//! wall-clock date first and re-targets the sink if the day has changed.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, NaiveDate};

use super::formatter::RecordFormatter;
use super::record::{LogEvent, Severity};
use super::LoggingError;

/// Placeholder replaced by the current date in a path template
pub const DATE_PLACEHOLDER: &str = "%D";

const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of wall-clock time for rotation decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real local clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Expand a path template for the given date
pub fn path_for_date(template: &str, date: NaiveDate) -> PathBuf {
    PathBuf::from(template.replace(DATE_PLACEHOLDER, &date.format(FILE_DATE_FORMAT).to_string()))
}

struct RotationState {
    template: String,
    current_date: NaiveDate,
    current_path: PathBuf,
    handle: Option<BufWriter<File>>,
    /// Rotation failure and when it happened, waiting for the next write
    pending_diagnostic: Option<(String, DateTime<Local>)>,
}

fn open_append(path: &Path) -> Result<BufWriter<File>, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(BufWriter::new)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialized, date-rotating log file
pub struct RotatingSink {
    formatter: RecordFormatter,
    clock: Arc<dyn Clock>,
    state: Mutex<RotationState>,
}

impl RotatingSink {
    /// Open the sink for today's date.
    ///
    /// A failure to open the initial file is reported on standard error and
    /// retried on every flush; writes made in the meantime are dropped.
    pub fn open(
        template: impl Into<String>,
        formatter: RecordFormatter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let template = template.into();
        let current_date = clock.now().date_naive();
        let current_path = path_for_date(&template, current_date);

        let handle = match open_append(&current_path) {
            Ok(handle) => Some(handle),
            Err(e) => {
                eprintln!("{}", e);
                None
            }
        };

        Self {
            formatter,
            clock,
            state: Mutex::new(RotationState {
                template,
                current_date,
                current_path,
                handle,
                pending_diagnostic: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn formatter(&self) -> &RecordFormatter {
        &self.formatter
    }

    /// Path of the file currently receiving writes
    pub fn current_path(&self) -> PathBuf {
        self.lock().current_path.clone()
    }

    pub fn current_date(&self) -> NaiveDate {
        self.lock().current_date
    }

    /// Format and append a record to the open file. Never rotates.
    ///
    /// The sink lock is never held while formatting.
    pub fn write(&self, event: &LogEvent) -> Result<(), LoggingError> {
        let pending = self.lock().pending_diagnostic.take();
        let diagnostic = pending.as_ref().map(|(message, at)| {
            let event =
                LogEvent::new(Severity::Warning, "RotatingSink", message.as_str()).at(*at);
            self.formatter.format(&event)
        });
        let text = self.formatter.format(event);

        let mut state = self.lock();
        if state.handle.is_none() {
            if state.pending_diagnostic.is_none() {
                state.pending_diagnostic = pending;
            }
            return Ok(());
        }

        let path = state.current_path.clone();
        let Some(handle) = state.handle.as_mut() else {
            return Ok(());
        };
        if let Some(diagnostic) = diagnostic {
            handle
                .write_all(diagnostic.as_bytes())
                .map_err(|source| LoggingError::Write { path: path.clone(), source })?;
        }
        handle
            .write_all(text.as_bytes())
            .map_err(|source| LoggingError::Write { path, source })
    }

    /// Rotate if the date has changed, then persist buffered bytes.
    ///
    /// A rotation failure keeps the previous handle and is recorded as a
    /// diagnostic for the next write; only the final flush can fail.
    pub fn flush(&self) -> Result<(), LoggingError> {
        let now = self.clock.now();
        let today = now.date_naive();
        let mut state = self.lock();

        let expected = path_for_date(&state.template, today);
        if expected != state.current_path || state.handle.is_none() {
            match open_append(&expected) {
                Ok(new_handle) => {
                    if let Some(mut old) = state.handle.replace(new_handle) {
                        let _ = old.flush();
                    }
                    state.current_date = today;
                    state.current_path = expected;
                }
                Err(e) => {
                    state.pending_diagnostic = Some((format!("Log rotation failed: {}", e), now));
                }
            }
        }

        let path = state.current_path.clone();
        match state.handle.as_mut() {
            Some(handle) => handle
                .flush()
                .map_err(|source| LoggingError::Flush { path, source }),
            None => Ok(()),
        }
    }
}

impl Drop for RotatingSink {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().handle.as_mut() {
            let _ = handle.flush();
        }
    }
}

/// Manually advanced clock for rotation tests
#[cfg(test)]
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(now: DateTime<Local>) -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(now) })
    }

    pub(crate) fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap() = now;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

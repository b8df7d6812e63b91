//! Logging system for the launcher
//!
//! Provides the date-rotating log file, the record formatter, the bridges that
//! turn process output into log records, and the process-wide fault backstop.

mod bridge;
mod fault;
mod formatter;
mod layer;
mod logger;
mod record;
mod redirect;
mod retention;
mod rotating;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use bridge::{ConsoleSlot, OutputStreams, SharedStream, StreamBridge, StreamSource};
pub use fault::{install_panic_hook, panic_event};
pub use formatter::{parse_severity_token, RecordFormatter, DEFAULT_DATE_FORMAT};
pub use layer::{init_tracing, LauncherLayer};
pub use logger::Logger;
pub use record::{FailureTrace, LogEvent, Severity};
pub use redirect::CapturedStream;
#[cfg(unix)]
pub use redirect::capture_fd;
pub use retention::{cleanup_old_logs, DEFAULT_RETENTION_DAYS, LOG_FILE_PREFIX};
pub use rotating::{path_for_date, Clock, RotatingSink, SystemClock, DATE_PLACEHOLDER};

#[cfg(test)]
pub(crate) use rotating::ManualClock;

/// Serializes tests that replace the process-wide panic hook
#[cfg(test)]
pub(crate) static PANIC_HOOK_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Errors raised by the log file sink
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write log file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to flush log file {}: {source}", path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Name of the launcher logger
pub const LOGGER_NAME: &str = "launcher";

/// File name template for dated launcher logs
pub fn log_file_template(logs_dir: &Path) -> String {
    logs_dir
        .join(format!("{}{}.log", LOG_FILE_PREFIX, DATE_PLACEHOLDER))
        .to_string_lossy()
        .into_owned()
}

/// How the logging system should be wired
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOptions {
    /// Leave the process streams alone and echo records to stderr
    pub debug_mode: bool,
    /// Redirect the real stdout/stderr descriptors into the bridges
    pub capture_process_streams: bool,
    /// Install the global tracing subscriber
    pub install_tracing: bool,
}

/// Everything the logger construction step hands back to its owner
pub struct LoggingSystem {
    pub logger: Arc<Logger>,
    /// Output capability for subsystems that would write to stdout/stderr
    pub streams: OutputStreams,
    /// Where a console attaches to receive bridged output
    pub console: ConsoleSlot,
    /// Redirected descriptors (empty unless capture was requested)
    pub captured: Vec<CapturedStream>,
}

impl LoggingSystem {
    /// Handle to the real terminal, if stdout was captured
    pub fn terminal(&self) -> Option<fs::File> {
        self.captured.first().and_then(|c| c.original().ok())
    }
}

/// Build the rotating sink and logger, and bridge the process streams unless
/// running in debug mode.
pub fn init_file_logging(
    logs_dir: &Path,
    clock: Arc<dyn Clock>,
    options: LoggingOptions,
) -> LoggingSystem {
    if let Err(e) = fs::create_dir_all(logs_dir) {
        eprintln!("Failed to create logs directory {}: {}", logs_dir.display(), e);
    }

    let sink = RotatingSink::open(log_file_template(logs_dir), RecordFormatter::default(), clock);
    let logger = Arc::new(
        Logger::new(LOGGER_NAME, Arc::new(sink)).with_stderr_echo(options.debug_mode),
    );
    let console = ConsoleSlot::new();

    if options.install_tracing && !init_tracing(Arc::clone(&logger)) {
        logger.warning("A global tracing subscriber was already installed");
    }

    if options.debug_mode {
        return LoggingSystem {
            logger,
            streams: OutputStreams::process(),
            console,
            captured: Vec::new(),
        };
    }

    let streams = OutputStreams::bridged(Arc::clone(&logger), console.clone());
    let captured = if options.capture_process_streams {
        capture_process_streams(&logger, &streams)
    } else {
        Vec::new()
    };

    LoggingSystem {
        logger,
        streams,
        console,
        captured,
    }
}

#[cfg(unix)]
fn capture_process_streams(logger: &Logger, streams: &OutputStreams) -> Vec<CapturedStream> {
    use std::io::Write;

    // Anything still sitting in std's stdout buffer belongs to the terminal
    let _ = std::io::stdout().flush();

    let mut captured = Vec::new();
    for (fd, stream) in [(1, &streams.out), (2, &streams.err)] {
        match capture_fd(fd, stream.clone()) {
            Ok(c) => captured.push(c),
            Err(e) => logger.warning(format!("Failed to capture descriptor {}: {}", fd, e)),
        }
    }
    captured
}

#[cfg(not(unix))]
fn capture_process_streams(logger: &Logger, _streams: &OutputStreams) -> Vec<CapturedStream> {
    logger.warning("Process stream capture is not supported on this platform");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_template() {
        let template = log_file_template(Path::new("/home/user/.technic/logs"));
        assert_eq!(template, "/home/user/.technic/logs/techniclauncher_%D.log");
    }

    #[test]
    fn test_init_creates_logs_dir_and_bridges() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let system = init_file_logging(&logs, Arc::new(SystemClock), LoggingOptions::default());

        assert!(logs.is_dir());
        assert!(system.captured.is_empty());
        assert!(system.terminal().is_none());

        let mut out = system.streams.out.clone();
        out.write_all(b"through the bridge\n").unwrap();
        out.flush().unwrap();
        system.streams.err.emit_line("an error").unwrap();
        system.logger.sink().flush().unwrap();

        let content = std::fs::read_to_string(system.logger.sink().current_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] through the bridge"));
        assert!(lines[1].ends_with("[SEVERE] an error"));
    }

    #[test]
    fn test_init_debug_mode_skips_bridge() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let options = LoggingOptions {
            debug_mode: true,
            ..LoggingOptions::default()
        };
        let system = init_file_logging(&logs, Arc::new(SystemClock), options);

        system.streams.out.emit_line("straight to the terminal").unwrap();
        system.logger.sink().flush().unwrap();

        let content = std::fs::read_to_string(system.logger.sink().current_path()).unwrap();
        assert!(content.is_empty());
    }
}

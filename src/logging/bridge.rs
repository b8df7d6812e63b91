//! Stream-to-logger bridge
//!
//! A `StreamBridge` looks like any other byte sink, so it can stand in for the
//! process standard output or standard error. Bytes accumulate until `flush`,
//! and each flush turns the accumulated text into at most one log record.
//! Lines are never split out of a flush: several lines written between two
//! flushes become a single record.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::console::ConsoleView;

use super::logger::Logger;
use super::record::{LogEvent, Severity};

/// Which original process stream a bridge replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl StreamSource {
    /// Source label recorded on every event from this stream
    pub fn label(&self) -> &'static str {
        match self {
            StreamSource::Stdout => "stdout",
            StreamSource::Stderr => "stderr",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            StreamSource::Stdout => Severity::Info,
            StreamSource::Stderr => Severity::Severe,
        }
    }
}

/// Weak, replaceable reference to the active console
///
/// Shared by both bridges. Attaching a new console replaces the old one
/// without touching the log file.
#[derive(Clone, Default)]
pub struct ConsoleSlot {
    inner: Arc<RwLock<Option<Weak<dyn ConsoleView>>>>,
}

impl ConsoleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, console: &Arc<dyn ConsoleView>) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(Arc::downgrade(console));
        }
    }

    pub fn detach(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }

    /// The attached console, if it is still alive
    pub fn current(&self) -> Option<Arc<dyn ConsoleView>> {
        self.inner
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().and_then(Weak::upgrade))
    }
}

/// Strip a single trailing line terminator
fn strip_line_terminator(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Adapts a byte stream into log records
pub struct StreamBridge {
    buffer: Vec<u8>,
    severity: Severity,
    source: StreamSource,
    logger: Arc<Logger>,
    console: ConsoleSlot,
}

impl StreamBridge {
    pub fn new(
        source: StreamSource,
        severity: Severity,
        logger: Arc<Logger>,
        console: ConsoleSlot,
    ) -> Self {
        Self {
            buffer: Vec::new(),
            severity,
            source,
            logger,
            console,
        }
    }

    pub fn source(&self) -> StreamSource {
        self.source
    }

    /// Bytes written since the last flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn emit(&mut self) {
        let raw = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();

        let text = strip_line_terminator(&raw);
        if text.is_empty() {
            return;
        }

        self.logger
            .log(LogEvent::new(self.severity.clone(), self.source.label(), text));

        if let Some(console) = self.console.current() {
            console.log(&format!("{}\n", text));
        }
    }
}

impl Write for StreamBridge {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit();
        Ok(())
    }
}

/// Thread-safe handle to an output stream, cloned into every writer
#[derive(Clone)]
pub struct SharedStream {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedStream {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write a line and flush it under one lock, like an auto-flushing `println`
    pub fn emit_line(&self, text: &str) -> io::Result<()> {
        let mut writer = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    /// Write raw bytes and flush them as one record
    pub fn emit(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.write_all(bytes)?;
        writer.flush()
    }
}

impl Write for SharedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .flush()
    }
}

/// The output capability handed to every subsystem instead of the raw
/// process streams
#[derive(Clone)]
pub struct OutputStreams {
    pub out: SharedStream,
    pub err: SharedStream,
}

impl OutputStreams {
    /// The real process streams (debug mode)
    pub fn process() -> Self {
        Self {
            out: SharedStream::new(io::stdout()),
            err: SharedStream::new(io::stderr()),
        }
    }

    /// Streams that feed the logger and the console
    pub fn bridged(logger: Arc<Logger>, console: ConsoleSlot) -> Self {
        let out = StreamBridge::new(
            StreamSource::Stdout,
            StreamSource::Stdout.default_severity(),
            Arc::clone(&logger),
            console.clone(),
        );
        let err = StreamBridge::new(
            StreamSource::Stderr,
            StreamSource::Stderr.default_severity(),
            logger,
            console,
        );
        Self {
            out: SharedStream::new(out),
            err: SharedStream::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::formatter::parse_severity_token;
    use crate::logging::rotating::{RotatingSink, SystemClock};
    use crate::logging::RecordFormatter;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingConsole {
        texts: Mutex<Vec<String>>,
    }

    impl ConsoleView for RecordingConsole {
        fn log(&self, text: &str) {
            self.texts.lock().unwrap().push(text.to_string());
        }
        fn show(&self) {}
        fn hide(&self) {}
        fn dispose(&self) {}
    }

    fn test_logger(dir: &TempDir) -> Arc<Logger> {
        let template = dir.path().join("techniclauncher_%D.log").to_string_lossy().into_owned();
        let sink = RotatingSink::open(template, RecordFormatter::default(), Arc::new(SystemClock));
        Arc::new(Logger::new("launcher", Arc::new(sink)))
    }

    fn log_lines(logger: &Logger) -> Vec<String> {
        logger.sink().flush().unwrap();
        std::fs::read_to_string(logger.sink().current_path())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_hello_reaches_log_and_console() {
        let dir = TempDir::new().unwrap();
        let logger = test_logger(&dir);
        let slot = ConsoleSlot::new();
        let recording = Arc::new(RecordingConsole::default());
        let console: Arc<dyn ConsoleView> = recording.clone();
        slot.attach(&console);

        let mut bridge =
            StreamBridge::new(StreamSource::Stdout, Severity::Info, Arc::clone(&logger), slot);
        bridge.write_all(b"Hello\n").unwrap();
        bridge.flush().unwrap();

        let lines = log_lines(&logger);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" [INFO] Hello"), "got {}", lines[0]);
        assert_eq!(*recording.texts.lock().unwrap(), vec!["Hello\n".to_string()]);
    }

    #[test]
    fn test_empty_flush_produces_no_event() {
        let dir = TempDir::new().unwrap();
        let logger = test_logger(&dir);
        let mut bridge = StreamBridge::new(
            StreamSource::Stdout,
            Severity::Info,
            Arc::clone(&logger),
            ConsoleSlot::new(),
        );

        bridge.flush().unwrap();
        bridge.write_all(b"\n").unwrap();
        bridge.flush().unwrap();
        bridge.write_all(b"\r\n").unwrap();
        bridge.flush().unwrap();

        assert!(log_lines(&logger).is_empty());
        assert_eq!(bridge.pending(), 0);
    }

    #[test]
    fn test_lines_between_flushes_coalesce() {
        let dir = TempDir::new().unwrap();
        let logger = test_logger(&dir);
        let mut bridge = StreamBridge::new(
            StreamSource::Stderr,
            Severity::Severe,
            Arc::clone(&logger),
            ConsoleSlot::new(),
        );

        bridge.write_all(b"first\n").unwrap();
        bridge.write_all(b"second\n").unwrap();
        bridge.flush().unwrap();

        let lines = log_lines(&logger);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" [SEVERE] first"));
        assert_eq!(lines[1], "second");
    }

    #[test]
    fn test_dropped_console_is_skipped() {
        let dir = TempDir::new().unwrap();
        let logger = test_logger(&dir);
        let slot = ConsoleSlot::new();
        {
            let console: Arc<dyn ConsoleView> = Arc::new(RecordingConsole::default());
            slot.attach(&console);
        }
        assert!(slot.current().is_none());

        let mut bridge =
            StreamBridge::new(StreamSource::Stdout, Severity::Info, Arc::clone(&logger), slot);
        bridge.write_all(b"no console\n").unwrap();
        bridge.flush().unwrap();
        assert_eq!(log_lines(&logger).len(), 1);
    }

    #[test]
    fn test_interleaved_streams_and_flushes_write_whole_records() {
        let dir = TempDir::new().unwrap();
        let logger = test_logger(&dir);
        let streams = OutputStreams::bridged(Arc::clone(&logger), ConsoleSlot::new());

        let mut handles = Vec::new();
        for (stream, tag) in [(streams.out.clone(), "out"), (streams.err.clone(), "err")] {
            for worker in 0..2 {
                let stream = stream.clone();
                handles.push(std::thread::spawn(move || {
                    for i in 0..150 {
                        stream.emit_line(&format!("{}-{}-{}", tag, worker, i)).unwrap();
                    }
                }));
            }
        }
        let flusher = {
            let sink = Arc::clone(logger.sink());
            std::thread::spawn(move || {
                for _ in 0..50 {
                    sink.flush().unwrap();
                    std::thread::yield_now();
                }
            })
        };
        for handle in handles {
            handle.join().unwrap();
        }
        flusher.join().unwrap();

        let lines = log_lines(&logger);
        assert_eq!(lines.len(), 600);
        for line in &lines {
            let severity = parse_severity_token(line).expect("severity token");
            let message = line.split("] ").nth(1).unwrap();
            match severity {
                Severity::Info => assert!(message.starts_with("out-")),
                Severity::Severe => assert!(message.starts_with("err-")),
                other => panic!("unexpected severity {}", other),
            }
            assert_eq!(message.split('-').count(), 3);
        }
    }
}

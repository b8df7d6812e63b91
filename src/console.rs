//! Launcher console
//!
//! The console is an optional live view of everything written to the process
//! output streams. It is never required for correctness: the stream bridges
//! only hold a weak reference to it.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

/// Default number of lines a console keeps
pub const DEFAULT_CONSOLE_LINES: usize = 2500;

/// Contract the bootstrap code needs from a console window
pub trait ConsoleView: Send + Sync {
    /// Append raw text (already line-terminated)
    fn log(&self, text: &str);
    fn show(&self);
    fn hide(&self);
    /// Release the view; later `log` calls are ignored
    fn dispose(&self);
}

/// Ring buffer of the most recent console lines
pub struct ConsoleBuffer {
    lines: RwLock<VecDeque<String>>,
    max_lines: usize,
    visible: AtomicBool,
    disposed: AtomicBool,
}

impl ConsoleBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: RwLock::new(VecDeque::with_capacity(max_lines.min(1024))),
            max_lines,
            visible: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Snapshot of the buffered lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .read()
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lines.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl ConsoleView for ConsoleBuffer {
    fn log(&self, text: &str) {
        if self.is_disposed() || self.max_lines == 0 {
            return;
        }
        if let Ok(mut lines) = self.lines.write() {
            for line in text.lines() {
                if lines.len() >= self.max_lines {
                    lines.pop_front();
                }
                lines.push_back(line.to_string());
            }
        }
    }

    fn show(&self) {
        if !self.is_disposed() {
            self.visible.store(true, Ordering::Release);
        }
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::Release);
    }

    fn dispose(&self) {
        self.visible.store(false, Ordering::Release);
        self.disposed.store(true, Ordering::Release);
        if let Ok(mut lines) = self.lines.write() {
            lines.clear();
        }
    }
}

/// Console that also echoes to the real terminal while visible
///
/// The terminal handle is the duplicate of the original descriptor kept by
/// stream capture, so echoing never loops back into the bridge.
pub struct TerminalConsole {
    buffer: ConsoleBuffer,
    terminal: Option<Mutex<File>>,
}

impl TerminalConsole {
    pub fn new(max_lines: usize, terminal: Option<File>) -> Self {
        Self {
            buffer: ConsoleBuffer::new(max_lines),
            terminal: terminal.map(Mutex::new),
        }
    }

    pub fn buffer(&self) -> &ConsoleBuffer {
        &self.buffer
    }
}

impl ConsoleView for TerminalConsole {
    fn log(&self, text: &str) {
        self.buffer.log(text);
        if !self.buffer.is_visible() {
            return;
        }
        if let Some(terminal) = &self.terminal {
            if let Ok(mut terminal) = terminal.lock() {
                let _ = terminal.write_all(text.as_bytes());
                let _ = terminal.flush();
            }
        }
    }

    fn show(&self) {
        self.buffer.show();
    }

    fn hide(&self) {
        self.buffer.hide();
    }

    fn dispose(&self) {
        self.buffer.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_console_buffer_capacity() {
        let console = ConsoleBuffer::new(3);
        for i in 0..5 {
            console.log(&format!("line {}\n", i));
        }

        assert_eq!(console.lines(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_console_buffer_splits_multiline_text() {
        let console = ConsoleBuffer::new(10);
        console.log("first\nsecond\n");
        assert_eq!(console.len(), 2);
    }

    #[test]
    fn test_console_visibility_lifecycle() {
        let console = ConsoleBuffer::new(10);
        assert!(!console.is_visible());

        console.show();
        assert!(console.is_visible());
        console.hide();
        assert!(!console.is_visible());

        console.log("kept\n");
        console.dispose();
        assert!(console.is_disposed());
        assert!(console.is_empty());

        console.show();
        console.log("ignored\n");
        assert!(!console.is_visible());
        assert!(console.is_empty());
    }

    #[test]
    fn test_terminal_console_echoes_only_when_visible() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("terminal.txt");
        let file = File::create(&path).unwrap();

        let console = TerminalConsole::new(10, Some(file));
        console.log("hidden\n");
        console.show();
        console.log("shown\n");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "shown\n");
        assert_eq!(console.buffer().lines(), vec!["hidden", "shown"]);
    }
}

//! Final flush on teardown
//!
//! `ShutdownHook::run` performs one best-effort flush and never fails. It is
//! reached from three places: the guard's `Drop` on normal exit, the SIGINT
//! and SIGTERM handler, and the relaunch exit path (process exit skips
//! destructors).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::logging::RotatingSink;

/// One-shot best-effort flush of the log sink
pub struct ShutdownHook {
    sink: Arc<RotatingSink>,
    fired: AtomicBool,
}

impl ShutdownHook {
    pub fn new(sink: Arc<RotatingSink>) -> Arc<Self> {
        Arc::new(Self {
            sink,
            fired: AtomicBool::new(false),
        })
    }

    /// Register the hook; the returned guard runs it when dropped
    pub fn register(sink: Arc<RotatingSink>) -> ShutdownGuard {
        ShutdownGuard {
            hook: Self::new(sink),
        }
    }

    /// Flush once. Later calls are no-ops. Errors are swallowed.
    pub fn run(&self) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.sink.flush();
    }

    pub fn has_run(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Keeps the shutdown hook registered for the process lifetime
pub struct ShutdownGuard {
    hook: Arc<ShutdownHook>,
}

impl ShutdownGuard {
    /// Shared handle for signal handlers
    pub fn hook(&self) -> Arc<ShutdownHook> {
        Arc::clone(&self.hook)
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.hook.run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogEvent, RecordFormatter, Severity, SystemClock};
    use tempfile::TempDir;

    fn test_sink(dir: &TempDir) -> Arc<RotatingSink> {
        let template = dir.path().join("techniclauncher_%D.log").to_string_lossy().into_owned();
        Arc::new(RotatingSink::open(template, RecordFormatter::default(), Arc::new(SystemClock)))
    }

    #[test]
    fn test_guard_drop_flushes_buffered_records() {
        let dir = TempDir::new().unwrap();
        let sink = test_sink(&dir);

        let guard = ShutdownHook::register(Arc::clone(&sink));
        let hook = guard.hook();
        sink.write(&LogEvent::new(Severity::Info, "test", "last words")).unwrap();
        assert_eq!(std::fs::read_to_string(sink.current_path()).unwrap(), "");

        drop(guard);
        assert!(hook.has_run());
        assert!(std::fs::read_to_string(sink.current_path())
            .unwrap()
            .contains("[INFO] last words"));
    }

    #[test]
    fn test_hook_runs_once() {
        let dir = TempDir::new().unwrap();
        let sink = test_sink(&dir);
        let hook = ShutdownHook::new(Arc::clone(&sink));

        hook.run();
        sink.write(&LogEvent::new(Severity::Info, "test", "after hook")).unwrap();
        hook.run();

        assert_eq!(std::fs::read_to_string(sink.current_path()).unwrap(), "");
    }
}

//! Periodic log flush
//!
//! Bounds data loss on abnormal termination to one flush interval. Rotation
//! latency is bounded by the same interval, since every flush re-checks the date.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::logging::RotatingSink;

/// Default time between flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to the background flush task
///
/// The task is never joined on teardown; dropping the runtime abandons it.
pub struct FlushDaemon {
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl FlushDaemon {
    /// Start flushing `sink` every `interval`
    pub fn spawn(sink: Arc<RotatingSink>, interval: Duration) -> Self {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            loop {
                if let Err(e) = sink.flush() {
                    tracing::warn!("Log flush failed: {}", e);
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self { cancel_tx, handle }
    }

    /// Ask the daemon to stop after its current cycle
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel and wait for the loop to exit
    pub async fn stop(self) {
        self.cancel();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogEvent, ManualClock, RecordFormatter, Severity};
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn test_sink(dir: &TempDir, clock: Arc<ManualClock>) -> Arc<RotatingSink> {
        let template = dir.path().join("techniclauncher_%D.log").to_string_lossy().into_owned();
        Arc::new(RotatingSink::open(template, RecordFormatter::default(), clock))
    }

    #[tokio::test]
    async fn test_daemon_flushes_periodically() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Local.with_ymd_and_hms(2026, 1, 21, 12, 0, 0).unwrap());
        let sink = test_sink(&dir, clock);

        let daemon = FlushDaemon::spawn(Arc::clone(&sink), Duration::from_millis(10));
        sink.write(&LogEvent::new(Severity::Info, "test", "buffered")).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let content = std::fs::read_to_string(sink.current_path()).unwrap();
        assert!(content.contains("[INFO] buffered"));
        daemon.stop().await;
    }

    #[tokio::test]
    async fn test_daemon_rotates_on_date_change() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Local.with_ymd_and_hms(2026, 1, 21, 23, 59, 59).unwrap());
        let sink = test_sink(&dir, Arc::clone(&clock));
        let first = sink.current_path();

        let daemon = FlushDaemon::spawn(Arc::clone(&sink), Duration::from_millis(10));
        clock.set(Local.with_ymd_and_hms(2026, 1, 22, 0, 0, 1).unwrap());
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_ne!(sink.current_path(), first);
        daemon.stop().await;
    }

    #[tokio::test]
    async fn test_daemon_cancel_stops_loop() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(Local.with_ymd_and_hms(2026, 1, 21, 12, 0, 0).unwrap());
        let daemon = FlushDaemon::spawn(test_sink(&dir, clock), Duration::from_secs(3600));

        daemon.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(daemon.is_finished());
    }
}

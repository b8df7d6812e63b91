//! Tracing integration
//!
//! Routes `tracing` events from anywhere in the process into the launcher log,
//! so dependencies that log through the facade land in the same file as the
//! bootstrap records.

use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use super::logger::Logger;
use super::record::{FailureTrace, LogEvent, Severity};

/// A tracing layer that writes every event through the launcher `Logger`
pub struct LauncherLayer {
    logger: Arc<Logger>,
}

impl LauncherLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for LauncherLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = visitor.message.unwrap_or_default();
        if !visitor.fields.is_empty() {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(&visitor.fields.join(" "));
        }

        let mut record =
            LogEvent::new(Severity::from(metadata.level()), metadata.target(), message);
        record.failure = visitor.failure;
        self.logger.log(record);
    }
}

/// Collects the message, any extra fields, and an `error` field
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
    failure: Option<FailureTrace>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut buf = String::new();
        let _ = write!(&mut buf, "{:?}", value);
        if field.name() == "message" {
            self.message = Some(buf);
        } else {
            self.fields.push(format!("{}={}", field.name(), buf));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if field.name() == "error" {
            self.failure = Some(FailureTrace::from_error(value));
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }
}

/// Install the process-wide subscriber: `RUST_LOG` filter (default `info`)
/// feeding the launcher layer.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(logger: Arc<Logger>) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(LauncherLayer::new(logger))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::rotating::{RotatingSink, SystemClock};
    use crate::logging::RecordFormatter;
    use tempfile::TempDir;
    use tracing_subscriber::layer::SubscriberExt;

    fn test_logger(dir: &TempDir) -> Arc<Logger> {
        let template = dir.path().join("techniclauncher_%D.log").to_string_lossy().into_owned();
        let sink = RotatingSink::open(template, RecordFormatter::default(), Arc::new(SystemClock));
        Arc::new(Logger::new("launcher", Arc::new(sink)))
    }

    fn read_log(logger: &Logger) -> String {
        logger.sink().flush().unwrap();
        std::fs::read_to_string(logger.sink().current_path()).unwrap()
    }

    #[test]
    fn test_layer_maps_levels() {
        let dir = TempDir::new().unwrap();
        let logger = test_logger(&dir);
        let subscriber =
            tracing_subscriber::registry().with(LauncherLayer::new(Arc::clone(&logger)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Loaded {} packs", 3);
            tracing::warn!("Proxy not reachable");
            tracing::error!("Download failed");
        });

        let content = read_log(&logger);
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("[INFO] Loaded 3 packs"));
        assert!(lines[1].ends_with("[WARNING] Proxy not reachable"));
        assert!(lines[2].ends_with("[SEVERE] Download failed"));
    }

    #[test]
    fn test_layer_appends_fields() {
        let dir = TempDir::new().unwrap();
        let logger = test_logger(&dir);
        let subscriber =
            tracing_subscriber::registry().with(LauncherLayer::new(Arc::clone(&logger)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(pack = "tekkit", "Installing modpack");
        });

        assert!(read_log(&logger).trim_end().ends_with("[INFO] Installing modpack pack=tekkit"));
    }

    #[test]
    fn test_layer_renders_error_field_as_failure() {
        let dir = TempDir::new().unwrap();
        let logger = test_logger(&dir);
        let subscriber =
            tracing_subscriber::registry().with(LauncherLayer::new(Arc::clone(&logger)));

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "settings locked");
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(error = &err as &(dyn Error + 'static), "Failed to save settings");
        });

        let content = read_log(&logger);
        let mut lines = content.lines();
        assert!(lines.next().unwrap().ends_with("[SEVERE] Failed to save settings"));
        assert_eq!(lines.next().unwrap(), "settings locked");
    }
}

//! Process-wide panic backstop
//!
//! A panic on any thread is logged at SEVERE with a backtrace and flushed to
//! disk immediately, so no thread's failure is silently lost.

use std::backtrace::Backtrace;
use std::panic::PanicInfo;
use std::sync::Arc;

use super::logger::Logger;
use super::record::{capture_frames, FailureTrace, LogEvent, Severity};

/// Extract the panic payload as text
fn panic_message(info: &PanicInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Build the SEVERE record for a panic
pub fn panic_event(info: &PanicInfo<'_>, thread_name: &str, backtrace: &Backtrace) -> LogEvent {
    let mut message = panic_message(info);
    if let Some(location) = info.location() {
        message = format!("{} at {}:{}", message, location.file(), location.line());
    }
    LogEvent::new(
        Severity::Severe,
        "panic",
        format!("Unhandled panic in thread '{}'", thread_name),
    )
    .with_failure(FailureTrace::new(message).with_frames(capture_frames(backtrace)))
}

/// Replace the panic hook with one that logs through `logger`.
///
/// With `chain_previous` (debug mode) the previous hook still prints to the
/// terminal afterwards.
pub fn install_panic_hook(logger: Arc<Logger>, chain_previous: bool) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        logger.log(panic_event(info, name, &Backtrace::force_capture()));
        let _ = logger.sink().flush();

        if chain_previous {
            previous(info);
        }
    }));
}

//! Background flushing and teardown
//!
//! Two independent activities feed the same serialized flush on the rotating
//! sink: a periodic daemon and a one-shot shutdown hook.

mod flush;
mod shutdown;
mod signal;

pub use flush::{FlushDaemon, DEFAULT_FLUSH_INTERVAL};
pub use shutdown::{ShutdownGuard, ShutdownHook};
pub use signal::{Termination, TerminationSignal};

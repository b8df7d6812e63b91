//! Termination signals that should end the launcher cleanly

use std::fmt;
use std::io;

/// Which signal asked the process to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Ctrl-C / SIGINT
    Interrupt,
    /// SIGTERM, e.g. `kill` or session logout
    Terminate,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Interrupt => write!(f, "interrupt"),
            Termination::Terminate => write!(f, "terminate"),
        }
    }
}

/// Listens for SIGINT and SIGTERM.
///
/// Handlers are registered by `install`, so a signal arriving between
/// `install` and `recv` is not lost. Must be created inside a tokio runtime.
pub struct TerminationSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl TerminationSignal {
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next termination signal
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Termination {
        tokio::select! {
            _ = self.interrupt.recv() => Termination::Interrupt,
            _ = self.terminate.recv() => Termination::Terminate,
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Termination {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        Termination::Interrupt
    }
}

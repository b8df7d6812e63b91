//! Contracts the bootstrap needs from the windows, the updater and the process
//!
//! The real splash, login frame and update download live outside this crate.
//! The headless implementations here let the launcher run from a terminal.

use std::fs::File;
use std::sync::Arc;

use anyhow::Result;

use crate::console::{ConsoleView, TerminalConsole, DEFAULT_CONSOLE_LINES};
use crate::logging::Logger;
use crate::params::StartupParameters;

/// Exit status used when the process replaces itself
pub const RELAUNCH_EXIT_CODE: i32 = 0;

/// Splash surface shown before the heavy startup work
pub trait Splash: Send {
    fn show(&mut self);
    fn dispose(&mut self);
}

/// Decides whether this process must be replaced by a newer launcher
pub trait Relauncher: Send + Sync {
    /// Returns `true` once a replacement process has been started and this
    /// process must exit. `force` relaunches even if the build is current.
    fn relaunch(&self, params: &StartupParameters, logger: &Logger, force: bool) -> Result<bool>;
}

/// Primary UI entry point (the login frame)
pub trait LauncherUi: Send {
    fn show(&mut self, last_user: Option<&str>) -> Result<()>;
}

/// Ends the process
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: i32);
}

/// Builds a console; receives the real terminal when the streams are captured
pub type ConsoleFactory = Box<dyn Fn(Option<File>) -> Arc<dyn ConsoleView> + Send + Sync>;

/// Everything external the orchestrator drives
pub struct Collaborators {
    pub splash: Box<dyn Splash>,
    pub relauncher: Box<dyn Relauncher>,
    pub console_factory: ConsoleFactory,
    pub ui: Box<dyn LauncherUi>,
    pub terminator: Box<dyn Terminator>,
}

impl Collaborators {
    /// Collaborators for running without any windows
    pub fn headless() -> Self {
        Self {
            splash: Box::new(HeadlessSplash),
            relauncher: Box::new(DisabledRelauncher),
            console_factory: Box::new(|terminal: Option<File>| {
                let console = TerminalConsole::new(DEFAULT_CONSOLE_LINES, terminal);
                Arc::new(console) as Arc<dyn ConsoleView>
            }),
            ui: Box::new(HeadlessUi),
            terminator: Box::new(ProcessTerminator),
        }
    }
}

pub struct HeadlessSplash;

impl Splash for HeadlessSplash {
    fn show(&mut self) {}
    fn dispose(&mut self) {}
}

/// Never relaunches; update downloads are handled elsewhere
pub struct DisabledRelauncher;

impl Relauncher for DisabledRelauncher {
    fn relaunch(&self, params: &StartupParameters, logger: &Logger, force: bool) -> Result<bool> {
        if force && !params.relaunched {
            logger.warning("Relaunch requested but self-update is not available in this build");
        }
        Ok(false)
    }
}

/// Reports readiness on standard output
pub struct HeadlessUi;

impl LauncherUi for HeadlessUi {
    fn show(&mut self, last_user: Option<&str>) -> Result<()> {
        match last_user {
            Some(user) => println!("Launcher ready, last user: {}", user),
            None => println!("Launcher ready"),
        }
        Ok(())
    }
}

/// Exits the real process
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

//! Startup states, the derived startup decision, and timing

use std::fmt;
use std::time::{Duration, Instant};

use crate::build_info::LauncherBuild;
use crate::params::StartupParameters;
use crate::settings::Settings;

/// Bootstrap states, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    ParameterAcquisition,
    Cleanup,
    PresentationInit,
    LoggerInit,
    RelaunchEvaluation,
    ConsoleActivation,
    Handoff,
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapState::ParameterAcquisition => "parameter acquisition",
            BootstrapState::Cleanup => "cleanup",
            BootstrapState::PresentationInit => "presentation init",
            BootstrapState::LoggerInit => "logger init",
            BootstrapState::RelaunchEvaluation => "relaunch evaluation",
            BootstrapState::ConsoleActivation => "console activation",
            BootstrapState::Handoff => "handoff",
        };
        f.write_str(name)
    }
}

/// Decisions derived once from parameters and settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupDecision {
    pub should_relaunch: bool,
    pub is_console_requested: bool,
    pub is_debug_mode: bool,
    pub launcher_build: LauncherBuild,
}

impl StartupDecision {
    pub fn derive(
        params: &StartupParameters,
        settings: &Settings,
        launcher_build: LauncherBuild,
        should_relaunch: bool,
    ) -> Self {
        Self {
            should_relaunch,
            is_console_requested: params.is_console() || settings.show_launcher_console,
            is_debug_mode: params.is_debug_mode(),
            launcher_build,
        }
    }
}

/// Time spent in one state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTiming {
    pub state: BootstrapState,
    pub elapsed: Duration,
}

/// What happened during startup
#[derive(Debug, Clone)]
pub struct StartupReport {
    pub states: Vec<StateTiming>,
    pub launcher_build: LauncherBuild,
    pub total: Duration,
    started: Instant,
    mark: Instant,
}

impl StartupReport {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            states: Vec::new(),
            launcher_build: LauncherBuild::Unknown,
            total: Duration::ZERO,
            started: now,
            mark: now,
        }
    }

    /// Record the time spent since the previous state finished
    pub fn finish(&mut self, state: BootstrapState) {
        let now = Instant::now();
        self.states.push(StateTiming {
            state,
            elapsed: now - self.mark,
        });
        self.mark = now;
        self.total = now - self.started;
    }

    pub fn visited(&self) -> Vec<BootstrapState> {
        self.states.iter().map(|s| s.state).collect()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

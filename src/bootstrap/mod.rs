//! Launcher bootstrap
//!
//! Runs the startup sequence once, in order:
//!
//! ```text
//! parameters -> cleanup -> splash -> logger -> relaunch? -> console? -> handoff
//! ```
//!
//! Every state logs its failures and moves on. The relaunch check is the only
//! state that can end the process.

mod collaborators;
mod state;

use std::sync::Arc;
use std::time::Duration;

use crate::build_info::{LauncherBuild, BUILD_RESOURCE};
use crate::cleanup::remove_legacy_artifacts;
use crate::console::ConsoleView;
use crate::lifecycle::{
    FlushDaemon, ShutdownGuard, ShutdownHook, Termination, TerminationSignal,
    DEFAULT_FLUSH_INTERVAL,
};
use crate::logging::{
    cleanup_old_logs, init_file_logging, install_panic_hook, CapturedStream, Clock, ConsoleSlot,
    Logger, LoggingOptions, OutputStreams, SystemClock,
};
use crate::params::StartupParameters;
use crate::paths::LauncherPaths;
use crate::proxy::ProxyConfig;
use crate::settings::Settings;

pub use collaborators::{
    Collaborators, ConsoleFactory, DisabledRelauncher, HeadlessSplash, HeadlessUi, LauncherUi,
    ProcessTerminator, Relauncher, Splash, Terminator, RELAUNCH_EXIT_CODE,
};
pub use state::{BootstrapState, StartupDecision, StartupReport, StateTiming};

/// Delay before a relaunch exit, letting pending log writes settle
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

const SEPARATOR: &str = "------------------------------------------";

/// Tunables for a bootstrap run
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub grace_period: Duration,
    pub flush_interval: Duration,
    /// Build id text; `None` means the build is unknown
    pub build_resource: Option<String>,
    /// Redirect the real stdout/stderr descriptors into the log
    pub capture_process_streams: bool,
    /// Install the global tracing subscriber, panic hook and signal handlers
    pub install_global_hooks: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            build_resource: BUILD_RESOURCE.map(str::to_string),
            capture_process_streams: true,
            install_global_hooks: true,
        }
    }
}

/// How a bootstrap run ended
pub enum BootstrapOutcome {
    /// The process was told to terminate for a relaunch. Only observable
    /// when the terminator returns, as in tests.
    Relaunched {
        decision: StartupDecision,
        report: StartupReport,
    },
    /// The UI has been handed off; the session keeps logging alive
    Ready(LauncherSession),
}

/// Everything that must stay alive for the rest of the process lifetime
pub struct LauncherSession {
    pub paths: LauncherPaths,
    pub params: StartupParameters,
    pub settings: Settings,
    pub decision: StartupDecision,
    pub report: StartupReport,
    pub logger: Arc<Logger>,
    /// Output capability for code that would write to stdout/stderr
    pub streams: OutputStreams,
    pub console_slot: ConsoleSlot,
    pub console: Option<Arc<dyn ConsoleView>>,
    pub captured: Vec<CapturedStream>,
    pub flush_daemon: FlushDaemon,
    pub shutdown: ShutdownGuard,
}

impl LauncherSession {
    /// Dispose any current console, then show a new one
    pub fn setup_console(&mut self, factory: &ConsoleFactory) {
        self.console = Some(activate_console(
            self.console.take(),
            factory,
            &self.console_slot,
            &self.captured,
        ));
    }

    pub fn destroy_console(&mut self) {
        if let Some(console) = self.console.take() {
            self.console_slot.detach();
            console.hide();
            console.dispose();
        }
    }
}

fn activate_console(
    previous: Option<Arc<dyn ConsoleView>>,
    factory: &ConsoleFactory,
    slot: &ConsoleSlot,
    captured: &[CapturedStream],
) -> Arc<dyn ConsoleView> {
    if let Some(previous) = previous {
        previous.dispose();
    }
    let terminal = captured.first().and_then(|c| c.original().ok());
    let console = factory(terminal);
    console.show();
    slot.attach(&console);
    console
}

/// Resolves on SIGINT or SIGTERM. Never resolves when signal handlers are
/// not wanted or can't be installed.
async fn interrupted(listen: bool) -> Termination {
    match listen.then(TerminationSignal::install) {
        Some(Ok(mut signal)) => signal.recv().await,
        _ => std::future::pending().await,
    }
}

/// The startup orchestrator
pub struct Bootstrap {
    options: BootstrapOptions,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
}

impl Bootstrap {
    pub fn new(options: BootstrapOptions, collaborators: Collaborators) -> Self {
        Self {
            options,
            collaborators,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the startup sequence with the process arguments (program name first)
    pub async fn run<I, T>(self, args: I) -> BootstrapOutcome
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let Bootstrap {
            options,
            mut collaborators,
            clock,
        } = self;
        let mut report = StartupReport::start();
        // Diagnostics raised before the logger exists
        let mut early_warnings = Vec::new();

        // Parameter acquisition
        let parsed = StartupParameters::parse_lenient(args);
        if let Some(e) = parsed.error {
            early_warnings.push(format!("Failed to parse startup parameters: {}", e));
        }
        let params = parsed.params;
        let (paths, dir_warning) = LauncherPaths::resolve(params.launcher_dir.as_deref());
        early_warnings.extend(dir_warning);
        let (settings, settings_warning) = Settings::load_or_default(&paths.settings_file());
        early_warnings.extend(settings_warning);
        report.finish(BootstrapState::ParameterAcquisition);

        // Cleanup
        let removed = remove_legacy_artifacts(paths.root());
        report.finish(BootstrapState::Cleanup);

        // Presentation init
        collaborators.splash.show();
        report.finish(BootstrapState::PresentationInit);

        // Logger init
        let logging = init_file_logging(
            &paths.logs_dir(),
            clock,
            LoggingOptions {
                debug_mode: params.is_debug_mode(),
                capture_process_streams: options.capture_process_streams,
                install_tracing: options.install_global_hooks,
            },
        );
        let logger = Arc::clone(&logging.logger);
        if options.install_global_hooks {
            install_panic_hook(Arc::clone(&logger), params.is_debug_mode());
        }

        let launcher_build = LauncherBuild::from_resource(options.build_resource.as_deref());
        report.launcher_build = launcher_build;
        logger.info(SEPARATOR);
        logger.info("Technic Launcher is starting....");
        logger.info(format!("Launcher Build: {}", launcher_build));
        for warning in early_warnings {
            logger.warning(warning);
        }
        params.log_parameters(&logger);
        if removed > 0 {
            logger.info(format!("Removed {} leftover files from earlier launchers", removed));
        }

        let active_log = logger.sink().current_path();
        match cleanup_old_logs(&paths.logs_dir(), settings.log_retention_days, &active_log) {
            Ok(count) if count > 0 => logger.info(format!("Cleaned up {} old log files", count)),
            Ok(_) => {}
            Err(e) => logger.warning(format!("Failed to clean up old logs: {:#}", e)),
        }
        logger.info(format!("Logging to: {}", active_log.display()));

        let proxy = ProxyConfig::resolve(&params, &settings);
        if proxy.apply() {
            logger.info(format!("Using proxy {}", proxy));
        }
        report.finish(BootstrapState::LoggerInit);

        // Relaunch evaluation
        let should_relaunch = match collaborators.relauncher.relaunch(&params, &logger, false) {
            Ok(relaunch) => relaunch,
            Err(e) => {
                let err: &(dyn std::error::Error + 'static) = e.as_ref();
                logger.error("Relaunch check failed, continuing with this launcher", err);
                false
            }
        };
        let decision = StartupDecision::derive(&params, &settings, launcher_build, should_relaunch);

        if decision.should_relaunch {
            logger.info(format!(
                "Relaunching, exiting in {}ms",
                options.grace_period.as_millis()
            ));
            tokio::select! {
                _ = tokio::time::sleep(options.grace_period) => {}
                received = interrupted(options.install_global_hooks) => {
                    logger.warning(format!(
                        "Relaunch wait cut short by {} signal, exiting now",
                        received
                    ));
                }
            }
            report.finish(BootstrapState::RelaunchEvaluation);
            // Process exit skips destructors, so persist the log here
            ShutdownHook::new(Arc::clone(logger.sink())).run();
            collaborators.terminator.terminate(RELAUNCH_EXIT_CODE);
            return BootstrapOutcome::Relaunched { decision, report };
        }
        report.finish(BootstrapState::RelaunchEvaluation);

        // Console activation
        let console = if decision.is_console_requested {
            let console = activate_console(
                None,
                &collaborators.console_factory,
                &logging.console,
                &logging.captured,
            );
            logger.info("Console Mode Activated");
            report.finish(BootstrapState::ConsoleActivation);
            Some(console)
        } else {
            None
        };

        // Handoff
        let shutdown = ShutdownHook::register(Arc::clone(logger.sink()));
        let flush_daemon = FlushDaemon::spawn(Arc::clone(logger.sink()), options.flush_interval);

        collaborators.splash.dispose();
        if let Err(e) = collaborators.ui.show(settings.last_user.as_deref()) {
            let err: &(dyn std::error::Error + 'static) = e.as_ref();
            logger.error("Failed to show the launcher window", err);
        }
        report.finish(BootstrapState::Handoff);
        logger.info(format!(
            "Launcher took: {}ms to start",
            report.total.as_millis()
        ));

        BootstrapOutcome::Ready(LauncherSession {
            paths,
            params,
            settings,
            decision,
            report,
            logger,
            streams: logging.streams,
            console_slot: logging.console,
            console,
            captured: logging.captured,
            flush_daemon,
            shutdown,
        })
    }
}

use anyhow::Result;

use technic_launcher::bootstrap::{Bootstrap, BootstrapOptions, BootstrapOutcome, Collaborators};
use technic_launcher::lifecycle::TerminationSignal;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging, relaunch and UI handoff all happen inside the bootstrap
    let bootstrap = Bootstrap::new(BootstrapOptions::default(), Collaborators::headless());

    let session = match bootstrap.run(std::env::args()).await {
        BootstrapOutcome::Ready(session) => session,
        // The terminator has already exited the process
        BootstrapOutcome::Relaunched { .. } => return Ok(()),
    };

    // Stay alive until SIGINT or SIGTERM; the flush daemon runs in the background
    let hook = session.shutdown.hook();
    let mut signal = TerminationSignal::install()?;
    let received = signal.recv().await;
    session
        .logger
        .info(format!("Received {} signal, shutting down", received));
    hook.run();

    Ok(())
}

//! # OS termination signals.
//!
//! [`wait_for_shutdown_signal`] completes on the first of:
//! - Unix: `SIGINT`, `SIGTERM`, `SIGQUIT`, or Ctrl-C
//! - elsewhere: Ctrl-C
//!
//! Used by [`Engine::run_until_signal`](crate::Engine::run_until_signal).

/// Resolves once the process is asked to terminate.
///
/// Fails only if a listener cannot be installed.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = quit.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

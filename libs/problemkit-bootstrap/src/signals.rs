use std::fmt;

use anyhow::{Context, Result};
use tokio::signal;

/// Signal that ended the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    CtrlC,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CtrlC => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Resolve on the first Ctrl+C or SIGTERM.
///
/// # Errors
/// Returns an error if a signal handler cannot be installed.
pub async fn wait_for_shutdown() -> Result<ShutdownSignal> {
    let received = tokio::select! {
        result = ctrl_c() => result?,
        result = terminate() => result?,
    };
    tracing::info!(signal = %received, "shutdown signal received, draining connections");
    Ok(received)
}

/// Shutdown future for `axum::serve(..).with_graceful_shutdown`.
///
/// A failure to install handlers is logged and treated as an immediate
/// shutdown request.
pub async fn shutdown_signal() {
    if let Err(e) = wait_for_shutdown().await {
        tracing::error!(error = %e, "signal handling failed, shutting down");
    }
}

async fn ctrl_c() -> Result<ShutdownSignal> {
    signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    Ok(ShutdownSignal::CtrlC)
}

#[cfg(unix)]
async fn terminate() -> Result<ShutdownSignal> {
    signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?
        .recv()
        .await;
    Ok(ShutdownSignal::Terminate)
}

#[cfg(not(unix))]
async fn terminate() -> Result<ShutdownSignal> {
    std::future::pending().await
}

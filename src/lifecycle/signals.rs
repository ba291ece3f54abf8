//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGTERM/SIGINT
//! - Translate the first one into a triggered `Shutdown` token
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Lives outside the container core; only the token's provider calls it

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Token wired to process signals. Used as the `Shutdown` provider.
///
/// Must be called inside a Tokio runtime.
pub fn new_signal_shutdown() -> Shutdown {
    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());
    shutdown
}

/// Trigger `shutdown` on the first termination signal.
pub fn spawn_signal_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "Shutdown signal received");
                shutdown.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signals"),
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
}

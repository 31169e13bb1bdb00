//! Shutdown signal handling.

use tokio::signal;
use tracing::info;

/// Waits for a termination signal (SIGINT/SIGTERM on Unix, Ctrl+C on
/// Windows), returning once one is received so the caller can run its
/// cleanup path.
pub async fn wait_for_shutdown() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("📡 received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("📡 received SIGTERM");
            }
        }
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        info!("📡 received Ctrl+C");
    }

    Ok(())
}

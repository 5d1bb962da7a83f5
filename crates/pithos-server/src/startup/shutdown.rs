//! Graceful shutdown handling

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

/// Shutdown flag shared by every task.
///
/// Once set it stays set, so a task that starts waiting late still stops.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    /// Resolves once [`shutdown`](Self::shutdown) has been called
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so this only returns once the flag is set
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut signal) => {
            signal.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Watch for Ctrl+C or SIGTERM in the background.
///
/// Returns the signal that fires when either arrives.
pub fn wait_for_shutdown_signal() -> ShutdownSignal {
    let shutdown = ShutdownSignal::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = ctrl_c() => {
                info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate() => {
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        shutdown_clone.shutdown();
    });

    shutdown
}

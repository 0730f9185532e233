//! Process-level runtime helpers: delivery counters and shutdown.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::dispatch::target::DeliveryResult;

/// Lifetime delivery counters for the run loop. Cheap enough to
/// update per result and read on shutdown.
#[derive(Debug, Default)]
pub struct Stats {
    pub events: AtomicU64,
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn record(&self, results: &[DeliveryResult]) {
        self.events.fetch_add(1, Ordering::Relaxed);
        for result in results {
            if result.success {
                self.delivered.fetch_add(1, Ordering::Relaxed);
            } else {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Resolves when the process receives Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "failed to install ctrl+c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

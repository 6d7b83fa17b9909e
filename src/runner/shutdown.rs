//! Shutdown signalling for the runner.
//!
//! A [`Shutdown`] owns the trigger; any number of [`ShutdownSignal`]s can
//! await it. Triggering is idempotent.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Trigger side of the shutdown channel
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Hand out a receiver
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Receive side of the shutdown channel
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.
    ///
    /// If every `Shutdown` handle is dropped without triggering, this never resolves.
    pub async fn wait(&mut self) {
        let closed = self.rx.wait_for(|triggered| *triggered).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Trigger `shutdown` on SIGINT or SIGTERM (Ctrl-C on non-Unix platforms).
pub fn listen_for_signals(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => warn!("SIGINT received"),
                _ = sigterm.recv() => warn!("SIGTERM received"),
            }
            debug!("listen_for_signals: triggering shutdown");
            shutdown.trigger();
        }))
    }

    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received");
                shutdown.trigger();
            }
        }))
    }
}

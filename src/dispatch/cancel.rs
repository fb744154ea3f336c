//! Cancellation signals threaded through handler invocations.
//!
//! # Design Decisions
//! - Backed by a `watch` channel: one source, any number of cheap clones
//! - Cancellation is sticky; it is never reset once raised
//! - The dispatcher only forwards the signal, handlers decide how to react

use std::sync::Arc;

use tokio::sync::watch;

/// The sending half; raising it cancels every derived signal.
#[derive(Debug, Clone)]
pub struct CancellationSource {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Derive a signal observing this source.
    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Raise cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The receiving half handed to handlers.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    /// A signal that is never raised.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is raised. Pends forever if the source is
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

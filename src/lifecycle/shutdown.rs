//! Shutdown coordination.

use crate::dispatch::cancel::{CancellationSignal, CancellationSource};

/// Coordinator for graceful shutdown.
///
/// Wraps the server-wide cancellation source: triggering it stops the
/// listener and cancels the signal seen by every in-flight handler.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    source: CancellationSource,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> CancellationSignal {
        self.source.signal()
    }

    /// Trigger the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        if !self.source.is_cancelled() {
            tracing::info!("Shutdown triggered");
        }
        self.source.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.source.is_cancelled()
    }
}

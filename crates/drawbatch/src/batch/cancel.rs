//! Cooperative cancellation shared between the shell and the batch loop.

use tokio::sync::watch;

/// Cloneable cancellation token. The shell keeps one clone and calls
/// `cancel()`; the runner checks `is_cancelled()` at its per-job checkpoint
/// and awaits `cancelled()` while a host process is in flight.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Every token clone holds a sender, so the channel cannot close
        // underneath this wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

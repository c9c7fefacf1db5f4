//! Single-slot debouncing for rapid, successive requests.
//!
//! A watch channel is the lock-protected pending-request register: every
//! new request overwrites the slot, and a worker task fires the action at
//! most once per delay window with whatever value is latest when the timer
//! elapses. Intermediate requests are never acted on.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Coalesces bursts of requests into one deferred action invocation.
pub struct Debouncer<T> {
    tx: watch::Sender<Option<T>>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

impl<T: Clone + Send + Sync + 'static> Debouncer<T> {
    /// Spawns the worker that waits out the delay window and runs `action`
    /// on the most recent request.
    pub fn new<F>(delay: Duration, mut action: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = worker_cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                tokio::select! {
                    _ = worker_cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }

                let latest = rx.borrow_and_update().clone();
                if let Some(value) = latest {
                    action(value);
                }
            }
            debug!("debounce worker stopped");
        });

        Self { tx, cancel, worker }
    }

    /// Registers a request, replacing any pending one.
    ///
    /// Returns false if the worker is no longer running.
    pub fn request(&self, value: T) -> bool {
        self.tx.send(Some(value)).is_ok()
    }

    /// Stops the worker, abandoning any pending request.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        let _ = (&mut self.worker).await;
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

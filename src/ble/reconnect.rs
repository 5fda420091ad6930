//! Debounced reconnect timer.
//!
//! Holds at most one scheduled task. Re-arming cancels and replaces the
//! prior timer, coalescing rapid disconnect/connect churn into a single
//! eventual firing. The fired event re-enters the lifecycle machine, which
//! decides whether anything actually needs restarting.

use log::debug;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One-shot timer with cancel-and-replace semantics.
///
/// `E` is the event delivered into the owning loop's channel when the timer
/// fires.
#[derive(Debug)]
pub struct ReconnectScheduler<E> {
    tx: mpsc::Sender<E>,
    handle: Option<JoinHandle<()>>,
}

impl<E: Send + 'static> ReconnectScheduler<E> {
    /// Create a scheduler delivering fired events into `tx`.
    pub fn new(tx: mpsc::Sender<E>) -> Self {
        Self { tx, handle: None }
    }

    /// Arm the timer, cancelling any previously armed one.
    pub fn schedule(&mut self, delay: Duration, event: E) {
        self.cancel();
        debug!("Reconnect scheduled in {:?}", delay);
        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the loop is shutting down.
            let _ = tx.send(event).await;
        }));
    }

    /// Cancel a pending timer without firing it.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Pending reconnect cancelled");
            handle.abort();
        }
    }

    /// Whether a timer is currently armed (or has fired without being
    /// re-armed; stale handles are only cleared on cancel/schedule).
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<E> Drop for ReconnectScheduler<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Arm a non-cancellable one-shot timer delivering `event` after `delay`.
///
/// Used for the settle and registration-retry delays; the lifecycle machine
/// guards against stale firings itself.
pub fn fire_after<E: Send + 'static>(tx: mpsc::Sender<E>, delay: Duration, event: E) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(event).await;
    });
}

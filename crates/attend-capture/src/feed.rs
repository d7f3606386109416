//! Handle for receiving events from an activated capture adapter.

use crate::events::CaptureEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Consumer handle for an activated adapter.
///
/// The adapter runs as a background task feeding this handle's channel; the
/// handle is the only way to consume events and the only way to stop the
/// adapter. At most one adapter is active per session controller, so the
/// single-writer ledger downstream never sees concurrent producers.
///
/// # Shutdown
///
/// [`stop`](ScanFeed::stop) cancels the adapter task and waits for it to
/// finish, which guarantees the underlying device has been released by the
/// time `stop` returns. Dropping the handle without calling `stop` still
/// cancels the task; the device is then released asynchronously on the
/// task's next cancellation check.
pub struct ScanFeed {
    event_rx: mpsc::Receiver<CaptureEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl ScanFeed {
    pub(crate) fn new(
        event_rx: mpsc::Receiver<CaptureEvent>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
        active: Arc<AtomicBool>,
    ) -> Self {
        Self {
            event_rx,
            cancel,
            task: Some(task),
            active,
        }
    }

    /// Receive the next capture event.
    ///
    /// Returns `None` when the adapter task has terminated and the channel
    /// is drained.
    pub async fn recv(&mut self) -> Option<CaptureEvent> {
        self.event_rx.recv().await
    }

    /// Receive the next capture event without waiting.
    pub fn try_recv(&mut self) -> Option<CaptureEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Returns `true` while the adapter task holds its device.
    ///
    /// Transitions to `false` once the device has been released, on every
    /// exit path.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop the adapter and wait for the device to be released.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            // The task releases the device on its way out; a panic inside it
            // must not take the controller down with it.
            let _ = task.await;
        }
    }
}

impl Drop for ScanFeed {
    fn drop(&mut self) {
        // Cancellation (not abort) so the task still runs its release path.
        self.cancel.cancel();
    }
}

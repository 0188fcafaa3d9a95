//! Bounded FIFO queue joining producer threads to the collector worker.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::{info, warn};

/// Producer half of the pending-message queue.
///
/// Wraps a bounded channel so any number of caller threads can append while
/// the single worker thread drains via the matching [`Receiver`]. The
/// channel's own synchronisation is the only lock involved.
pub(crate) struct MessageQueue {
    tx: Sender<String>,
    capacity: usize,
    overload: OverloadWarner,
}

impl MessageQueue {
    /// Create a queue bounded at `capacity`, returning the producer half and
    /// the receiver consumed by the worker thread.
    pub(crate) fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                capacity,
                overload: OverloadWarner::new(),
            },
            rx,
        )
    }

    /// Append a line without blocking.
    ///
    /// Returns `false` and drops the line when the queue is full. The first
    /// drop of an overload period logs a warning; one notice is logged once
    /// the queue has drained below half capacity and accepted a line again.
    pub(crate) fn try_enqueue(&self, line: String) -> bool {
        let drained = self.tx.len() < self.capacity / 2;
        match self.tx.try_send(line) {
            Ok(()) => {
                self.overload.record_accept(drained, || {
                    info!("metrics queue available again");
                });
                true
            }
            Err(TrySendError::Full(_)) => {
                self.overload.record_drop(|| {
                    warn!("metrics queue full; dropping messages until there's room");
                });
                false
            }
            // The worker only exits once every producer handle is gone, so a
            // disconnected channel means the process is tearing down.
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Append a line, blocking the caller until space is available.
    pub(crate) fn enqueue_blocking(&self, line: String) {
        let _ = self.tx.send(line);
    }
}

/// Transition flag behind the drop-and-log-once policy.
///
/// Producers race on the flag; the compare-and-swap guarantees a single
/// warning per contiguous overload period and a single notice per recovery,
/// however many threads drop or enqueue concurrently.
struct OverloadWarner {
    full: AtomicBool,
}

impl OverloadWarner {
    fn new() -> Self {
        Self {
            full: AtomicBool::new(false),
        }
    }

    /// Invoke `on_transition` only on the first drop after a non-dropping
    /// period.
    fn record_drop(&self, on_transition: impl FnOnce()) {
        if self
            .full
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            on_transition();
        }
    }

    /// Invoke `on_recovery` on the first accepted line after the queue has
    /// drained past the recovery threshold.
    fn record_accept(&self, drained: bool, on_recovery: impl FnOnce()) {
        if drained
            && self.full.load(Ordering::Relaxed)
            && self
                .full
                .compare_exchange(true, false, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            on_recovery();
        }
    }
}

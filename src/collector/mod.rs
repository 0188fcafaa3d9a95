//! Background delivery engine for the metrics protocol.
//!
//! `Collector` owns a bounded queue of pending protocol lines and a single
//! worker thread that drains it to the remote collector over a persistent
//! TCP connection. The worker maintains the connection for the life of the
//! process, reconnecting with quadratic backoff across outages and probing
//! the socket for a silent peer close before each write. Delivery is best
//! effort: during an outage lines queue up, and once the queue fills they
//! are dropped, with one warning logged per overload period.
//!
//! There is no shutdown or flush API. The worker thread exits on its own
//! once the `Collector` (and with it the producer side of the queue) has
//! been dropped; until then it never stops retrying.

mod backoff;
mod config;
mod liveness;
mod queue;
mod transport;
mod worker;

#[cfg(test)]
mod tests;

pub use config::{
    CollectorConfig, DEFAULT_COLLECTOR_HOST, DEFAULT_COLLECTOR_PORT, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_MAX_RECONNECT_DELAY, DEFAULT_QUEUE_CAPACITY, DEFAULT_WRITE_TIMEOUT,
};
pub use transport::Endpoint;

use std::thread::JoinHandle;

use thiserror::Error;

use queue::MessageQueue;

/// Errors surfaced when handing a line to the collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The line contains a carriage return, or its only newline is not the
    /// final character.
    #[error("invalid message: {0:?}")]
    InvalidMessage(String),
}

/// Client handle to the delivery engine.
pub struct Collector {
    queue: MessageQueue,
    worker: JoinHandle<()>,
}

impl Collector {
    /// Start a collector targeting the hosted service with default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(CollectorConfig::new(api_key))
    }

    /// Start a collector from a configuration object. The worker thread
    /// connects immediately.
    pub fn with_config(config: CollectorConfig) -> Self {
        let (queue, rx) = MessageQueue::bounded(config.capacity);
        let worker = worker::spawn_worker(config, rx);
        Self { queue, worker }
    }

    /// Queue a protocol line for delivery.
    ///
    /// In the default non-blocking mode the line is dropped when the queue
    /// is full and `Ok(false)` is returned; drops are reported through the
    /// log, once per overload period. In synchronous mode the call blocks
    /// until the queue has room and always returns `Ok(true)`.
    pub fn send(&self, line: &str, synchronous: bool) -> Result<bool, CollectorError> {
        validate_line(line)?;
        if synchronous {
            self.queue.enqueue_blocking(line.to_owned());
            Ok(true)
        } else {
            Ok(self.queue.try_enqueue(line.to_owned()))
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("worker", &self.worker.thread().id())
            .finish()
    }
}

/// A protocol line must be a single `\n`-terminated line with no `\r`.
fn validate_line(line: &str) -> Result<(), CollectorError> {
    let well_formed = !line.is_empty()
        && !line.contains('\r')
        && line.find('\n') == Some(line.len() - 1);
    if well_formed {
        Ok(())
    } else {
        Err(CollectorError::InvalidMessage(line.to_owned()))
    }
}

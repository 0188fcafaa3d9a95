//! Background worker owning the collector connection lifecycle.
//!
//! The worker runs an infinite supervise-and-retry loop: connect,
//! authenticate, then stream queued lines until something fails, at which
//! point the socket is discarded and the loop restarts after a backoff
//! delay. No failure escapes the loop; the only observers are the log and
//! the queue filling up.

use std::{
    io::{self, Write},
    net::TcpStream,
    thread,
    time::Duration,
};

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, error, info, warn};

use super::{backoff::BackoffState, config::CollectorConfig, liveness, transport};

/// Consecutive failures tolerated at `info!` before escalating to `warn!`.
const WARN_AFTER_FAILURES: u32 = 3;
/// Consecutive failures treated as a sustained outage, logged at `error!`.
const ERROR_AFTER_FAILURES: u32 = 6;

/// Why a connection attempt ended.
enum StreamEnd {
    /// Every producer handle has gone away; the worker can exit.
    QueueClosed,
    /// The connection failed and the worker should back off and reconnect.
    Io(io::Error),
}

pub(crate) fn spawn_worker(
    config: CollectorConfig,
    rx: Receiver<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || worker_loop(rx, config))
}

fn worker_loop(rx: Receiver<String>, config: CollectorConfig) {
    let mut backoff = BackoffState::new(config.max_reconnect_delay);
    // The in-flight slot: a line dequeued but not yet fully written survives
    // here across reconnects and is written first on the new connection.
    let mut pending: Option<String> = None;
    loop {
        match run_connection(&rx, &config, &mut pending, &mut backoff) {
            StreamEnd::QueueClosed => {
                debug!("collector queue closed; worker exiting");
                return;
            }
            StreamEnd::Io(err) => {
                let delay = backoff.next_delay();
                log_disconnect(&err, backoff.failures(), delay);
                // Notice a vanished client between attempts so the thread
                // does not spin on reconnects after the collector is gone.
                if pending.is_none() {
                    match rx.try_recv() {
                        Ok(line) => pending = Some(line),
                        Err(TryRecvError::Disconnected) => return,
                        Err(TryRecvError::Empty) => {}
                    }
                }
                thread::sleep(delay);
            }
        }
    }
}

fn run_connection(
    rx: &Receiver<String>,
    config: &CollectorConfig,
    pending: &mut Option<String>,
    backoff: &mut BackoffState,
) -> StreamEnd {
    let mut stream = match transport::connect(
        &config.endpoint,
        config.connect_timeout,
        config.write_timeout,
    ) {
        Ok(stream) => stream,
        Err(err) => return StreamEnd::Io(err),
    };
    if let Err(err) = transport::authenticate(&mut stream, &config.api_key) {
        return StreamEnd::Io(err);
    }
    backoff.record_success();
    info!("connected to collector at {}", config.endpoint);
    stream_messages(rx, &mut stream, pending)
}

fn stream_messages(
    rx: &Receiver<String>,
    stream: &mut TcpStream,
    pending: &mut Option<String>,
) -> StreamEnd {
    loop {
        if pending.is_none() {
            *pending = match rx.recv() {
                Ok(line) => Some(line),
                Err(_) => return StreamEnd::QueueClosed,
            };
        }
        match liveness::peer_closed(stream) {
            Ok(false) => {}
            Ok(true) => {
                return StreamEnd::Io(io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    "collector closed the connection",
                ));
            }
            Err(err) => return StreamEnd::Io(err),
        }
        if let Some(line) = pending.as_deref() {
            if let Err(err) = stream.write_all(line.as_bytes()) {
                return StreamEnd::Io(err);
            }
        }
        // Only a fully written line leaves the slot.
        *pending = None;
    }
}

fn log_disconnect(err: &io::Error, failures: u32, delay: Duration) {
    if failures >= ERROR_AFTER_FAILURES {
        error!(
            "collector unreachable: {err}; {failures} failures in a row, reconnecting in {}s",
            delay.as_secs()
        );
    } else if failures >= WARN_AFTER_FAILURES {
        warn!(
            "disconnected from collector: {err}; {failures} failures in a row, reconnecting in {}s",
            delay.as_secs()
        );
    } else {
        info!(
            "disconnected from collector: {err}; reconnecting in {}s",
            delay.as_secs()
        );
    }
}

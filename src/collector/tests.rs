//! Tests for the delivery engine, driven through mock TCP peers.

use std::{
    io::Read,
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
    time::Duration,
};

use rstest::{fixture, rstest};

use super::{Collector, CollectorConfig};

const HANDSHAKE: &str = "hello version 1.0\nauthenticate test-key\n";

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

fn test_config(addr: SocketAddr) -> CollectorConfig {
    CollectorConfig::new("test-key").with_endpoint(addr.ip().to_string(), addr.port())
}

/// Accept one connection and capture exactly `expect` bytes from it.
fn spawn_capture_server(listener: TcpListener, expect: usize) -> mpsc::Receiver<Vec<u8>> {
    let (notify_tx, notify_rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        let mut buf = vec![0u8; expect];
        stream.read_exact(&mut buf).expect("read expected bytes");
        notify_tx.send(buf).expect("send captured bytes");
    });
    notify_rx
}

#[rstest]
fn authenticates_then_delivers_lines_in_order(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let lines = [
        "increment my.metric 1 1700000000\n",
        "gauge my.other 2.5 1700000001\n",
    ];
    let expected = format!("{HANDSHAKE}{}{}", lines[0], lines[1]);
    let notify_rx = spawn_capture_server(tcp_listener, expected.len());

    let collector = Collector::with_config(test_config(addr));
    for line in lines {
        assert!(collector.send(line, false).expect("well-formed line"));
    }

    let bytes = notify_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("peer captured the stream");
    assert_eq!(bytes, expected.as_bytes());
}

#[rstest]
fn synchronous_send_delivers(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let line = "gauge my.metric 3 1700000000\n";
    let expected = format!("{HANDSHAKE}{line}");
    let notify_rx = spawn_capture_server(tcp_listener, expected.len());

    let collector = Collector::with_config(test_config(addr));
    assert!(collector.send(line, true).expect("well-formed line"));

    let bytes = notify_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("peer captured the stream");
    assert_eq!(bytes, expected.as_bytes());
}

#[rstest]
fn resends_inflight_line_after_reconnect(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let line = "gauge my.metric 1 1700000000\n";
    let expected = format!("{HANDSHAKE}{line}");
    let (notify_tx, notify_rx) = mpsc::channel();
    let expect = expected.len();
    thread::spawn(move || {
        // First connection: accept the handshake, then close before any data
        // line arrives.
        let (mut first, _) = tcp_listener.accept().expect("accept first connection");
        let mut buf = vec![0u8; HANDSHAKE.len()];
        first.read_exact(&mut buf).expect("read first handshake");
        drop(first);
        // Second connection: the line must follow a fresh handshake.
        let (mut second, _) = tcp_listener.accept().expect("accept second connection");
        let mut buf = vec![0u8; expect];
        second.read_exact(&mut buf).expect("read retried line");
        notify_tx.send(buf).expect("send captured bytes");
    });

    let collector = Collector::with_config(test_config(addr));
    // Let the peer close the first connection before the line is queued so
    // the liveness probe, not the write, observes the close.
    thread::sleep(Duration::from_millis(200));
    assert!(collector.send(line, false).expect("well-formed line"));

    let bytes = notify_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("peer captured the retried stream");
    assert_eq!(bytes, expected.as_bytes());
}

#[rstest]
#[case("no newline")]
#[case("embedded\nnewline\n")]
#[case("carriage\rreturn\n")]
#[case("")]
fn rejects_malformed_lines(#[case] line: &str) {
    // Port 1 refuses connections; the worker just retries in the background.
    let collector = Collector::with_config(
        CollectorConfig::new("test-key").with_endpoint("127.0.0.1", 1),
    );
    assert!(collector.send(line, false).is_err());
}

#[rstest]
fn drops_without_blocking_once_queue_is_full() {
    // No listener: the worker cannot drain the queue beyond its single
    // in-flight slot, so capacity 2 admits at most three lines.
    let collector = Collector::with_config(
        CollectorConfig::new("test-key")
            .with_endpoint("127.0.0.1", 1)
            .with_capacity(2),
    );
    let mut accepted = 0;
    for _ in 0..4 {
        if collector
            .send("gauge my.metric 1 1700000000\n", false)
            .expect("well-formed line")
        {
            accepted += 1;
        }
    }
    // The worker may have pulled one line into its in-flight slot, so up to
    // three can be accepted, but the fourth must be dropped.
    assert!((2..=3).contains(&accepted), "accepted {accepted} lines into a queue of 2");
}

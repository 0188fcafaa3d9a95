//! Pre-write liveness probe for the collector connection.

use std::{
    io::{self, ErrorKind, Read},
    net::TcpStream,
};

/// Check whether the peer has closed the connection.
///
/// Polls the socket without blocking: an idle socket is presumed alive and
/// the probe returns straight away. Any bytes the peer does send are drained
/// and discarded, since the protocol expects no meaningful server traffic. A
/// zero-byte read signals an orderly close and yields `Ok(true)`.
///
/// Probing before each write catches a dropped connection promptly; waiting
/// for the write itself to fail can take several round-trips after the peer
/// has gone.
pub(crate) fn peer_closed(stream: &mut TcpStream) -> io::Result<bool> {
    stream.set_nonblocking(true)?;
    let result = drain_pending(stream);
    stream.set_nonblocking(false)?;
    result
}

fn drain_pending(stream: &mut TcpStream) -> io::Result<bool> {
    let mut discard = [0u8; 512];
    loop {
        match stream.read(&mut discard) {
            Ok(0) => return Ok(true),
            Ok(_) => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(false),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

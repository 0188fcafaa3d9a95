//! TCP transport and handshake for the collector connection.

use std::{
    io::{self, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

/// Remote collector endpoint.
#[derive(Clone, Debug)]
pub struct Endpoint {
    /// Hostname or IP address to connect to.
    pub host: String,
    /// TCP port number.
    pub port: u16,
}

impl Endpoint {
    fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Open a TCP connection to the collector, trying each resolved address in
/// turn with the configured timeout.
pub(crate) fn connect(
    endpoint: &Endpoint,
    connect_timeout: Duration,
    write_timeout: Duration,
) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in endpoint.socket_addrs()? {
        match TcpStream::connect_timeout(&addr, connect_timeout) {
            Ok(stream) => {
                stream.set_write_timeout(Some(write_timeout))?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses resolved for {endpoint}"),
        )
    }))
}

/// Write the authentication handshake.
///
/// Sent exactly once per connection; the protocol defines no acknowledgement,
/// so this is fire and forget.
pub(crate) fn authenticate(stream: &mut TcpStream, api_key: &str) -> io::Result<()> {
    let handshake = format!("hello version 1.0\nauthenticate {api_key}\n");
    stream.write_all(handshake.as_bytes())
}

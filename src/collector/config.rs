//! Configuration consumed by the collector worker.

use std::time::Duration;

use super::transport::Endpoint;

/// Default bound on the pending-message queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5000;
/// Default timeout applied when establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Default ceiling on the reconnect backoff delay.
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_secs(15);
/// Hostname of the hosted collector service.
pub const DEFAULT_COLLECTOR_HOST: &str = "collector.instrumentalapp.com";
/// Port of the hosted collector service.
pub const DEFAULT_COLLECTOR_PORT: u16 = 8000;

/// Configuration object describing how to construct a
/// [`Collector`](super::Collector).
#[derive(Clone, Debug)]
pub struct CollectorConfig {
    pub api_key: String,
    pub endpoint: Endpoint,
    pub capacity: usize,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub max_reconnect_delay: Duration,
}

impl CollectorConfig {
    /// Defaults targeting the hosted collector service.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: Endpoint {
                host: DEFAULT_COLLECTOR_HOST.into(),
                port: DEFAULT_COLLECTOR_PORT,
            },
            capacity: DEFAULT_QUEUE_CAPACITY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_reconnect_delay: DEFAULT_MAX_RECONNECT_DELAY,
        }
    }

    /// Override the collector endpoint.
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.endpoint = Endpoint {
            host: host.into(),
            port,
        };
        self
    }

    /// Override the queue capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Override the reconnect backoff ceiling.
    pub fn with_max_reconnect_delay(mut self, max_delay: Duration) -> Self {
        self.max_reconnect_delay = max_delay;
        self
    }
}

//! Caller-facing metrics facade.
//!
//! [`Agent`] validates metric names, formats wire-protocol lines, and hands
//! them to a [`Collector`] for background delivery. All methods are cheap
//! and non-blocking unless the agent was built in synchronous mode, in which
//! case a full queue applies backpressure instead of dropping.


use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    collector::{Collector, CollectorConfig, CollectorError},
    validate,
};

/// Errors raised at the producer boundary, before a line enters the queue.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The metric name (or configured prefix) does not match the protocol's
    /// name syntax.
    #[error("invalid metric name: {0}")]
    InvalidMetricName(String),
    /// The notice text contains a carriage return or newline.
    #[error("invalid notice message: {0}")]
    InvalidNotice(String),
    #[error(transparent)]
    Collector(#[from] CollectorError),
}

/// Builder for [`Agent`].
#[derive(Clone, Debug, Default)]
pub struct AgentBuilder {
    api_key: String,
    prefix: Option<String>,
    synchronous: bool,
    endpoint: Option<(String, u16)>,
    capacity: Option<usize>,
}

impl AgentBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Prepend `prefix` to every metric name. Notices are exempt. A usable
    /// prefix ends with a dot, e.g. `"myapp."`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Block callers until the queue has room instead of dropping lines.
    pub fn synchronous(mut self, synchronous: bool) -> Self {
        self.synchronous = synchronous;
        self
    }

    /// Target a collector other than the hosted service.
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.endpoint = Some((host.into(), port));
        self
    }

    /// Override the pending-message queue capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Build the agent, starting the delivery worker unless the API key is
    /// empty.
    pub fn build(self) -> Result<Agent, AgentError> {
        let prefix = self.prefix.unwrap_or_default();
        if !prefix.is_empty() && !validate::metric_name_is_valid(&format!("{prefix}fake")) {
            return Err(AgentError::InvalidMetricName(prefix));
        }
        let collector = if self.api_key.is_empty() {
            None
        } else {
            let mut config = CollectorConfig::new(self.api_key);
            if let Some((host, port)) = self.endpoint {
                config = config.with_endpoint(host, port);
            }
            if let Some(capacity) = self.capacity {
                config = config.with_capacity(capacity);
            }
            Some(Collector::with_config(config))
        };
        Ok(Agent {
            collector,
            prefix,
            synchronous: self.synchronous,
        })
    }
}

/// Metrics client.
///
/// An empty API key yields a disabled agent: calls still validate their
/// inputs but no collector or worker thread exists and nothing is sent.
#[derive(Debug)]
pub struct Agent {
    collector: Option<Collector>,
    prefix: String,
    synchronous: bool,
}

impl Agent {
    /// Construct an agent with default configuration.
    pub fn new(api_key: impl Into<String>) -> Result<Self, AgentError> {
        AgentBuilder::new(api_key).build()
    }

    /// Report a gauge reading taken now.
    pub fn gauge(&self, name: &str, value: f64) -> Result<(), AgentError> {
        self.gauge_at(name, value, Utc::now())
    }

    /// Report a gauge reading taken at `time`.
    pub fn gauge_at(&self, name: &str, value: f64, time: DateTime<Utc>) -> Result<(), AgentError> {
        self.send_metric("gauge", name, value, time)
    }

    /// Report an absolute gauge reading taken now.
    pub fn gauge_absolute(&self, name: &str, value: f64) -> Result<(), AgentError> {
        self.gauge_absolute_at(name, value, Utc::now())
    }

    /// Report an absolute gauge reading taken at `time`.
    pub fn gauge_absolute_at(
        &self,
        name: &str,
        value: f64,
        time: DateTime<Utc>,
    ) -> Result<(), AgentError> {
        self.send_metric("gauge_absolute", name, value, time)
    }

    /// Increment a counter by one.
    pub fn increment(&self, name: &str) -> Result<(), AgentError> {
        self.increment_at(name, 1.0, Utc::now())
    }

    /// Increment a counter by `value`.
    pub fn increment_by(&self, name: &str, value: f64) -> Result<(), AgentError> {
        self.increment_at(name, value, Utc::now())
    }

    /// Increment a counter by `value` at `time`.
    pub fn increment_at(
        &self,
        name: &str,
        value: f64,
        time: DateTime<Utc>,
    ) -> Result<(), AgentError> {
        self.send_metric("increment", name, value, time)
    }

    /// Record a notice describing an event happening now.
    ///
    /// Notices do not receive the agent prefix. `duration` is the length of
    /// the event in seconds; pass zero for instantaneous events.
    pub fn notice(&self, message: &str, duration: f64) -> Result<(), AgentError> {
        self.notice_at(message, duration, Utc::now())
    }

    /// Record a notice describing an event at `time`.
    pub fn notice_at(
        &self,
        message: &str,
        duration: f64,
        time: DateTime<Utc>,
    ) -> Result<(), AgentError> {
        if !validate::notice_is_valid(message) {
            return Err(AgentError::InvalidNotice(message.to_owned()));
        }
        self.deliver(format_notice(message, duration, time))
    }

    /// Run `action`, then report its elapsed time in seconds as a gauge.
    ///
    /// Returns whatever the closure returned.
    pub fn time<R>(&self, name: &str, action: impl FnOnce() -> R) -> Result<R, AgentError> {
        self.time_scaled(name, 1.0, action)
    }

    /// Run `action`, then report its elapsed time in milliseconds as a gauge.
    pub fn time_ms<R>(&self, name: &str, action: impl FnOnce() -> R) -> Result<R, AgentError> {
        self.time_scaled(name, 1000.0, action)
    }

    fn time_scaled<R>(
        &self,
        name: &str,
        multiplier: f64,
        action: impl FnOnce() -> R,
    ) -> Result<R, AgentError> {
        let start = Instant::now();
        let result = action();
        self.gauge(name, start.elapsed().as_secs_f64() * multiplier)?;
        Ok(result)
    }

    fn send_metric(
        &self,
        kind: &str,
        name: &str,
        value: f64,
        time: DateTime<Utc>,
    ) -> Result<(), AgentError> {
        if !validate::metric_name_is_valid(name) {
            return Err(AgentError::InvalidMetricName(name.to_owned()));
        }
        self.deliver(format_metric(kind, &self.prefix, name, value, time))
    }

    fn deliver(&self, line: String) -> Result<(), AgentError> {
        if let Some(collector) = &self.collector {
            // A full queue is a drop policy, not an error; the queue logs it.
            collector.send(&line, self.synchronous)?;
        }
        Ok(())
    }
}

fn format_metric(kind: &str, prefix: &str, name: &str, value: f64, time: DateTime<Utc>) -> String {
    format!("{kind} {prefix}{name} {value} {}\n", time.timestamp())
}

fn format_notice(message: &str, duration: f64, time: DateTime<Utc>) -> String {
    format!("notice {} {duration} {message}\n", time.timestamp())
}

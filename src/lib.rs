//! Client for the Instrumental metrics collector protocol.
//!
//! Application code records gauges, increments, and notices through
//! [`Agent`]; a background worker thread owned by the [`collector`] module
//! delivers the formatted protocol lines to the remote collector over a
//! persistent TCP connection, reconnecting with backoff across outages.
//!
//! Delivery is best effort. Lines queue up in a bounded buffer during an
//! outage and are dropped once it fills; drops and reconnects are reported
//! through the [`log`] facade. No failure in the delivery path ever reaches
//! the caller, and nothing blocks the caller unless synchronous mode is
//! requested. There is no graceful shutdown: the worker runs for the life
//! of the client and queued lines are abandoned at process exit, matching
//! the transient nature of the telemetry.
//!
//! ```no_run
//! use instrumental_agent::AgentBuilder;
//!
//! # fn main() -> Result<(), instrumental_agent::AgentError> {
//! let agent = AgentBuilder::new("my-api-key")
//!     .with_prefix("myapp.")
//!     .build()?;
//! agent.increment("requests.count")?;
//! agent.gauge("queue.depth", 42.0)?;
//! agent.time("job.duration", || run_job())?;
//! # Ok(())
//! # }
//! # fn run_job() {}
//! ```

mod agent;
pub mod collector;
mod validate;

pub use agent::{Agent, AgentBuilder, AgentError};
pub use collector::{Collector, CollectorConfig, CollectorError, Endpoint};

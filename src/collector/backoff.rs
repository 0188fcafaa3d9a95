//! Reconnect backoff state machine used by the collector worker.

use std::time::Duration;

/// Tracks consecutive connection failures and produces reconnect delays.
///
/// The delay grows quadratically with the failure count and is capped at the
/// configured ceiling. A single fixed endpoint needs no jitter: the first
/// failure of a streak reconnects immediately, and sustained outages settle
/// at the ceiling within a handful of attempts.
pub(crate) struct BackoffState {
    failures: u32,
    max_delay: Duration,
}

impl BackoffState {
    pub(crate) fn new(max_delay: Duration) -> Self {
        Self {
            failures: 0,
            max_delay,
        }
    }

    /// Number of consecutive failures recorded so far.
    pub(crate) fn failures(&self) -> u32 {
        self.failures
    }

    /// Reset the streak after a successful connect and authenticate.
    pub(crate) fn record_success(&mut self) {
        self.failures = 0;
    }

    /// Record a failure and return the delay to sleep before reconnecting.
    ///
    /// Delays run 0s, 1s, 4s, 9s, ... up to the ceiling.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_secs(u64::from(self.failures).saturating_pow(2)).min(self.max_delay);
        self.failures = self.failures.saturating_add(1);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_quadratically_to_the_ceiling() {
        let mut backoff = BackoffState::new(Duration::from_secs(15));
        let delays: Vec<u64> = (0..6).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![0, 1, 4, 9, 15, 15]);
        assert_eq!(backoff.failures(), 6);
    }

    #[test]
    fn success_resets_the_streak() {
        let mut backoff = BackoffState::new(Duration::from_secs(15));
        for _ in 0..4 {
            backoff.next_delay();
        }
        backoff.record_success();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.next_delay(), Duration::ZERO);
    }

    #[test]
    fn delays_never_decrease_within_a_streak() {
        let mut backoff = BackoffState::new(Duration::from_secs(15));
        let mut previous = backoff.next_delay();
        for _ in 0..10 {
            let next = backoff.next_delay();
            assert!(next >= previous);
            previous = next;
        }
    }
}

//! Exponential backoff for reconnection

use std::time::Duration;

/// Reconnection schedule: exponential backoff with a cap and an attempt limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnection attempt
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Attempts allowed without an intervening successful open
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 1000,
        }
    }
}

impl ReconnectPolicy {
    /// `min(initial_delay * 2^attempt, max_delay)`, saturating instead of overflowing
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Whether another attempt is allowed after `attempts` consecutive failures
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

use std::time::Duration;

/// Trait for defining reconnection strategies
///
/// Implement this trait to control how the manager behaves when a socket
/// closes with a non-normal code.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before reconnection attempt number `attempt`
    ///
    /// # Arguments
    /// * `attempt` - The reconnection attempt number (1-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Check if another attempt may be scheduled
    ///
    /// # Arguments
    /// * `attempts` - Number of attempts already made since the last successful open
    fn should_reconnect(&self, attempts: u32) -> bool;
}

/// Linear backoff reconnection strategy
///
/// Delays grow by `step` per attempt: `step * attempt`, capped at `max_delay`.
/// The defaults give 1s, 2s, 3s, 4s, 5s for five attempts.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    step: Duration,
    max_delay: Duration,
    max_attempts: u32,
}

impl LinearBackoff {
    /// Create a new linear backoff strategy
    ///
    /// # Arguments
    /// * `step` - Delay added per attempt
    /// * `max_delay` - The maximum delay between reconnects
    /// * `max_attempts` - Attempts allowed before the manager parks the endpoint
    pub fn new(step: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            step,
            max_delay,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(5000), 5)
    }
}

impl ReconnectionStrategy for LinearBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let delay = self.step.saturating_mul(attempt);
        Some(delay.min(self.max_delay))
    }

    fn should_reconnect(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

/// Never reconnect strategy
///
/// Sockets stay closed after any disconnection until `connect` is called again
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn should_reconnect(&self, _attempts: u32) -> bool {
        false
    }
}

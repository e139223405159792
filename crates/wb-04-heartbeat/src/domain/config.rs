use std::time::Duration;

/// Default time between pings.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5_000);

/// Default time to wait for a pong.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3_000);

/// Heartbeat timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Time between ping attempts.
    pub interval: Duration,
    /// How long a ping may stay unanswered.
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HeartbeatConfig {
    /// Config from millisecond values.
    #[must_use]
    pub fn from_millis(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

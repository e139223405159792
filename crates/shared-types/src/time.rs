//! Wall-clock time port.

/// Abstract interface for wall-clock timestamps in milliseconds.
///
/// Enables deterministic testing by injecting controllable time sources.
/// Production uses [`SystemTimeSource`]; timer tests use a clock driven by
/// the (paused) tokio runtime.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch (or since the test origin).
    fn now_millis(&self) -> u64;
}

/// Production time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};

        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Time source that always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource(u64);

impl FixedTimeSource {
    /// Clock stuck at `millis`.
    #[must_use]
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }
}

impl TimeSource for FixedTimeSource {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

use shared_types::TimeSource;
use tokio::time::Instant;

/// Milliseconds since creation, measured on the tokio clock.
///
/// Follows paused and advanced time in tests.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    origin: Instant,
}

impl RuntimeClock {
    /// Clock reading zero now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for RuntimeClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

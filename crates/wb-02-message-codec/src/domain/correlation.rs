use shared_types::{SystemTimeSource, TimeSource};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Strictly monotonic correlation-ID generator seeded from the wall clock.
///
/// Each ID is `max(previous + 1, now_ms)`, so IDs stay close to the send
/// time yet never repeat, even for several requests in the same millisecond
/// or across a backwards clock step.
pub struct CorrelationIds {
    last: AtomicU64,
    clock: Arc<dyn TimeSource>,
}

impl CorrelationIds {
    /// Generator backed by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemTimeSource::new()))
    }

    /// Generator backed by a custom clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            last: AtomicU64::new(0),
            clock,
        }
    }

    /// Allocate the next ID.
    pub fn next_id(&self) -> u64 {
        let now = self.clock.now_millis();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    /// Most recently allocated ID (0 before the first allocation).
    #[must_use]
    pub fn last_id(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }

    /// Current time of the underlying clock.
    #[must_use]
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }
}

impl Default for CorrelationIds {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CorrelationIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationIds")
            .field("last", &self.last_id())
            .finish_non_exhaustive()
    }
}

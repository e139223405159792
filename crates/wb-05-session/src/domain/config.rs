use wb_04_heartbeat::HeartbeatConfig;

/// Upper bound of outstanding requests tracked for correlation.
pub const DEFAULT_MAX_PENDING_CALLS: usize = 64;

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Heartbeat timing while connected.
    pub heartbeat: HeartbeatConfig,
    /// Requests tracked for response correlation; the oldest is evicted
    /// beyond this.
    pub max_pending_calls: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat: HeartbeatConfig::default(),
            max_pending_calls: DEFAULT_MAX_PENDING_CALLS,
        }
    }
}

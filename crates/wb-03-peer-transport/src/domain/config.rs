use std::time::Duration;

/// Default bound on waiting for the signaling server to accept the endpoint.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Settings handed to the transport when an endpoint is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// How long `initialize` waits for the endpoint to open.
    pub open_timeout: Duration,
    /// STUN/TURN server URLs for connectivity checks.
    pub ice_servers: Vec<String>,
    /// Verbosity passed through to the transport (0 = silent).
    pub debug: u8,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            ice_servers: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
            ],
            debug: 1,
        }
    }
}

impl TransportConfig {
    /// Override the open timeout.
    #[must_use]
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }
}

use wb_02_message_codec::{Envelope, Heartbeat, HeartbeatAction};

/// At most one outstanding ping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatCycle {
    outstanding: Option<u64>,
}

impl HeartbeatCycle {
    /// Empty cycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send time of the outstanding ping.
    #[must_use]
    pub fn outstanding(&self) -> Option<u64> {
        self.outstanding
    }

    /// Whether a new ping may be sent.
    #[must_use]
    pub fn can_ping(&self) -> bool {
        self.outstanding.is_none()
    }

    /// Record a ping sent at `sent_at`. Refused while one is outstanding.
    pub fn record_ping(&mut self, sent_at: u64) -> bool {
        if self.outstanding.is_some() {
            return false;
        }
        self.outstanding = Some(sent_at);
        true
    }

    /// Match a pong against the outstanding ping.
    ///
    /// Returns the round-trip time in milliseconds and disarms the cycle when
    /// `echoed_sent_at` is the outstanding ping; otherwise leaves the cycle
    /// untouched.
    pub fn on_pong(&mut self, echoed_sent_at: u64, now: u64) -> Option<u64> {
        match self.outstanding {
            Some(sent_at) if sent_at == echoed_sent_at => {
                self.outstanding = None;
                Some(now.saturating_sub(sent_at))
            }
            _ => None,
        }
    }

    /// Forget any outstanding ping.
    pub fn reset(&mut self) {
        self.outstanding = None;
    }
}

/// Pong for a remote ping, echoing its `sentAt`. `None` for anything else.
#[must_use]
pub fn answer_ping(heartbeat: &Heartbeat, now: u64) -> Option<Envelope> {
    match heartbeat.action {
        HeartbeatAction::Ping => Some(Envelope::pong(heartbeat.sent_at, now)),
        HeartbeatAction::Pong => None,
    }
}

use shared_bus::BusEvent;
use shared_types::{ChannelInfo, SessionIdentity, SessionState};
use std::fmt;
use std::time::Duration;
use wb_02_message_codec::Envelope;

/// Why the session left `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// The wallet or the transport closed the channel.
    ChannelClosed,
    /// No pong within the heartbeat timeout.
    LivenessTimeout,
    /// Lost the signaling server with no channel open.
    ServerLost,
    /// `disconnect()` or `destroy()` was called.
    LocalRequest,
}

impl DisconnectReason {
    /// Stable label for logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelClosed => "channel_closed",
            Self::LivenessTimeout => "liveness_timeout",
            Self::ServerLost => "server_lost",
            Self::LocalRequest => "local_request",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a frame on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameDirection {
    /// Received from the wallet.
    Inbound,
    /// Sent to the wallet.
    Outbound,
}

/// Host signals that the dApp became active again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleTrigger {
    /// The page or window became visible.
    VisibilityRegained,
    /// The window gained focus.
    FocusGained,
}

/// Everything the session tells its observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A wallet channel is open and the heartbeat runs.
    Connected {
        /// Local session identity.
        identity: SessionIdentity,
        /// The connected wallet.
        wallet: ChannelInfo,
    },
    /// The session left `Connected`, or lost the signaling server.
    Disconnected {
        /// Cause.
        reason: DisconnectReason,
    },
    /// An envelope from the wallet (heartbeats excluded).
    Message(Envelope),
    /// A transport error.
    Error(String),
    /// The session state changed.
    StatusChanged {
        /// Previous state.
        from: SessionState,
        /// New state.
        to: SessionState,
    },
    /// Human-readable system notice.
    Notice(String),
    /// The wallet answered a heartbeat ping.
    Latency(Duration),
    /// A frame crossed the channel.
    Frame {
        /// Inbound or outbound.
        direction: FrameDirection,
        /// Envelope kind label.
        kind: &'static str,
    },
}

/// Topic of a [`SessionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionTopic {
    /// [`SessionEvent::Connected`]
    Connected,
    /// [`SessionEvent::Disconnected`]
    Disconnected,
    /// [`SessionEvent::Message`]
    Message,
    /// [`SessionEvent::Error`]
    Error,
    /// [`SessionEvent::StatusChanged`]
    StatusChanged,
    /// [`SessionEvent::Notice`]
    Notice,
    /// [`SessionEvent::Latency`]
    Latency,
    /// [`SessionEvent::Frame`]
    Frame,
}

impl BusEvent for SessionEvent {
    type Topic = SessionTopic;

    fn topic(&self) -> SessionTopic {
        match self {
            Self::Connected { .. } => SessionTopic::Connected,
            Self::Disconnected { .. } => SessionTopic::Disconnected,
            Self::Message(_) => SessionTopic::Message,
            Self::Error(_) => SessionTopic::Error,
            Self::StatusChanged { .. } => SessionTopic::StatusChanged,
            Self::Notice(_) => SessionTopic::Notice,
            Self::Latency(_) => SessionTopic::Latency,
            Self::Frame { .. } => SessionTopic::Frame,
        }
    }
}

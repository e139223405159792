use shared_bus::BusEvent;
use shared_types::{ChannelId, ChannelInfo, SessionIdentity, TransportError};

/// What the adapter tells its consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The endpoint is registered with the signaling server.
    Opened(SessionIdentity),
    /// A wallet channel finished opening and is now the current channel.
    IncomingChannel(ChannelInfo),
    /// A frame arrived on the current channel.
    Data(String),
    /// The current channel was closed by the remote side or the transport.
    ChannelClosed(ChannelId),
    /// Lost the signaling server while no channel is open.
    ServerDisconnected,
    /// The endpoint was closed for good.
    Closed,
    /// Transport-level failure.
    Error(TransportError),
}

/// Topic of a [`TransportEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportTopic {
    /// [`TransportEvent::Opened`]
    Opened,
    /// [`TransportEvent::IncomingChannel`]
    IncomingChannel,
    /// [`TransportEvent::Data`]
    Data,
    /// [`TransportEvent::ChannelClosed`]
    ChannelClosed,
    /// [`TransportEvent::ServerDisconnected`]
    ServerDisconnected,
    /// [`TransportEvent::Closed`]
    Closed,
    /// [`TransportEvent::Error`]
    Error,
}

impl BusEvent for TransportEvent {
    type Topic = TransportTopic;

    fn topic(&self) -> TransportTopic {
        match self {
            Self::Opened(_) => TransportTopic::Opened,
            Self::IncomingChannel(_) => TransportTopic::IncomingChannel,
            Self::Data(_) => TransportTopic::Data,
            Self::ChannelClosed(_) => TransportTopic::ChannelClosed,
            Self::ServerDisconnected => TransportTopic::ServerDisconnected,
            Self::Closed => TransportTopic::Closed,
            Self::Error(_) => TransportTopic::Error,
        }
    }
}

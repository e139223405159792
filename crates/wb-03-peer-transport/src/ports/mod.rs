//! # Ports Layer
//!
//! Capabilities the adapter needs from a concrete peer-to-peer stack
//! (a WebRTC signaling client, an in-process hub, ...).

use shared_types::{ChannelId, ChannelInfo, SessionIdentity, TransportError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::domain::TransportConfig;

/// Stream of raw signals from one endpoint.
pub type PeerSignalReceiver = mpsc::UnboundedReceiver<PeerSignal>;

/// Factory for rendezvous endpoints.
pub trait PeerTransport: Send + Sync {
    /// Register an endpoint under `identity`.
    ///
    /// Returns immediately; the endpoint reports [`PeerSignal::Open`] on the
    /// receiver once the signaling server accepts it.
    fn create(
        &self,
        identity: &SessionIdentity,
        config: &TransportConfig,
    ) -> Result<(Arc<dyn PeerEndpoint>, PeerSignalReceiver), TransportError>;
}

/// A registered rendezvous endpoint.
pub trait PeerEndpoint: Send + Sync + fmt::Debug {
    /// Identity the endpoint is registered under.
    fn id(&self) -> SessionIdentity;

    /// Connected to the signaling server.
    fn is_open(&self) -> bool;

    /// Destroyed; cannot be resumed.
    fn is_destroyed(&self) -> bool;

    /// Reconnect to the signaling server, keeping the identity.
    fn reconnect(&self);

    /// Tear down the endpoint and every channel it owns.
    fn destroy(&self);
}

/// Duplex text link to a remote peer.
pub trait DataChannel: Send + Sync + fmt::Debug {
    /// Channel descriptor.
    fn info(&self) -> ChannelInfo;

    /// Ready to carry frames.
    fn is_open(&self) -> bool;

    /// Send one frame.
    fn send(&self, frame: &str) -> Result<(), TransportError>;

    /// Close the channel. Emits [`PeerSignal::ChannelClose`].
    fn close(&self);
}

/// Raw signal from an endpoint or one of its channels.
#[derive(Clone)]
pub enum PeerSignal {
    /// Endpoint registered.
    Open(SessionIdentity),
    /// A remote peer started opening a channel.
    Connection(Arc<dyn DataChannel>),
    /// Channel is ready.
    ChannelOpen(ChannelId),
    /// Frame received on a channel.
    ChannelData(ChannelId, String),
    /// Channel closed.
    ChannelClose(ChannelId),
    /// Channel-level failure.
    ChannelError(ChannelId, TransportError),
    /// Endpoint-level failure.
    Error(TransportError),
    /// Lost the signaling server; the endpoint may be resumed.
    Disconnected,
    /// Endpoint closed for good.
    Close,
}

impl fmt::Debug for PeerSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(id) => f.debug_tuple("Open").field(id).finish(),
            Self::Connection(channel) => f.debug_tuple("Connection").field(&channel.info()).finish(),
            Self::ChannelOpen(id) => f.debug_tuple("ChannelOpen").field(id).finish(),
            Self::ChannelData(id, frame) => f
                .debug_tuple("ChannelData")
                .field(id)
                .field(&frame.len())
                .finish(),
            Self::ChannelClose(id) => f.debug_tuple("ChannelClose").field(id).finish(),
            Self::ChannelError(id, e) => f.debug_tuple("ChannelError").field(id).field(e).finish(),
            Self::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Self::Disconnected => f.write_str("Disconnected"),
            Self::Close => f.write_str("Close"),
        }
    }
}

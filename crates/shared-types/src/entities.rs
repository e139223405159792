//! # Domain Entities
//!
//! Identity, channel and session-state types shared across subsystems.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable rendezvous identifier of this dApp instance.
///
/// Derived once from a device fingerprint and persisted; see the identity
/// subsystem for the generation rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    /// Wrap an already formatted identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identity, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Transport-assigned identifier of a single data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// Descriptor of a data channel to a remote wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Transport-assigned channel identifier.
    pub id: ChannelId,
    /// Rendezvous identifier of the remote wallet.
    pub remote: String,
}

impl ChannelInfo {
    /// Create a channel descriptor.
    pub fn new(id: ChannelId, remote: impl Into<String>) -> Self {
        Self {
            id,
            remote: remote.into(),
        }
    }
}

/// States of the wallet session.
///
/// Exactly one value is current at any time. Transitions are owned by the
/// session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No `initialize()` call yet.
    #[default]
    Uninitialized,
    /// Waiting for the signaling server to assign our identity.
    Initializing,
    /// Identity assigned; waiting for a wallet channel.
    Ready,
    /// A wallet channel is open and the heartbeat is running.
    Connected,
    /// The wallet link was lost; a new incoming channel reconnects.
    Disconnected,
    /// Destroyed; a fresh `initialize()` is required.
    Closed,
    /// Transport failed while no channel was open.
    Errored,
}

impl SessionState {
    /// Stable lowercase name, used for logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }

    /// Whether the signaling side is up (our identity is assigned).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready | Self::Connected | Self::Disconnected)
    }

    /// Whether a new incoming wallet channel may be accepted in this state.
    #[must_use]
    pub fn accepts_channel(&self) -> bool {
        matches!(self, Self::Ready | Self::Disconnected)
    }

    /// Whether `initialize()` has to start a new attempt from this state.
    #[must_use]
    pub fn needs_initialize(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Closed | Self::Errored)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the dApp reaches the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionMode {
    /// Rendered inside the wallet's embedded browser; the in-page API is used.
    InAppBrowser,
    /// Direct peer-to-peer link negotiated through the signaling service.
    P2p,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InAppBrowser => f.write_str("in-app-browser"),
            Self::P2p => f.write_str("p2p"),
        }
    }
}

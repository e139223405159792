//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Failures of the underlying peer transport or its signaling link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The signaling server refused or dropped the registration.
    #[error("Signaling failed: {0}")]
    SignalingFailed(String),

    /// The requested remote peer is not reachable.
    ///
    /// Not fatal to an in-flight initialization.
    #[error("Peer unavailable: {0}")]
    PeerUnavailable(String),

    /// The data channel reported an error.
    #[error("Channel failed: {0}")]
    ChannelFailed(String),

    /// Handing a frame to the channel failed.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The endpoint did not open within the configured bound.
    #[error("Timed out after {0}ms waiting for the signaling server")]
    OpenTimeout(u64),

    /// The endpoint was destroyed before the operation completed.
    #[error("Transport destroyed")]
    Destroyed,

    /// The transport could not be created at all.
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    /// Whether this error ends an in-flight initialization attempt.
    #[must_use]
    pub fn is_fatal_to_init(&self) -> bool {
        !matches!(self, Self::PeerUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_unavailable_is_not_fatal() {
        assert!(!TransportError::PeerUnavailable("wallet-1".into()).is_fatal_to_init());
        assert!(TransportError::SignalingFailed("down".into()).is_fatal_to_init());
        assert!(TransportError::Destroyed.is_fatal_to_init());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TransportError::OpenTimeout(20000).to_string(),
            "Timed out after 20000ms waiting for the signaling server"
        );
        assert_eq!(TransportError::Destroyed.to_string(), "Transport destroyed");
    }
}

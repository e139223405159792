use shared_types::TransportError;
use thiserror::Error;

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The transport failed to open or resume.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The session was destroyed while the operation was running, or the
    /// operation needs a fresh `initialize()`.
    #[error("Session closed")]
    Closed,

    /// `reconnect()` before any `initialize()`.
    #[error("Session not initialized")]
    NotInitialized,
}

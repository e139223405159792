//! # Domain Layer
//!
//! Session events, configuration, errors and the pending-call table.

mod config;
mod errors;
mod events;
mod pending;

pub use config::{SessionConfig, DEFAULT_MAX_PENDING_CALLS};
pub use errors::SessionError;
pub use events::{DisconnectReason, FrameDirection, LifecycleTrigger, SessionEvent, SessionTopic};
pub use pending::{PendingCall, PendingCalls};

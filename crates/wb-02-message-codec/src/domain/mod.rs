//! # Domain Layer
//!
//! Envelope types, well-known wallet methods and correlation IDs.

mod correlation;
mod envelope;
mod method;

pub use correlation::CorrelationIds;
pub use envelope::{
    Envelope, Heartbeat, HeartbeatAction, RequestEnvelope, ResponseEnvelope, TextMessage,
};
pub use method::{demo_transaction, WalletMethod};

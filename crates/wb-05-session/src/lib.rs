//! # Session Manager Subsystem
//!
//! **Subsystem ID:** 5
//!
//! Owns the session state machine. Consumes transport events, runs the
//! heartbeat while a wallet is connected, decodes frames, correlates
//! responses with requests and republishes everything observers care about
//! on its own bus.
//!
//! ## State Machine
//!
//! ```text
//!  Uninitialized ──initialize──► Initializing ──opened──► Ready
//!                                     │                    │ incoming channel
//!                                   error                  ▼
//!                                     ▼     ┌──────────► Connected
//!                                  Errored  │ incoming       │ closed / liveness
//!                                           │ channel        │ timeout / disconnect()
//!                                           │                ▼
//!                                           └─────────── Disconnected
//!
//!  any ──destroy()/transport closed──► Closed
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let session = Session::new(adapter, SessionConfig::default());
//! session.subscribe(EventFilter::topic(SessionTopic::Message), |event| {
//!     println!("{event:?}");
//! });
//! session.initialize().await?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod adapters;
pub mod domain;
pub mod service;

pub use domain::{
    DisconnectReason, FrameDirection, LifecycleTrigger, PendingCall, PendingCalls, SessionConfig,
    SessionError, SessionEvent, SessionTopic, DEFAULT_MAX_PENDING_CALLS,
};
pub use service::Session;

/// Bus type carrying session events.
pub type SessionBus = shared_bus::InMemoryEventBus<SessionEvent>;

//! # Heartbeat Monitor Subsystem
//!
//! **Subsystem ID:** 4
//!
//! Detects a dead wallet channel that the transport has not (yet) reported
//! as closed. While running, one ping is sent per interval; if its pong does
//! not arrive within the timeout the link is told liveness was lost, once,
//! and the monitor stops.
//!
//! ```text
//!   tick ──► ping(sentAt) ──► wait ≤ timeout ──► pong(sentAt) ──► latency
//!                                   │
//!                                   └── expired ──► liveness_lost(epoch)
//! ```
//!
//! Incoming pings are answered independently of the local cycle.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::RuntimeClock;
pub use domain::{answer_ping, HeartbeatConfig, HeartbeatCycle};
pub use ports::HeartbeatLink;
pub use service::HeartbeatMonitor;

//! # Wiring
//!
//! Connects session events to the rest of the process.
//!
//! ```text
//! Session bus ──► MetricsBridge ──► Prometheus registry
//!            └──► log_wallet_messages ──► tracing
//! ```

mod message_log;
mod metrics_bridge;

pub use message_log::log_wallet_messages;
pub use metrics_bridge::MetricsBridge;

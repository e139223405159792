//! # Domain Layer
//!
//! Pure heartbeat bookkeeping. Times are milliseconds of the monitor clock.

mod config;
mod cycle;

pub use config::{HeartbeatConfig, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
pub use cycle::{answer_ping, HeartbeatCycle};

//! # Integration Scenarios
//!
//! Every scenario runs the real session stack over `MemoryTransport`, with
//! the test playing the wallet through `WalletHandle`. Timer scenarios run on
//! a paused tokio clock.

#[cfg(test)]
mod fixtures;

pub mod codec_contract;
pub mod identity_persistence;
pub mod service_manager;
pub mod session_flows;

//! # Bridge Runtime Library
//!
//! Composition root of the wallet bridge. The `wallet-bridge` binary is a
//! demo built on top of it and needs the `demo` feature, which brings in the
//! in-memory transport and the scripted wallet.
//!
//! ## Modules
//!
//! - `config/` - TOML configuration with `WB_*` environment overrides
//! - `container/` - builds the identity → transport → session stack
//! - `manager/` - connection mode detection, shared init, cleanup
//! - `in_app/` - direct wallet access inside the wallet browser
//! - `ports/` - in-page wallet capability
//! - `adapters/` - scripted in-page wallet (feature `demo`)
//! - `wiring/` - session events into metrics and logs
//!
//! ## Startup Sequence
//!
//! 1. Initialise telemetry
//! 2. Load configuration (file, then environment)
//! 3. Build the session over a peer transport
//! 4. Attach the metrics bridge
//! 5. `ServiceManager::initialize()` decides the connection mode

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

#[cfg(any(test, feature = "demo"))]
pub mod adapters;
pub mod config;
pub mod container;
pub mod errors;
pub mod in_app;
pub mod manager;
pub mod ports;
pub mod wiring;

pub use config::{BridgeConfig, ConfigError};
pub use container::{build_identity, build_session};
pub use errors::RuntimeError;
pub use in_app::{InAppEvent, InAppTopic, InAppWalletService, TxRequest};
pub use manager::ServiceManager;
pub use ports::{InPageWallet, TxMetadata, WalletApi, WalletError};
pub use wiring::{log_wallet_messages, MetricsBridge};

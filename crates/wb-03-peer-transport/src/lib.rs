//! # Peer Transport Subsystem
//!
//! **Subsystem ID:** 3
//!
//! Owns the rendezvous endpoint and the single data channel to the wallet.
//! Raw transport signals are pumped through one task per endpoint
//! generation and republished as [`TransportEvent`]s on the adapter's bus.
//!
//! ## Guarantees
//!
//! - Concurrent [`TransportAdapter::initialize`] calls share one attempt;
//!   no second endpoint is created while one is opening.
//! - At most one channel is open; later incoming channels are closed.
//! - A server disconnect is not reported while a channel is open.
//! - Signals from a superseded endpoint generation are dropped.
//! - [`TransportAdapter::send`] without an open channel returns `false`
//!   and never touches the transport.
//!
//! ## Architecture
//!
//! - **Domain Layer:** [`TransportConfig`], [`TransportEvent`]
//! - **Ports Layer:** [`PeerTransport`], [`PeerEndpoint`], [`DataChannel`]
//! - **Service Layer:** [`TransportAdapter`]
//! - **Adapters Layer:** `MemoryTransport` (feature `test-utils`)

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub use adapters::{MemoryTransport, WalletHandle};
pub use domain::{TransportConfig, TransportEvent, TransportTopic};
pub use ports::{DataChannel, PeerEndpoint, PeerSignal, PeerSignalReceiver, PeerTransport};
pub use service::TransportAdapter;

/// Bus type carrying transport events.
pub type TransportBus = shared_bus::InMemoryEventBus<TransportEvent>;

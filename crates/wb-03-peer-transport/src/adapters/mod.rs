//! # Adapters Layer
//!
//! Concrete transports. Production transports (WebRTC signaling clients)
//! live with the host; this crate only ships the in-process hub used by
//! tests and the demo runtime.

#[cfg(any(test, feature = "test-utils"))]
mod memory;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryTransport, WalletHandle};

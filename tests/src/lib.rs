//! # Wallet-Bridge Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (codec, pending calls)
//! └── src/integration/  # Cross-crate session scenarios
//!     ├── fixtures.rs           # Session over the in-memory transport
//!     ├── codec_contract.rs     # Wire format guarantees
//!     ├── identity_persistence.rs
//!     ├── session_flows.rs      # Init, heartbeat, correlation
//!     └── service_manager.rs    # Mode detection and metrics wiring
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p bridge-tests
//!
//! # By category
//! cargo test -p bridge-tests integration::session_flows::
//!
//! # Benchmarks
//! cargo bench -p bridge-tests
//! ```

#![allow(dead_code)]

pub mod integration;

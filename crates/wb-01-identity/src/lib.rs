//! # Identity Provider Subsystem
//!
//! **Subsystem ID:** 1
//!
//! Derives and persists the stable rendezvous identifier of this dApp
//! instance. The identifier is generated once from a low-entropy device
//! fingerprint plus the creation time, stored under a fixed key, and reused
//! for as long as the stored value exists.
//!
//! ## Architecture
//!
//! - **Domain Layer:** fingerprint canonicalisation, hashing, id formatting
//! - **Ports Layer:** `KeyValueStore`, `FingerprintSource`
//! - **Service Layer:** [`IdentityProvider`]
//! - **Adapters Layer:** memory/file stores, system/static fingerprints
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wb_01_identity::{IdentityProvider, MemoryStore, StaticFingerprint};
//!
//! let provider = IdentityProvider::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(StaticFingerprint::default()),
//! );
//! let first = provider.get_or_create();
//! assert_eq!(provider.get_or_create(), first);
//! assert!(first.as_str().starts_with("dapp-"));
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileStore, MemoryStore, StaticFingerprint, SystemFingerprint};
pub use domain::{format_identity, to_radix, Fingerprint, StorageError};
pub use ports::{FingerprintSource, KeyValueStore};
pub use service::IdentityProvider;

/// Storage key the identity is persisted under.
pub const DAPP_PEER_ID_KEY: &str = "dapp-peer-id";

/// Prefix of every generated dApp identity.
pub const IDENTITY_PREFIX: &str = "dapp";

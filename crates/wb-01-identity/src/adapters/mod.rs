//! # Adapters Layer
//!
//! Concrete stores and fingerprint sources.

mod file_store;
mod fingerprint;
mod memory_store;

pub use file_store::FileStore;
pub use fingerprint::{StaticFingerprint, SystemFingerprint};
pub use memory_store::MemoryStore;

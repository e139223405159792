//! # Ports Layer
//!
//! Driven ports this subsystem requires from the host.

use crate::domain::{Fingerprint, StorageError};

/// Durable key-value storage of the host (browser local storage, a file, ...).
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Source of the device fingerprint.
pub trait FingerprintSource: Send + Sync {
    /// Collect the current fingerprint.
    fn fingerprint(&self) -> Fingerprint;
}

use thiserror::Error;

/// Failures of a [`KeyValueStore`](crate::ports::KeyValueStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backing medium could not be read or written.
    #[error("Storage I/O failed: {0}")]
    Io(String),

    /// The stored document exists but is not a valid key-value map.
    #[error("Storage corrupted: {0}")]
    Corrupt(String),

    /// No storage is available in this environment.
    #[error("Storage unavailable")]
    Unavailable,
}

//! # Domain Layer
//!
//! Pure identity derivation: no storage, no clocks.

mod errors;
mod fingerprint;

pub use errors::StorageError;
pub use fingerprint::{format_identity, to_radix, Fingerprint};

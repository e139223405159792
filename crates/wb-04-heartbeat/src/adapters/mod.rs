//! # Adapters Layer

mod clock;

pub use clock::RuntimeClock;

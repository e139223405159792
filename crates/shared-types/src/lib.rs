//! # Shared Types Crate
//!
//! This crate contains the domain entities shared by every session subsystem:
//! the persisted [`SessionIdentity`], the [`SessionState`] machine states,
//! channel descriptors, the transport error taxonomy and the [`TimeSource`]
//! port used for wall-clock timestamps.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **No Ambient Clocks**: Components that stamp envelopes take a
//!   `TimeSource` so timer-driven behaviour stays testable.

pub mod entities;
pub mod errors;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use time::{FixedTimeSource, SystemTimeSource, TimeSource};

//! # Domain Layer

mod config;
mod events;

pub use config::TransportConfig;
pub use events::{TransportEvent, TransportTopic};

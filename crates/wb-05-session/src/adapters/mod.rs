//! # Adapters Layer

mod heartbeat_link;

pub(crate) use heartbeat_link::SessionLink;

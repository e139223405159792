//! # Shared Bus - Typed Event Bus for Session Subsystems
//!
//! Decouples producers (transport adapter, session manager) from consumers
//! (session manager, UI wiring, metrics). Every bus is an explicitly
//! constructed value handed around as an `Arc`; there is no process-global
//! instance.
//!
//! ## Delivery
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Producer    │    publish()       │  Consumer    │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │ ─────────┘
//!                  │              │  on() / subscribe()
//!                  └──────────────┘
//! ```
//!
//! - **Handlers** (`on`/`off`) run synchronously inside `publish`, in
//!   registration order. A panicking handler is logged and skipped; the
//!   remaining handlers still receive the event.
//! - **Subscriptions** (`subscribe`) are broadcast receivers for async
//!   consumers and tests.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{BusEvent, EventFilter};
pub use publisher::{EventPublisher, Handler, HandlerId, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

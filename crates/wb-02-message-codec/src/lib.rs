//! # Message Codec Subsystem
//!
//! **Subsystem ID:** 2
//!
//! Converts between wire frames and typed [`Envelope`]s. Decoding is total:
//! any frame that is not a recognised envelope is passed through verbatim as
//! [`Envelope::Opaque`].
//!
//! ## Wire Format
//!
//! | Variant   | JSON                                                          |
//! |-----------|---------------------------------------------------------------|
//! | Request   | `{"kind":"request","method","payload","correlationId"}`       |
//! | Response  | `{"kind":"response","method","payload"?,"error"?,"correlationId"?}` |
//! | Text      | `{"message"}` (no `kind`)                                     |
//! | Heartbeat | `{"kind":"heartbeat","action":"ping"\|"pong","sentAt","receivedAt"?}` |
//!
//! ## Example
//!
//! ```rust
//! use wb_02_message_codec::{decode, encode, Envelope};
//!
//! let frame = encode(&Envelope::text("hello wallet"));
//! assert_eq!(frame, r#"{"message":"hello wallet"}"#);
//! assert_eq!(decode(&frame), Envelope::text("hello wallet"));
//! assert_eq!(decode("not json"), Envelope::Opaque("not json".into()));
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod codec;
pub mod domain;

pub use codec::{decode, encode, MessageCodec};
pub use domain::{
    demo_transaction, CorrelationIds, Envelope, Heartbeat, HeartbeatAction, RequestEnvelope,
    ResponseEnvelope, TextMessage, WalletMethod,
};

//! # Codec Service
//!
//! Pure `encode`/`decode` plus [`MessageCodec`], which adds correlation-ID
//! assignment for outgoing requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::TimeSource;
use std::sync::Arc;
use tracing::{debug, error};

use crate::domain::{
    CorrelationIds, Envelope, Heartbeat, RequestEnvelope, ResponseEnvelope, WalletMethod,
};

/// `kind`-tagged envelopes, as they appear on the wire.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Tagged {
    Request(RequestEnvelope),
    Response(ResponseEnvelope),
    Heartbeat(Heartbeat),
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum TaggedRef<'a> {
    Request(&'a RequestEnvelope),
    Response(&'a ResponseEnvelope),
    Heartbeat(&'a Heartbeat),
}

/// Serialise an envelope to its wire frame.
///
/// An [`Envelope::Opaque`] is returned unchanged.
#[must_use]
pub fn encode(envelope: &Envelope) -> String {
    let result = match envelope {
        Envelope::Request(r) => serde_json::to_string(&TaggedRef::Request(r)),
        Envelope::Response(r) => serde_json::to_string(&TaggedRef::Response(r)),
        Envelope::Heartbeat(h) => serde_json::to_string(&TaggedRef::Heartbeat(h)),
        Envelope::Text(t) => serde_json::to_string(t),
        Envelope::Opaque(raw) => return raw.clone(),
    };

    result.unwrap_or_else(|e| {
        error!(kind = envelope.kind_label(), error = %e, "Failed to encode envelope");
        String::new()
    })
}

/// Parse a wire frame. Never fails: unrecognised frames become
/// [`Envelope::Opaque`] holding the raw input.
#[must_use]
pub fn decode(raw: &str) -> Envelope {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return fallback(raw, &e.to_string()),
    };

    let Value::Object(map) = &value else {
        return fallback(raw, "not a JSON object");
    };

    if map.contains_key("kind") {
        return match serde_json::from_value::<Tagged>(value) {
            Ok(Tagged::Request(r)) => Envelope::Request(r),
            Ok(Tagged::Response(r)) => Envelope::Response(r),
            Ok(Tagged::Heartbeat(h)) => Envelope::Heartbeat(h),
            Err(e) => fallback(raw, &e.to_string()),
        };
    }

    match map.get("message") {
        Some(Value::String(message)) => Envelope::text(message.clone()),
        _ => fallback(raw, "object without kind or text message"),
    }
}

fn fallback(raw: &str, reason: &str) -> Envelope {
    debug!(reason, len = raw.len(), "Passing frame through as opaque text");
    Envelope::Opaque(raw.to_string())
}

/// Codec with a correlation-ID generator for outgoing requests.
#[derive(Debug, Default)]
pub struct MessageCodec {
    ids: CorrelationIds,
}

impl MessageCodec {
    /// Codec using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec using a custom clock for correlation IDs.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            ids: CorrelationIds::with_clock(clock),
        }
    }

    /// Build a request with a fresh correlation ID.
    pub fn request(&self, method: impl Into<String>, payload: Value) -> Envelope {
        Envelope::request(method, payload, self.ids.next_id())
    }

    /// Build a `signTx` request. `None` sends the demo payment.
    pub fn sign_transaction(&self, payload: Option<Value>) -> Envelope {
        let payload =
            payload.unwrap_or_else(|| crate::domain::demo_transaction(self.ids.now_millis()));
        self.request(WalletMethod::SignTx.as_str(), payload)
    }

    /// See [`encode`].
    #[must_use]
    pub fn encode(&self, envelope: &Envelope) -> String {
        encode(envelope)
    }

    /// See [`decode`].
    #[must_use]
    pub fn decode(&self, raw: &str) -> Envelope {
        decode(raw)
    }

    /// The correlation-ID generator.
    #[must_use]
    pub fn ids(&self) -> &CorrelationIds {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HeartbeatAction;
    use serde_json::json;

    struct FixedClock(u64);

    impl TimeSource for FixedClock {
        fn now_millis(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_round_trip_each_variant() {
        let envelopes = [
            Envelope::request("signTx", json!({"amount": "2.5 ADA"}), 42),
            Envelope::response("signTx", json!({"signature": "ab"}), Some(42)),
            Envelope::error_response("signTx", "declined", None),
            Envelope::text("hello"),
            Envelope::ping(1_000),
            Envelope::pong(1_000, 1_200),
        ];
        for envelope in envelopes {
            assert_eq!(decode(&encode(&envelope)), envelope);
        }
    }

    #[test]
    fn test_request_wire_shape() {
        let frame = encode(&Envelope::request("signTx", Value::Null, 7));
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({"kind": "request", "method": "signTx", "payload": null, "correlationId": 7})
        );
    }

    #[test]
    fn test_response_omits_absent_fields() {
        let frame = encode(&Envelope::error_response("signTx", "no", None));
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({"kind": "response", "method": "signTx", "error": "no"}));
    }

    #[test]
    fn test_text_has_no_kind() {
        assert_eq!(encode(&Envelope::text("hi")), r#"{"message":"hi"}"#);
    }

    #[test]
    fn test_decode_wallet_frames() {
        let pong = decode(r#"{"kind":"heartbeat","action":"pong","sentAt":1000,"receivedAt":1300}"#);
        assert_eq!(
            pong,
            Envelope::Heartbeat(Heartbeat {
                action: HeartbeatAction::Pong,
                sent_at: 1_000,
                received_at: Some(1_300),
            })
        );

        let request = decode(r#"{"kind":"request","method":"getBalance","correlationId":3}"#);
        assert_eq!(request, Envelope::request("getBalance", Value::Null, 3));

        let text = decode(r#"{"message":"hi","from":"wallet"}"#);
        assert_eq!(text, Envelope::text("hi"));
    }

    #[test]
    fn test_malformed_frames_are_opaque() {
        let cases = [
            "not json",
            "",
            "42",
            r#"["message"]"#,
            r#"{"kind":"bogus"}"#,
            r#"{"kind":"request","method":"signTx"}"#,
            r#"{"kind":"heartbeat","action":"wave","sentAt":1}"#,
            r#"{"message":7}"#,
            r#"{"hello":"world"}"#,
        ];
        for raw in cases {
            assert_eq!(decode(raw), Envelope::Opaque(raw.to_string()), "frame {raw}");
        }
    }

    #[test]
    fn test_opaque_encodes_verbatim() {
        let raw = "  {broken ";
        assert_eq!(encode(&Envelope::Opaque(raw.into())), raw);
        assert_eq!(decode(&encode(&decode(raw))), Envelope::Opaque(raw.into()));
    }

    #[test]
    fn test_codec_assigns_increasing_ids() {
        let codec = MessageCodec::with_clock(Arc::new(FixedClock(500)));
        let first = codec.request("a", Value::Null);
        let second = codec.request("b", Value::Null);
        assert_eq!(first.correlation_id(), Some(500));
        assert_eq!(second.correlation_id(), Some(501));
    }

    #[test]
    fn test_sign_transaction_defaults_to_demo_payment() {
        let codec = MessageCodec::with_clock(Arc::new(FixedClock(9)));
        let Envelope::Request(request) = codec.sign_transaction(None) else {
            panic!("expected a request");
        };
        assert_eq!(request.method, "signTx");
        assert_eq!(request.payload["metadata"], "dApp Payment #9");

        let custom = codec.sign_transaction(Some(json!({"cbor": "84a4"})));
        assert_eq!(custom.method(), Some("signTx"));
    }
}

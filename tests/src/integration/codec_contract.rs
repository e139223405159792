//! # Wire Contract
//!
//! The frames the wallet app expects, checked through the public codec.

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use wb_02_message_codec::{decode, encode, Envelope, MessageCodec};

    fn wire(envelope: &Envelope) -> Value {
        serde_json::from_str(&encode(envelope)).unwrap()
    }

    #[test]
    fn test_every_variant_survives_the_wire() {
        let envelopes = [
            Envelope::request("signTx", json!({"cbor": "84a4"}), 1_700_000_000_001),
            Envelope::response("signTx", json!({"signature": "ab"}), Some(1_700_000_000_001)),
            Envelope::error_response("signTx", "User rejected", None),
            Envelope::text("hello"),
            Envelope::ping(1_000),
            Envelope::pong(1_000, 1_250),
        ];

        for envelope in envelopes {
            assert_eq!(decode(&encode(&envelope)), envelope);
        }
    }

    #[test]
    fn test_non_json_is_opaque() {
        assert_eq!(decode("not json"), Envelope::Opaque("not json".into()));
        assert_eq!(encode(&Envelope::Opaque("not json".into())), "not json");
    }

    #[test]
    fn test_wire_shapes() {
        assert_eq!(
            wire(&Envelope::request("signTx", json!({}), 42)),
            json!({"kind": "request", "method": "signTx", "payload": {}, "correlationId": 42})
        );
        assert_eq!(
            wire(&Envelope::error_response("signTx", "denied", Some(42))),
            json!({"kind": "response", "method": "signTx", "error": "denied", "correlationId": 42})
        );
        assert_eq!(wire(&Envelope::text("hi")), json!({"message": "hi"}));
        assert_eq!(
            wire(&Envelope::ping(7)),
            json!({"kind": "heartbeat", "action": "ping", "sentAt": 7})
        );
        assert_eq!(
            wire(&Envelope::pong(7, 9)),
            json!({"kind": "heartbeat", "action": "pong", "sentAt": 7, "receivedAt": 9})
        );
    }

    #[test]
    fn test_frames_from_other_wallet_builds() {
        // Unknown kinds and missing fields fall back instead of failing.
        assert!(matches!(decode(r#"{"kind":"telemetry","x":1}"#), Envelope::Opaque(_)));
        assert!(matches!(decode(r#"{"kind":"request","method":"signTx"}"#), Envelope::Opaque(_)));
        assert!(matches!(decode(r#"{"message":5}"#), Envelope::Opaque(_)));
        assert!(matches!(decode("[1,2,3]"), Envelope::Opaque(_)));

        // A request without payload still decodes.
        let Envelope::Request(request) =
            decode(r#"{"kind":"request","method":"getBalance","correlationId":3}"#)
        else {
            panic!("expected request");
        };
        assert_eq!(request.payload, Value::Null);
    }

    #[test]
    fn test_codec_ids_increase() {
        let codec = MessageCodec::new();
        let first = codec.request("getBalance", Value::Null);
        let second = codec.sign_transaction(None);
        assert!(second.correlation_id() > first.correlation_id());
    }
}

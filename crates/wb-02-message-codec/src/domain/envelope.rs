//! Typed envelopes exchanged over the wallet channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::method::WalletMethod;

/// A call to a wallet method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// Method name, e.g. `signTx`.
    pub method: String,
    /// Method argument; `null` when absent.
    #[serde(default)]
    pub payload: Value,
    /// Sender-assigned ID the response should echo.
    pub correlation_id: u64,
}

/// The wallet's answer to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Method this response answers.
    pub method: String,
    /// Result value; `null` for error responses.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
    /// Rejection or failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Echoed request ID, when the wallet supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<u64>,
}

impl ResponseEnvelope {
    /// Whether the wallet reported a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Free-form text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    /// The text.
    pub message: String,
}

/// Direction of a heartbeat frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatAction {
    /// Liveness probe.
    Ping,
    /// Answer to a probe.
    Pong,
}

/// Liveness probe or its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    /// Ping or pong.
    pub action: HeartbeatAction,
    /// Send time of the ping, echoed unchanged in the pong.
    pub sent_at: u64,
    /// Time the ping was received; pongs only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<u64>,
}

/// A message unit exchanged over the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Method call.
    Request(RequestEnvelope),
    /// Method result.
    Response(ResponseEnvelope),
    /// Plain text.
    Text(TextMessage),
    /// Ping or pong.
    Heartbeat(Heartbeat),
    /// Frame that is not a recognised envelope, kept byte-for-byte.
    Opaque(String),
}

impl Envelope {
    /// Request with an explicit correlation ID.
    #[must_use]
    pub fn request(method: impl Into<String>, payload: Value, correlation_id: u64) -> Self {
        Self::Request(RequestEnvelope {
            method: method.into(),
            payload,
            correlation_id,
        })
    }

    /// Successful response.
    #[must_use]
    pub fn response(method: impl Into<String>, payload: Value, correlation_id: Option<u64>) -> Self {
        Self::Response(ResponseEnvelope {
            method: method.into(),
            payload,
            error: None,
            correlation_id,
        })
    }

    /// Failed or rejected response.
    #[must_use]
    pub fn error_response(
        method: impl Into<String>,
        error: impl Into<String>,
        correlation_id: Option<u64>,
    ) -> Self {
        Self::Response(ResponseEnvelope {
            method: method.into(),
            payload: Value::Null,
            error: Some(error.into()),
            correlation_id,
        })
    }

    /// Plain text message.
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            message: message.into(),
        })
    }

    /// Heartbeat ping stamped with `sent_at`.
    #[must_use]
    pub fn ping(sent_at: u64) -> Self {
        Self::Heartbeat(Heartbeat {
            action: HeartbeatAction::Ping,
            sent_at,
            received_at: None,
        })
    }

    /// Heartbeat pong echoing `sent_at`.
    #[must_use]
    pub fn pong(sent_at: u64, received_at: u64) -> Self {
        Self::Heartbeat(Heartbeat {
            action: HeartbeatAction::Pong,
            sent_at,
            received_at: Some(received_at),
        })
    }

    /// Short variant name, used as a metric label.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Response(_) => "response",
            Self::Text(_) => "text",
            Self::Heartbeat(_) => "heartbeat",
            Self::Opaque(_) => "opaque",
        }
    }

    /// Method name of requests and responses.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Response(r) => Some(&r.method),
            _ => None,
        }
    }

    /// Correlation ID carried by the envelope, if any.
    #[must_use]
    pub fn correlation_id(&self) -> Option<u64> {
        match self {
            Self::Request(r) => Some(r.correlation_id),
            Self::Response(r) => r.correlation_id,
            _ => None,
        }
    }

    /// Human-readable lines for a message log.
    ///
    /// A signed `signTx` yields the confirmation followed by the signature
    /// and status when the wallet supplies them.
    #[must_use]
    pub fn display_lines(&self) -> Vec<String> {
        match self {
            Self::Response(r) if WalletMethod::from_wire(&r.method) == Some(WalletMethod::SignTx) => {
                if let Some(error) = &r.error {
                    return vec![format!("Transaction REJECTED: {error}")];
                }
                let mut lines = vec!["Transaction SIGNED!".to_string()];
                if let Some(signature) = r.payload.get("signature") {
                    lines.push(format!("Signature: {}", plain(signature)));
                }
                if let Some(status) = r.payload.get("status") {
                    lines.push(format!("Status: {}", plain(status)));
                }
                lines
            }
            Self::Response(r) => match &r.error {
                Some(error) => vec![format!("{} failed: {error}", r.method)],
                None => vec![format!("{}: {}", r.method, r.payload)],
            },
            Self::Text(t) => vec![t.message.clone()],
            Self::Opaque(raw) => vec![raw.clone()],
            other => vec![crate::codec::encode(other)],
        }
    }

    /// Single-line rendering of [`display_lines`](Self::display_lines).
    #[must_use]
    pub fn summary(&self) -> String {
        self.display_lines().join(" | ")
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let request = Envelope::request("signTx", json!({"amount": 1}), 42);
        assert_eq!(request.kind_label(), "request");
        assert_eq!(request.method(), Some("signTx"));
        assert_eq!(request.correlation_id(), Some(42));

        let response = Envelope::response("signTx", json!(null), None);
        assert_eq!(response.correlation_id(), None);
        assert_eq!(Envelope::text("hi").method(), None);
        assert_eq!(Envelope::ping(1).kind_label(), "heartbeat");
    }

    #[test]
    fn test_signed_transaction_lines() {
        let response = Envelope::response(
            "signTx",
            json!({"signature": "ab12", "status": "submitted"}),
            Some(42),
        );
        assert_eq!(
            response.display_lines(),
            vec!["Transaction SIGNED!", "Signature: ab12", "Status: submitted"]
        );
    }

    #[test]
    fn test_rejected_transaction_line() {
        let response = Envelope::error_response("signTx", "user declined", Some(42));
        assert_eq!(response.summary(), "Transaction REJECTED: user declined");
    }

    #[test]
    fn test_other_response_lines() {
        let balance = Envelope::response("getBalance", json!({"ada": 10}), None);
        assert_eq!(balance.summary(), r#"getBalance: {"ada":10}"#);

        let failed = Envelope::error_response("getBalance", "locked", None);
        assert_eq!(failed.summary(), "getBalance failed: locked");
    }

    #[test]
    fn test_text_and_opaque_lines() {
        assert_eq!(Envelope::text("hello").summary(), "hello");
        assert_eq!(Envelope::Opaque("<<raw>>".into()).summary(), "<<raw>>");
        assert!(Envelope::ping(7).summary().contains(r#""sentAt":7"#));
    }
}

use serde_json::{json, Value};
use std::fmt;

/// Well-known wallet method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletMethod {
    /// Ask the wallet to sign a transaction.
    SignTx,
}

impl WalletMethod {
    /// Wire name of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignTx => "signTx",
        }
    }

    /// Look up a well-known method by wire name.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "signTx" => Some(Self::SignTx),
            _ => None,
        }
    }
}

impl fmt::Display for WalletMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder payment used when a signature is requested without a payload.
#[must_use]
pub fn demo_transaction(now_millis: u64) -> Value {
    json!({
        "type": "Payment",
        "amount": "2.5 ADA",
        "recipient": "addr1qxyz...abc123",
        "fee": "0.17 ADA",
        "metadata": format!("dApp Payment #{now_millis}"),
    })
}

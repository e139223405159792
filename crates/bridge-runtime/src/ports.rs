//! # Ports Layer
//!
//! Capabilities of the wallet's embedded browser. When the dApp is rendered
//! inside the wallet, the wallet injects an API into the page and no peer
//! transport is needed.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Failures reported by the in-page wallet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No wallet API has been enabled.
    #[error("Wallet API not available")]
    NotAvailable,

    /// The wallet refused to hand out its API.
    #[error("Wallet refused to enable: {0}")]
    EnableRefused(String),

    /// The user declined the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The call failed inside the wallet.
    #[error("Wallet call failed: {0}")]
    CallFailed(String),
}

/// Human-readable details shown in the wallet's native signing dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxMetadata {
    /// Transaction kind, e.g. `Payment`.
    #[serde(rename = "type")]
    pub tx_type: String,
    /// Amount as displayed.
    pub amount: String,
    /// Receiving address.
    pub recipient: String,
    /// Fee as displayed.
    pub fee: String,
    /// Purchased item, if any.
    pub item: Option<String>,
    /// Free-form description.
    pub description: String,
}

/// Wallet injected into the page (e.g. `window.cardano.<wallet>`).
#[async_trait]
pub trait InPageWallet: Send + Sync {
    /// Display name of the wallet.
    fn name(&self) -> String;

    /// Ask the wallet for its API.
    async fn enable(&self) -> Result<Arc<dyn WalletApi>, WalletError>;
}

/// API handed out by an enabled in-page wallet.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Balance in the smallest unit.
    async fn get_balance(&self) -> Result<String, WalletError>;

    /// Addresses that have been used on chain.
    async fn get_used_addresses(&self) -> Result<Vec<String>, WalletError>;

    /// Sign `cbor`; returns the signature.
    async fn sign_tx(
        &self,
        cbor: &str,
        partial: bool,
        metadata: &TxMetadata,
    ) -> Result<String, WalletError>;
}

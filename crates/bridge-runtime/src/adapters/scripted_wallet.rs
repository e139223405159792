//! In-page wallet with canned answers.
//!
//! Stands in for the wallet browser in the demo binary and in tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::ports::{InPageWallet, TxMetadata, WalletApi, WalletError};

#[derive(Debug)]
struct Script {
    balance: String,
    addresses: Vec<String>,
    refuse_enable: bool,
    reject_signing: bool,
    signed: Arc<Mutex<Vec<TxMetadata>>>,
}

/// [`InPageWallet`] whose answers are fixed up front.
#[derive(Debug, Clone)]
pub struct ScriptedWallet {
    name: String,
    script: Arc<Script>,
}

impl ScriptedWallet {
    /// Wallet named `name` that enables and signs everything.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Arc::new(Script {
                balance: "0".to_string(),
                addresses: vec!["addr_test1qdemo".to_string()],
                refuse_enable: false,
                reject_signing: false,
                signed: Arc::new(Mutex::new(Vec::new())),
            }),
        }
    }

    /// Report `balance`.
    #[must_use]
    pub fn with_balance(self, balance: impl Into<String>) -> Self {
        self.map(|script| script.balance = balance.into())
    }

    /// Refuse to enable.
    #[must_use]
    pub fn refusing(self) -> Self {
        self.map(|script| script.refuse_enable = true)
    }

    /// Reject every signing request.
    #[must_use]
    pub fn rejecting(self) -> Self {
        self.map(|script| script.reject_signing = true)
    }

    /// Metadata of every transaction signed so far.
    #[must_use]
    pub fn signed(&self) -> Arc<Mutex<Vec<TxMetadata>>> {
        Arc::clone(&self.script.signed)
    }

    fn map(self, edit: impl FnOnce(&mut Script)) -> Self {
        let mut script = Script {
            balance: self.script.balance.clone(),
            addresses: self.script.addresses.clone(),
            refuse_enable: self.script.refuse_enable,
            reject_signing: self.script.reject_signing,
            signed: Arc::clone(&self.script.signed),
        };
        edit(&mut script);
        Self {
            name: self.name,
            script: Arc::new(script),
        }
    }
}

#[async_trait]
impl InPageWallet for ScriptedWallet {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn enable(&self) -> Result<Arc<dyn WalletApi>, WalletError> {
        if self.script.refuse_enable {
            return Err(WalletError::EnableRefused(format!("{} is locked", self.name)));
        }
        Ok(Arc::new(ScriptedApi(Arc::clone(&self.script))))
    }
}

struct ScriptedApi(Arc<Script>);

#[async_trait]
impl WalletApi for ScriptedApi {
    async fn get_balance(&self) -> Result<String, WalletError> {
        Ok(self.0.balance.clone())
    }

    async fn get_used_addresses(&self) -> Result<Vec<String>, WalletError> {
        Ok(self.0.addresses.clone())
    }

    async fn sign_tx(
        &self,
        cbor: &str,
        _partial: bool,
        metadata: &TxMetadata,
    ) -> Result<String, WalletError> {
        if self.0.reject_signing {
            return Err(WalletError::Rejected("user declined".to_string()));
        }
        let mut signed = self.0.signed.lock();
        signed.push(metadata.clone());
        Ok(format!("sig-{}-{}", signed.len(), cbor.len()))
    }
}

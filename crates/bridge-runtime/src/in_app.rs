//! # In-App Wallet Service
//!
//! Used instead of the peer session when the dApp runs inside the wallet's
//! embedded browser. Detection, enabling and signing go straight through the
//! injected [`InPageWallet`] API.

use parking_lot::Mutex;
use shared_bus::{BusEvent, EventFilter, EventPublisher, HandlerId, InMemoryEventBus, Subscription};
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::ports::{InPageWallet, TxMetadata, WalletApi, WalletError};

/// Fee shown when the request does not name one.
pub const DEFAULT_FEE: &str = "0.17 ADA";

/// Placeholder transaction body handed to the wallet for signing.
#[must_use]
pub fn mock_tx_cbor() -> String {
    format!("84a40081825820{}00", "00".repeat(32))
}

/// What the dApp wants signed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxRequest {
    /// Transaction kind; `Payment` when unset.
    pub tx_type: Option<String>,
    /// Amount as displayed.
    pub amount: String,
    /// Receiving address.
    pub recipient: String,
    /// Fee as displayed; [`DEFAULT_FEE`] when unset.
    pub fee: Option<String>,
    /// Purchased item.
    pub product_name: Option<String>,
    /// Description; `Transaction <millis>` when unset.
    pub description: Option<String>,
}

impl TxRequest {
    /// Payment of `amount` to `recipient`.
    #[must_use]
    pub fn payment(amount: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            recipient: recipient.into(),
            ..Self::default()
        }
    }

    /// Dialog metadata with defaults filled in.
    #[must_use]
    pub fn metadata(&self, now_millis: u64) -> TxMetadata {
        TxMetadata {
            tx_type: self.tx_type.clone().unwrap_or_else(|| "Payment".to_string()),
            amount: self.amount.clone(),
            recipient: self.recipient.clone(),
            fee: self.fee.clone().unwrap_or_else(|| DEFAULT_FEE.to_string()),
            item: self.product_name.clone(),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| format!("Transaction {now_millis}")),
        }
    }
}

/// Events of the in-app wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InAppEvent {
    /// The in-page wallet was enabled.
    Connected {
        /// Wallet name.
        name: String,
        /// Balance at connect time.
        balance: String,
    },
    /// The wallet signed a transaction.
    TransactionSigned {
        /// Returned signature.
        signature: String,
        /// The signed request.
        request: TxRequest,
    },
    /// Signing failed or was declined.
    TransactionRejected {
        /// Why.
        error: WalletError,
        /// The rejected request.
        request: TxRequest,
    },
    /// The dApp handed control back to the wallet.
    Disconnected,
}

/// Topic of an [`InAppEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InAppTopic {
    /// [`InAppEvent::Connected`]
    Connected,
    /// [`InAppEvent::TransactionSigned`]
    TransactionSigned,
    /// [`InAppEvent::TransactionRejected`]
    TransactionRejected,
    /// [`InAppEvent::Disconnected`]
    Disconnected,
}

impl BusEvent for InAppEvent {
    type Topic = InAppTopic;

    fn topic(&self) -> InAppTopic {
        match self {
            Self::Connected { .. } => InAppTopic::Connected,
            Self::TransactionSigned { .. } => InAppTopic::TransactionSigned,
            Self::TransactionRejected { .. } => InAppTopic::TransactionRejected,
            Self::Disconnected => InAppTopic::Disconnected,
        }
    }
}

/// Bus type carrying in-app wallet events.
pub type InAppBus = InMemoryEventBus<InAppEvent>;

/// Direct wallet access inside the wallet browser.
pub struct InAppWalletService {
    wallet: Option<Arc<dyn InPageWallet>>,
    clock: Arc<dyn TimeSource>,
    api: Mutex<Option<Arc<dyn WalletApi>>>,
    bus: Arc<InAppBus>,
}

impl InAppWalletService {
    /// Service over the injected wallet, `None` outside the wallet browser.
    #[must_use]
    pub fn new(wallet: Option<Arc<dyn InPageWallet>>) -> Self {
        Self {
            wallet,
            clock: Arc::new(SystemTimeSource::new()),
            api: Mutex::new(None),
            bus: Arc::new(InAppBus::new()),
        }
    }

    /// Use `clock` for default transaction descriptions.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Detect the wallet browser and enable the wallet.
    ///
    /// Returns `true` when running inside the wallet browser with an enabled
    /// API. Enable or balance failures are logged and reported as `false`.
    pub async fn initialize(&self) -> bool {
        let Some(wallet) = self.wallet.as_ref() else {
            info!("Not running in wallet browser, P2P mode available");
            return false;
        };

        let name = wallet.name();
        info!(wallet = %name, "Wallet browser detected");

        let api = match wallet.enable().await {
            Ok(api) => api,
            Err(e) => {
                error!(wallet = %name, error = %e, "Failed to enable wallet");
                return false;
            }
        };

        let balance = match api.get_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                error!(wallet = %name, error = %e, "Failed to read wallet balance");
                return false;
            }
        };
        info!(wallet = %name, %balance, "Wallet enabled");

        *self.api.lock() = Some(api);
        self.bus.publish(InAppEvent::Connected { name, balance });
        true
    }

    /// Whether an in-page wallet API is enabled.
    #[must_use]
    pub fn is_wallet_browser(&self) -> bool {
        self.api.lock().is_some()
    }

    /// The enabled wallet API.
    #[must_use]
    pub fn wallet_api(&self) -> Option<Arc<dyn WalletApi>> {
        self.api.lock().clone()
    }

    /// Have the wallet sign `request` in its native dialog.
    pub async fn sign_transaction(&self, request: TxRequest) -> Result<String, WalletError> {
        let api = self.wallet_api().ok_or(WalletError::NotAvailable)?;
        let metadata = request.metadata(self.clock.now_millis());

        match api.sign_tx(&mock_tx_cbor(), false, &metadata).await {
            Ok(signature) => {
                info!(%signature, "Transaction signed");
                self.bus.publish(InAppEvent::TransactionSigned {
                    signature: signature.clone(),
                    request,
                });
                Ok(signature)
            }
            Err(e) => {
                error!(error = %e, "Transaction signing failed");
                self.bus.publish(InAppEvent::TransactionRejected {
                    error: e.clone(),
                    request,
                });
                Err(e)
            }
        }
    }

    /// Current balance.
    pub async fn get_balance(&self) -> Result<String, WalletError> {
        let api = self.wallet_api().ok_or(WalletError::NotAvailable)?;
        api.get_balance().await
    }

    /// Used addresses.
    pub async fn get_addresses(&self) -> Result<Vec<String>, WalletError> {
        let api = self.wallet_api().ok_or(WalletError::NotAvailable)?;
        api.get_used_addresses().await
    }

    /// Hand control back to the wallet. `false` outside the wallet browser.
    pub fn disconnect(&self) -> bool {
        if self.api.lock().take().is_none() {
            debug!("Not in wallet browser, nothing to close");
            return false;
        }
        info!("Returning to wallet");
        self.bus.publish(InAppEvent::Disconnected);
        true
    }

    /// Register a handler for events matching `filter`.
    pub fn subscribe<F>(&self, filter: EventFilter<InAppTopic>, handler: F) -> HandlerId
    where
        F: Fn(&InAppEvent) + Send + Sync + 'static,
    {
        self.bus.on(filter, handler)
    }

    /// Remove a handler.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.bus.off(id)
    }

    /// Receive events matching `filter` asynchronously.
    #[must_use]
    pub fn events(&self, filter: EventFilter<InAppTopic>) -> Subscription<InAppEvent> {
        self.bus.subscribe(filter)
    }
}

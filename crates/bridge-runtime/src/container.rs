//! # Session Container
//!
//! Builds the session stack from configuration:
//! store → identity provider → transport adapter → session.

use std::sync::Arc;
use tracing::info;
use wb_01_identity::{FileStore, IdentityProvider, KeyValueStore, MemoryStore, SystemFingerprint};
use wb_03_peer_transport::{PeerTransport, TransportAdapter};
use wb_05_session::Session;

use crate::config::BridgeConfig;

/// Identity provider backed by the configured store.
#[must_use]
pub fn build_identity(config: &BridgeConfig) -> Arc<IdentityProvider> {
    let store: Arc<dyn KeyValueStore> = match &config.identity.store_path {
        Some(path) => {
            info!(path = %path.display(), "Persisting identity to file");
            Arc::new(FileStore::new(path))
        }
        None => {
            info!("No identity store configured, identity lives in memory");
            Arc::new(MemoryStore::new())
        }
    };

    Arc::new(
        IdentityProvider::new(store, Arc::new(SystemFingerprint::new()))
            .with_storage_key(config.identity.storage_key.clone()),
    )
}

/// Session over `transport`, configured from `config`.
#[must_use]
pub fn build_session(config: &BridgeConfig, transport: Arc<dyn PeerTransport>) -> Session {
    let adapter = TransportAdapter::new(transport, build_identity(config), config.transport_config());
    Session::new(adapter, config.session_config())
}

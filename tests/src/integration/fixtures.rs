//! Shared fixtures: a session wired to an in-memory transport.

use shared_bus::{EventFilter, Subscription};
use shared_types::TimeSource;
use std::sync::Arc;
use std::time::Duration;
use wb_01_identity::{IdentityProvider, KeyValueStore, MemoryStore, StaticFingerprint};
use wb_03_peer_transport::{MemoryTransport, TransportAdapter, TransportConfig, WalletHandle};
use wb_04_heartbeat::{HeartbeatConfig, RuntimeClock};
use wb_05_session::{Session, SessionConfig, SessionEvent, SessionTopic};

/// A session and the transport hub behind it.
pub struct Bridge {
    pub transport: MemoryTransport,
    pub session: Session,
}

impl Bridge {
    /// Session with default settings on an auto-opening transport.
    pub fn new() -> Self {
        Self::build(MemoryTransport::new(), SessionConfig::default(), None, None)
    }

    /// Session with the given heartbeat timing.
    pub fn with_heartbeat(interval_ms: u64, timeout_ms: u64) -> Self {
        let config = SessionConfig {
            heartbeat: HeartbeatConfig::from_millis(interval_ms, timeout_ms),
            ..SessionConfig::default()
        };
        Self::build(MemoryTransport::new(), config, None, None)
    }

    /// Session whose endpoints open only on `transport.open_endpoint()`.
    pub fn manual_open() -> Self {
        Self::build(MemoryTransport::manual_open(), SessionConfig::default(), None, None)
    }

    pub fn build(
        transport: MemoryTransport,
        config: SessionConfig,
        store: Option<Arc<dyn KeyValueStore>>,
        clock: Option<Arc<dyn TimeSource>>,
    ) -> Self {
        let store = store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let identity = Arc::new(IdentityProvider::new(store, Arc::new(StaticFingerprint::default())));
        let adapter =
            TransportAdapter::new(Arc::new(transport.clone()), identity, TransportConfig::default());
        let clock = clock.unwrap_or_else(|| Arc::new(RuntimeClock::new()));
        Self {
            transport,
            session: Session::with_clock(adapter, config, clock),
        }
    }

    /// Initialise and let a wallet connect.
    pub async fn connect(&self) -> WalletHandle {
        self.session.initialize().await.expect("session initializes");
        let wallet = self
            .transport
            .connect_wallet("wallet-1")
            .expect("endpoint accepts a wallet");
        settle().await;
        assert!(self.session.is_connected());
        wallet
    }

    /// Subscription to one topic.
    pub fn events(&self, topic: SessionTopic) -> Subscription<SessionEvent> {
        self.session.events(EventFilter::topic(topic))
    }
}

/// Let spawned tasks drain their queues.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Advance the paused clock by `ms`.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

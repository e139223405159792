//! # Identity Provider Service
//!
//! Resolves the session identity: reuse the persisted value when present,
//! otherwise generate one and persist it. Storage failures degrade to an
//! identity that lives for the lifetime of the provider.

use parking_lot::Mutex;
use shared_types::{SessionIdentity, SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::format_identity;
use crate::ports::{FingerprintSource, KeyValueStore};
use crate::DAPP_PEER_ID_KEY;

struct Resolved {
    identity: SessionIdentity,
    persistent: bool,
}

/// Source of the stable session identity.
///
/// Cheap to share behind an `Arc`; the first successful resolution is cached
/// and every later call returns the same value.
pub struct IdentityProvider {
    store: Arc<dyn KeyValueStore>,
    fingerprint: Arc<dyn FingerprintSource>,
    clock: Arc<dyn TimeSource>,
    storage_key: String,
    resolved: Mutex<Option<Resolved>>,
}

impl IdentityProvider {
    /// Create a provider over the given store and fingerprint source.
    pub fn new(store: Arc<dyn KeyValueStore>, fingerprint: Arc<dyn FingerprintSource>) -> Self {
        Self {
            store,
            fingerprint,
            clock: Arc::new(SystemTimeSource::new()),
            storage_key: DAPP_PEER_ID_KEY.to_string(),
            resolved: Mutex::new(None),
        }
    }

    /// Use a custom clock for the creation timestamp.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Persist under a key other than `dapp-peer-id`.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Storage key in use.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Return the session identity, creating and persisting it on first use.
    pub fn get_or_create(&self) -> SessionIdentity {
        let mut resolved = self.resolved.lock();
        if let Some(existing) = resolved.as_ref() {
            return existing.identity.clone();
        }

        let fresh = self.resolve();
        let identity = fresh.identity.clone();
        *resolved = Some(fresh);
        identity
    }

    /// Whether the identity is backed by the store.
    ///
    /// `false` before the first [`get_or_create`](Self::get_or_create) and
    /// after a storage degradation.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.resolved
            .lock()
            .as_ref()
            .is_some_and(|resolved| resolved.persistent)
    }

    fn resolve(&self) -> Resolved {
        match self.store.get(&self.storage_key) {
            Ok(Some(stored)) if !stored.trim().is_empty() => {
                info!(identity = %stored, "Reusing persisted session identity");
                Resolved {
                    identity: SessionIdentity::new(stored),
                    persistent: true,
                }
            }
            Ok(_) => {
                let identity = self.generate();
                match self.store.set(&self.storage_key, identity.as_str()) {
                    Ok(()) => {
                        info!(%identity, "Generated and persisted session identity");
                        Resolved {
                            identity,
                            persistent: true,
                        }
                    }
                    Err(e) => {
                        warn!(%identity, error = %e, "Could not persist session identity, using in-memory identity");
                        Resolved {
                            identity,
                            persistent: false,
                        }
                    }
                }
            }
            Err(e) => {
                let identity = self.generate();
                warn!(%identity, error = %e, "Storage unavailable, using in-memory identity");
                Resolved {
                    identity,
                    persistent: false,
                }
            }
        }
    }

    fn generate(&self) -> SessionIdentity {
        let fingerprint = self.fingerprint.fingerprint();
        let created_at = self.clock.now_millis();
        debug!(canonical = %fingerprint.canonical(), created_at, "Deriving session identity");
        SessionIdentity::new(format_identity(&fingerprint, created_at))
    }
}

//! # Service Manager
//!
//! Decides once how the dApp reaches the wallet and brings up the matching
//! service:
//!
//! - an in-page wallet is present → [`ConnectionMode::InAppBrowser`], the
//!   peer session is never started;
//! - otherwise → [`ConnectionMode::P2p`] and the session is initialised.
//!
//! Concurrent `initialize()` callers share one attempt. A failed attempt
//! leaves the manager uninitialised so it can be retried. The decided mode is
//! published through a `watch` channel, so [`ServiceManager::wait_for_mode`]
//! observes it no matter when it is called.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use shared_types::ConnectionMode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};
use wb_05_session::{LifecycleTrigger, Session};

use crate::errors::RuntimeError;
use crate::in_app::InAppWalletService;

type ModeResult = Result<ConnectionMode, RuntimeError>;

#[derive(Default)]
struct ManagerState {
    initialized: bool,
    generation: u64,
    in_flight: Option<Shared<BoxFuture<'static, ModeResult>>>,
}

/// Owns the session and the in-app wallet service.
pub struct ServiceManager {
    session: Session,
    in_app: Arc<InAppWalletService>,
    state: Mutex<ManagerState>,
    mode: watch::Sender<Option<ConnectionMode>>,
}

impl ServiceManager {
    /// Manager over an unstarted session and in-app service.
    #[must_use]
    pub fn new(session: Session, in_app: Arc<InAppWalletService>) -> Self {
        let (mode, _) = watch::channel(None);
        Self {
            session,
            in_app,
            state: Mutex::new(ManagerState::default()),
            mode,
        }
    }

    /// Detect the connection mode and start the matching service.
    pub async fn initialize(&self) -> ModeResult {
        let (attempt, generation) = {
            let mut state = self.state.lock();
            if state.initialized {
                if let Some(mode) = *self.mode.borrow() {
                    debug!(%mode, "Services already initialized");
                    return Ok(mode);
                }
            }

            match state.in_flight.clone() {
                Some(attempt) => {
                    debug!("Services initialization in progress");
                    (attempt, state.generation)
                }
                None => {
                    info!("Initializing services");
                    let attempt = detect(self.session.clone(), Arc::clone(&self.in_app))
                        .boxed()
                        .shared();
                    state.in_flight = Some(attempt.clone());
                    (attempt, state.generation)
                }
            }
        };

        let result = attempt.await;

        let mut state = self.state.lock();
        if state.generation != generation {
            return Err(RuntimeError::Cancelled);
        }
        state.in_flight = None;
        match &result {
            Ok(mode) => {
                state.initialized = true;
                self.mode.send_replace(Some(*mode));
                info!(%mode, "All services initialized");
            }
            Err(e) => error!(error = %e, "Error initializing services"),
        }
        result
    }

    /// Tear down what `initialize()` started. `false` when nothing ran.
    pub fn cleanup(&self) -> bool {
        let mut state = self.state.lock();
        if !state.initialized && state.in_flight.is_none() {
            return false;
        }

        info!("Cleaning up services");
        let mode = *self.mode.borrow();
        if mode != Some(ConnectionMode::InAppBrowser) {
            self.session.destroy();
        }

        state.initialized = false;
        state.in_flight = None;
        state.generation += 1;
        self.mode.send_replace(None);
        true
    }

    /// Forward a host lifecycle trigger to the session in P2P mode.
    pub async fn handle_lifecycle(&self, trigger: LifecycleTrigger) -> bool {
        if self.connection_mode() != Some(ConnectionMode::P2p) {
            return false;
        }
        self.session.handle_lifecycle(trigger).await
    }

    /// Wait until a mode has been decided.
    ///
    /// Returns immediately when it already has been.
    pub async fn wait_for_mode(&self) -> Option<ConnectionMode> {
        let mut rx = self.mode.subscribe();
        let decided = rx.wait_for(Option::is_some).await.ok().and_then(|mode| *mode);
        decided
    }

    /// Receiver of mode changes. `None` until decided and after cleanup.
    #[must_use]
    pub fn mode_watch(&self) -> watch::Receiver<Option<ConnectionMode>> {
        self.mode.subscribe()
    }

    /// Decided connection mode.
    #[must_use]
    pub fn connection_mode(&self) -> Option<ConnectionMode> {
        *self.mode.borrow()
    }

    /// Whether the dApp runs inside the wallet browser.
    #[must_use]
    pub fn is_wallet_browser(&self) -> bool {
        self.connection_mode() == Some(ConnectionMode::InAppBrowser)
    }

    /// Whether `initialize()` has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// The peer session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The in-app wallet service.
    #[must_use]
    pub fn in_app(&self) -> &Arc<InAppWalletService> {
        &self.in_app
    }
}

async fn detect(session: Session, in_app: Arc<InAppWalletService>) -> ModeResult {
    if in_app.initialize().await {
        info!("Running in wallet browser, peer session disabled");
        return Ok(ConnectionMode::InAppBrowser);
    }

    info!("Running in regular browser, initializing peer session");
    session.initialize().await?;
    Ok(ConnectionMode::P2p)
}

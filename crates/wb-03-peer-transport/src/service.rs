//! # Transport Adapter Service
//!
//! Wraps a [`PeerTransport`] behind an idempotent `initialize`, a signal
//! pump per endpoint generation and fail-closed sends.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use shared_bus::EventPublisher;
use shared_types::{ChannelId, ChannelInfo, SessionIdentity, TransportError};
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wb_01_identity::IdentityProvider;

use crate::domain::{TransportConfig, TransportEvent};
use crate::ports::{DataChannel, PeerEndpoint, PeerSignal, PeerSignalReceiver, PeerTransport};
use crate::TransportBus;

type InitResult = Result<SessionIdentity, TransportError>;
type InitAttempt = Shared<BoxFuture<'static, InitResult>>;

enum Resume {
    Join(InitAttempt),
    Start(InitAttempt, Arc<dyn PeerEndpoint>),
    Fresh,
}

#[derive(Default)]
struct AdapterState {
    generation: u64,
    endpoint: Option<Arc<dyn PeerEndpoint>>,
    channel: Option<Arc<dyn DataChannel>>,
    channel_open: bool,
    identity: Option<SessionIdentity>,
    in_flight: Option<InitAttempt>,
    open_waiter: Option<oneshot::Sender<InitResult>>,
    pump: Option<JoinHandle<()>>,
}

impl AdapterState {
    fn current_channel_id(&self) -> Option<ChannelId> {
        self.channel.as_ref().map(|channel| channel.info().id)
    }

    fn resolve_waiter(&mut self, result: InitResult) {
        if let Some(waiter) = self.open_waiter.take() {
            // The waiter is gone when the attempt already timed out.
            let _ = waiter.send(result);
        }
    }
}

struct Inner {
    transport: Arc<dyn PeerTransport>,
    identity: Arc<IdentityProvider>,
    config: TransportConfig,
    bus: Arc<TransportBus>,
    state: Mutex<AdapterState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(pump) = self.state.get_mut().pump.take() {
            pump.abort();
        }
    }
}

/// Adapter between a [`PeerTransport`] and the session.
///
/// Cloning yields another handle to the same adapter.
#[derive(Clone)]
pub struct TransportAdapter {
    inner: Arc<Inner>,
}

impl TransportAdapter {
    /// Create an adapter. Nothing is opened until [`initialize`](Self::initialize).
    pub fn new(
        transport: Arc<dyn PeerTransport>,
        identity: Arc<IdentityProvider>,
        config: TransportConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                identity,
                config,
                bus: Arc::new(TransportBus::new()),
                state: Mutex::new(AdapterState::default()),
            }),
        }
    }

    /// Open the endpoint, or join the attempt already in flight.
    ///
    /// Resolves immediately with the identity when the endpoint is already
    /// open. Otherwise any stale endpoint is destroyed and a new one is
    /// created under the persisted identity.
    pub async fn initialize(&self) -> InitResult {
        let attempt = {
            let mut state = self.inner.state.lock();

            if let Some(endpoint) = state.endpoint.as_ref().filter(|e| e.is_open()) {
                debug!(identity = %endpoint.id(), "Endpoint already open");
                return Ok(endpoint.id());
            }

            match state.in_flight.clone() {
                Some(attempt) => {
                    debug!(generation = state.generation, "Joining in-flight initialization");
                    attempt
                }
                None => {
                    let attempt = self.inner.start_attempt(&mut state)?;
                    state.in_flight = Some(attempt.clone());
                    attempt
                }
            }
        };

        attempt.await
    }

    /// Resume the signaling link.
    ///
    /// No-op while open. A surviving endpoint is asked to reconnect under the
    /// same identity and the call waits for it to reopen; callers arriving
    /// meanwhile join that attempt instead of reconnecting again. Without a
    /// usable endpoint a full [`initialize`](Self::initialize) runs.
    pub async fn reconnect(&self) -> InitResult {
        let plan = {
            let mut state = self.inner.state.lock();
            if let Some(endpoint) = state.endpoint.as_ref().filter(|e| e.is_open()) {
                return Ok(endpoint.id());
            }

            match (state.in_flight.clone(), state.endpoint.clone()) {
                (Some(attempt), _) => {
                    debug!(generation = state.generation, "Joining in-flight attempt");
                    Resume::Join(attempt)
                }
                (None, Some(endpoint)) if !endpoint.is_destroyed() => {
                    info!(identity = %endpoint.id(), "Resuming endpoint");
                    let generation = state.generation;
                    let attempt = self.inner.await_open(&mut state, generation);
                    state.in_flight = Some(attempt.clone());
                    Resume::Start(attempt, endpoint)
                }
                _ => Resume::Fresh,
            }
        };

        match plan {
            Resume::Join(attempt) => attempt.await,
            Resume::Start(attempt, endpoint) => {
                endpoint.reconnect();
                attempt.await
            }
            Resume::Fresh => {
                info!("No reusable endpoint, initializing a new one");
                self.initialize().await
            }
        }
    }

    /// Send one frame on the open channel.
    ///
    /// Returns `false` without touching the transport when no channel is
    /// open, and `false` when the transport rejects the frame.
    pub fn send(&self, frame: &str) -> bool {
        let channel = {
            let state = self.inner.state.lock();
            match (&state.channel, state.channel_open) {
                (Some(channel), true) => Arc::clone(channel),
                _ => {
                    debug!("Cannot send: no open channel");
                    return false;
                }
            }
        };

        if !channel.is_open() {
            debug!(channel = %channel.info().id, "Cannot send: channel no longer open");
            return false;
        }

        match channel.send(frame) {
            Ok(()) => {
                debug!(channel = %channel.info().id, len = frame.len(), "Frame sent");
                true
            }
            Err(e) => {
                error!(channel = %channel.info().id, error = %e, "Error sending frame");
                false
            }
        }
    }

    /// Serialise `value` as JSON and [`send`](Self::send) it.
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(frame) => self.send(&frame),
            Err(e) => {
                error!(error = %e, "Failed to serialise frame");
                false
            }
        }
    }

    /// Close the current channel but keep the endpoint.
    ///
    /// No [`TransportEvent::ChannelClosed`] is published for a channel closed
    /// this way. Returns `false` when there was no channel.
    pub fn close_channel(&self) -> bool {
        let channel = {
            let mut state = self.inner.state.lock();
            state.channel_open = false;
            state.channel.take()
        };

        match channel {
            Some(channel) => {
                info!(channel = %channel.info().id, "Closing wallet channel");
                channel.close();
                true
            }
            None => false,
        }
    }

    /// Tear everything down: channel, endpoint, pump, pending attempt and
    /// every handler on the bus. Safe to call repeatedly.
    pub fn destroy(&self) {
        let (generation, channel, endpoint, pump) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.channel_open = false;
            state.in_flight = None;
            state.open_waiter = None;
            (
                state.generation,
                state.channel.take(),
                state.endpoint.take(),
                state.pump.take(),
            )
        };

        if let Some(pump) = pump {
            pump.abort();
        }
        if let Some(channel) = channel {
            channel.close();
        }
        if let Some(endpoint) = endpoint {
            if !endpoint.is_destroyed() {
                endpoint.destroy();
            }
        }
        self.inner.bus.clear_handlers();

        info!(generation, "Transport destroyed");
    }

    /// Identity of the current or last endpoint.
    #[must_use]
    pub fn identity(&self) -> Option<SessionIdentity> {
        self.inner.state.lock().identity.clone()
    }

    /// Whether the endpoint is connected to the signaling server.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner
            .state
            .lock()
            .endpoint
            .as_ref()
            .is_some_and(|endpoint| endpoint.is_open())
    }

    /// Whether an initialization or resume attempt is in flight.
    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.inner.state.lock().in_flight.is_some()
    }

    /// Whether a wallet channel is open.
    #[must_use]
    pub fn has_open_channel(&self) -> bool {
        self.inner.state.lock().channel_open
    }

    /// Descriptor of the open channel.
    #[must_use]
    pub fn channel(&self) -> Option<ChannelInfo> {
        let state = self.inner.state.lock();
        if !state.channel_open {
            return None;
        }
        state.channel.as_ref().map(|channel| channel.info())
    }

    /// Endpoint generation; bumped by every new endpoint and by `destroy`.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Bus the adapter publishes [`TransportEvent`]s on.
    #[must_use]
    pub fn bus(&self) -> &Arc<TransportBus> {
        &self.inner.bus
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }
}

impl Inner {
    fn start_attempt(self: &Arc<Self>, state: &mut AdapterState) -> Result<InitAttempt, TransportError> {
        if let Some(pump) = state.pump.take() {
            pump.abort();
        }
        if let Some(channel) = state.channel.take() {
            channel.close();
        }
        state.channel_open = false;
        if let Some(stale) = state.endpoint.take() {
            if !stale.is_destroyed() {
                info!(identity = %stale.id(), "Destroying stale endpoint");
                stale.destroy();
            }
        }

        state.generation += 1;
        let generation = state.generation;

        let identity = self.identity.get_or_create();
        info!(%identity, generation, "Creating endpoint");
        let (endpoint, signals) = self.transport.create(&identity, &self.config)?;

        state.endpoint = Some(endpoint);
        state.identity = Some(identity);
        state.pump = Some(tokio::spawn(pump(Arc::downgrade(self), generation, signals)));

        Ok(self.await_open(state, generation))
    }

    /// Arm the open waiter and return the attempt that resolves with it.
    ///
    /// The attempt ends on `Open`, a fatal `Error`, `Close`, `destroy` or the
    /// open timeout, and clears `in_flight` if its generation is current.
    fn await_open(self: &Arc<Self>, state: &mut AdapterState, generation: u64) -> InitAttempt {
        let (waiter, opened) = oneshot::channel();
        state.open_waiter = Some(waiter);

        let timeout = self.config.open_timeout;
        let weak = Arc::downgrade(self);
        let attempt = async move {
            let result = match tokio::time::timeout(timeout, opened).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(TransportError::Destroyed),
                Err(_) => {
                    let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                    warn!(generation, timeout_ms = millis, "Endpoint did not open in time");
                    Err(TransportError::OpenTimeout(millis))
                }
            };

            if let Some(inner) = weak.upgrade() {
                let mut state = inner.state.lock();
                if state.generation == generation {
                    state.in_flight = None;
                    state.open_waiter = None;
                }
            }
            result
        };

        attempt.boxed().shared()
    }

    /// Apply one signal; `None` when it belongs to a superseded generation.
    fn apply(&self, generation: u64, signal: PeerSignal) -> Option<Vec<TransportEvent>> {
        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(generation, current = state.generation, ?signal, "Dropping signal from superseded endpoint");
            return None;
        }

        let mut events = Vec::new();
        match signal {
            PeerSignal::Open(id) => {
                info!(identity = %id, generation, "Endpoint open");
                state.identity = Some(id.clone());
                state.resolve_waiter(Ok(id.clone()));
                events.push(TransportEvent::Opened(id));
            }
            PeerSignal::Connection(channel) => {
                let info = channel.info();
                if state.channel_open {
                    warn!(channel = %info.id, remote = %info.remote, "Refusing wallet channel, one is already open");
                    channel.close();
                } else {
                    info!(channel = %info.id, remote = %info.remote, "Incoming wallet channel");
                    if let Some(pending) = state.channel.replace(channel) {
                        debug!(channel = %pending.info().id, "Dropping pending channel");
                        pending.close();
                    }
                }
            }
            PeerSignal::ChannelOpen(id) => {
                match state.channel.as_ref().map(|channel| channel.info()) {
                    Some(info) if info.id == id && !state.channel_open => {
                        info!(channel = %id, remote = %info.remote, "Wallet channel established");
                        state.channel_open = true;
                        events.push(TransportEvent::IncomingChannel(info));
                    }
                    _ => debug!(channel = %id, "Ignoring open of non-current channel"),
                }
            }
            PeerSignal::ChannelData(id, frame) => {
                if state.channel_open && state.current_channel_id() == Some(id) {
                    debug!(channel = %id, len = frame.len(), "Frame received");
                    events.push(TransportEvent::Data(frame));
                } else {
                    debug!(channel = %id, "Ignoring frame from non-current channel");
                }
            }
            PeerSignal::ChannelClose(id) => {
                if state.current_channel_id() == Some(id) {
                    let was_open = std::mem::take(&mut state.channel_open);
                    state.channel = None;
                    info!(channel = %id, "Wallet channel closed");
                    if was_open {
                        events.push(TransportEvent::ChannelClosed(id));
                    }
                }
            }
            PeerSignal::ChannelError(id, e) => {
                if state.current_channel_id() == Some(id) {
                    warn!(channel = %id, error = %e, "Wallet channel error");
                    events.push(TransportEvent::Error(e));
                }
            }
            PeerSignal::Error(e) => {
                error!(error = %e, generation, "Transport error");
                if e.is_fatal_to_init() {
                    state.resolve_waiter(Err(e.clone()));
                }
                events.push(TransportEvent::Error(e));
            }
            PeerSignal::Disconnected => {
                if state.channel_open {
                    info!("Signaling server lost while a channel is open, ignoring");
                } else {
                    warn!("Disconnected from signaling server");
                    events.push(TransportEvent::ServerDisconnected);
                }
            }
            PeerSignal::Close => {
                info!(generation, "Endpoint closed");
                state.resolve_waiter(Err(TransportError::Destroyed));
                events.push(TransportEvent::Closed);
            }
        }

        Some(events)
    }
}

async fn pump(inner: Weak<Inner>, generation: u64, mut signals: PeerSignalReceiver) {
    while let Some(signal) = signals.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let Some(events) = inner.apply(generation, signal) else {
            break;
        };
        for event in events {
            inner.bus.publish(event);
        }
    }
    debug!(generation, "Signal pump finished");
}

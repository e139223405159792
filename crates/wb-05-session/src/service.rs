//! # Session Service
//!
//! All session state lives behind one mutex. Transport events arrive on the
//! transport pump task, heartbeat callbacks on the heartbeat task; both
//! mutate state under the lock and publish the resulting session events only
//! after releasing it.

use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{EventFilter, EventPublisher, HandlerId, Subscription};
use shared_types::{ChannelInfo, SessionIdentity, SessionState, SystemTimeSource, TimeSource, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use wb_02_message_codec::{decode, encode, Envelope, HeartbeatAction, MessageCodec};
use wb_03_peer_transport::{TransportAdapter, TransportEvent};
use wb_04_heartbeat::HeartbeatMonitor;

use crate::adapters::SessionLink;
use crate::domain::{
    DisconnectReason, FrameDirection, LifecycleTrigger, PendingCalls, SessionConfig, SessionError,
    SessionEvent, SessionTopic,
};
use crate::SessionBus;

struct SessionCore {
    status: SessionState,
    wallet: Option<ChannelInfo>,
    heartbeat_epoch: Option<u64>,
    pending: PendingCalls,
    transport_handlers: Vec<HandlerId>,
}

impl SessionCore {
    /// Move to `to`, recording the change. Returns `false` when already there.
    fn transition(&mut self, to: SessionState, out: &mut Vec<SessionEvent>) -> bool {
        let from = self.status;
        if from == to {
            return false;
        }
        self.status = to;
        info!(%from, %to, "Session state changed");
        out.push(SessionEvent::StatusChanged { from, to });
        true
    }
}

pub(crate) struct SessionInner {
    transport: TransportAdapter,
    codec: MessageCodec,
    heartbeat: HeartbeatMonitor,
    bus: Arc<SessionBus>,
    core: Mutex<SessionCore>,
}

/// Handle to a wallet session.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Session over `transport`, stamping envelopes with the system clock.
    pub fn new(transport: TransportAdapter, config: SessionConfig) -> Self {
        Self::with_clock(transport, config, Arc::new(SystemTimeSource::new()))
    }

    /// Session whose correlation IDs and heartbeat stamps come from `clock`.
    pub fn with_clock(
        transport: TransportAdapter,
        config: SessionConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport,
                codec: MessageCodec::with_clock(Arc::clone(&clock)),
                heartbeat: HeartbeatMonitor::with_clock(config.heartbeat, clock),
                bus: Arc::new(SessionBus::new()),
                core: Mutex::new(SessionCore {
                    status: SessionState::Uninitialized,
                    wallet: None,
                    heartbeat_epoch: None,
                    pending: PendingCalls::new(config.max_pending_calls),
                    transport_handlers: Vec::new(),
                }),
            }),
        }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Open the transport and wait for a wallet.
    ///
    /// Idempotent: concurrent callers share one transport attempt, and a
    /// session that is already `Ready` or `Connected` returns its identity.
    pub async fn initialize(&self) -> Result<SessionIdentity, SessionError> {
        let mut out = Vec::new();
        {
            let mut core = self.inner.core.lock();
            if matches!(core.status, SessionState::Ready | SessionState::Connected) {
                if let Some(identity) = self.inner.transport.identity() {
                    return Ok(identity);
                }
            }
            if core.transport_handlers.is_empty() {
                self.inner.attach(&mut core);
            }
            if core.status.needs_initialize() {
                core.transition(SessionState::Initializing, &mut out);
            }
        }
        self.inner.publish_all(out);

        let result = self.inner.transport.initialize().await;
        self.inner.finish_attempt(result)
    }

    /// Alias of [`initialize`](Self::initialize).
    pub async fn connect(&self) -> Result<SessionIdentity, SessionError> {
        self.initialize().await
    }

    /// Resume the transport after a disconnect or error.
    ///
    /// Only acts in `Disconnected` or `Errored`; the wallet must open a new
    /// channel afterwards.
    pub async fn reconnect(&self) -> Result<SessionIdentity, SessionError> {
        let status = self.status();
        match status {
            SessionState::Uninitialized => return Err(SessionError::NotInitialized),
            SessionState::Closed => return Err(SessionError::Closed),
            SessionState::Initializing => return self.initialize().await,
            SessionState::Ready | SessionState::Connected => {
                debug!(%status, "Reconnect not needed");
                return self.identity().ok_or(SessionError::NotInitialized);
            }
            SessionState::Disconnected | SessionState::Errored => {}
        }

        info!(%status, "Reconnecting transport");
        let result = self.inner.transport.reconnect().await;
        self.inner.finish_attempt(result)
    }

    /// React to the host becoming active again.
    ///
    /// Reconnects only when `Disconnected` and no transport attempt is
    /// already running; returns whether it tried.
    pub async fn handle_lifecycle(&self, trigger: LifecycleTrigger) -> bool {
        let status = self.status();
        if status != SessionState::Disconnected {
            debug!(?trigger, %status, "Lifecycle trigger ignored");
            return false;
        }
        if self.inner.transport.is_initializing() {
            debug!(?trigger, "Reconnect already in progress");
            return false;
        }

        info!(?trigger, "Reconnecting after lifecycle trigger");
        if let Err(e) = self.reconnect().await {
            warn!(?trigger, error = %e, "Lifecycle reconnect failed");
        }
        true
    }

    /// Drop the wallet channel. Returns `false` when not connected.
    pub fn disconnect(&self) -> bool {
        let mut out = Vec::new();
        {
            let mut core = self.inner.core.lock();
            if core.status != SessionState::Connected {
                debug!(status = %core.status, "Not connected to a wallet");
                return false;
            }
            self.inner.release_wallet(&mut core);
            core.transition(SessionState::Disconnected, &mut out);
            out.push(SessionEvent::Disconnected {
                reason: DisconnectReason::LocalRequest,
            });
            out.push(SessionEvent::Notice("Disconnected from wallet".into()));
        }

        self.inner.transport.close_channel();
        self.inner.publish_all(out);
        true
    }

    /// Tear the session down. Terminal until the next `initialize()`.
    ///
    /// Observers registered on the session bus stay registered.
    pub fn destroy(&self) {
        let mut out = Vec::new();
        {
            let mut core = self.inner.core.lock();
            let was_connected = core.status == SessionState::Connected;
            self.inner.release_wallet(&mut core);
            core.transport_handlers.clear();
            if core.transition(SessionState::Closed, &mut out) {
                if was_connected {
                    out.push(SessionEvent::Disconnected {
                        reason: DisconnectReason::LocalRequest,
                    });
                }
                out.push(SessionEvent::Notice("Session closed".into()));
            }
        }

        self.inner.transport.destroy();
        self.inner.publish_all(out);
    }

    // =========================================================================
    // MESSAGING
    // =========================================================================

    /// Send a plain text message. `false` when not connected or not sent.
    pub fn send_text(&self, text: &str) -> bool {
        if !self.is_connected() {
            debug!("Cannot send: not connected to wallet");
            return false;
        }
        self.inner.send_envelope(&Envelope::text(text))
    }

    /// Call a wallet method. `false` when not connected or not sent.
    pub fn call(&self, method: &str, payload: Value) -> bool {
        self.call_with_id(method, payload).is_some()
    }

    /// Call a wallet method, returning the request's correlation ID.
    pub fn call_with_id(&self, method: &str, payload: Value) -> Option<u64> {
        if !self.is_connected() {
            debug!(method, "Cannot call: not connected to wallet");
            return None;
        }
        self.inner.dispatch_request(self.inner.codec.request(method, payload))
    }

    /// Ask the wallet to sign a transaction; `None` sends a demo payment.
    pub fn sign_transaction(&self, payload: Option<Value>) -> bool {
        if !self.is_connected() {
            debug!("Cannot sign transaction: not connected to wallet");
            return false;
        }
        let request = self.inner.codec.sign_transaction(payload);
        self.inner.dispatch_request(request).is_some()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Current state.
    #[must_use]
    pub fn status(&self) -> SessionState {
        self.inner.core.lock().status
    }

    /// Session identity, once the transport has been initialised.
    #[must_use]
    pub fn identity(&self) -> Option<SessionIdentity> {
        self.inner.transport.identity()
    }

    /// The connected wallet.
    #[must_use]
    pub fn wallet(&self) -> Option<ChannelInfo> {
        self.inner.core.lock().wallet.clone()
    }

    /// `Ready`, `Connected` or `Disconnected`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status().is_ready()
    }

    /// Whether a wallet is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status() == SessionState::Connected
    }

    /// Round-trip time of the last answered heartbeat.
    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        self.inner.heartbeat.last_latency()
    }

    /// Whether the heartbeat is running.
    #[must_use]
    pub fn heartbeat_running(&self) -> bool {
        self.inner.heartbeat.is_running()
    }

    /// Requests still waiting for a response.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.inner.core.lock().pending.len()
    }

    /// The underlying transport adapter.
    #[must_use]
    pub fn transport(&self) -> &TransportAdapter {
        &self.inner.transport
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    /// Register a handler for events matching `filter`.
    pub fn subscribe<F>(&self, filter: EventFilter<SessionTopic>, handler: F) -> HandlerId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.inner.bus.on(filter, handler)
    }

    /// Remove a handler registered with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.inner.bus.off(id)
    }

    /// Receive events matching `filter` asynchronously.
    #[must_use]
    pub fn events(&self, filter: EventFilter<SessionTopic>) -> Subscription<SessionEvent> {
        self.inner.bus.subscribe(filter)
    }

    /// The session event bus.
    #[must_use]
    pub fn bus(&self) -> &Arc<SessionBus> {
        &self.inner.bus
    }
}

impl SessionInner {
    fn attach(self: &Arc<Self>, core: &mut SessionCore) {
        let weak = Arc::downgrade(self);
        let id = self.transport.bus().on(EventFilter::all(), move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_transport_event(event);
            }
        });
        core.transport_handlers.push(id);
        debug!("Attached to transport events");
    }

    fn publish_all(&self, events: Vec<SessionEvent>) {
        for event in events {
            self.bus.publish(event);
        }
    }

    /// Settle the state after a transport `initialize`/`reconnect` returned.
    fn finish_attempt(
        &self,
        result: Result<SessionIdentity, TransportError>,
    ) -> Result<SessionIdentity, SessionError> {
        let mut out = Vec::new();
        let outcome = {
            let mut core = self.core.lock();
            match result {
                _ if core.status == SessionState::Closed => Err(SessionError::Closed),
                Ok(identity) => {
                    if matches!(core.status, SessionState::Initializing | SessionState::Errored)
                        && self.transport.is_open()
                        && !self.transport.has_open_channel()
                    {
                        core.transition(SessionState::Ready, &mut out);
                    }
                    Ok(identity)
                }
                Err(e) => {
                    let recoverable = matches!(
                        core.status,
                        SessionState::Initializing | SessionState::Disconnected | SessionState::Errored
                    );
                    if recoverable && core.transition(SessionState::Errored, &mut out) {
                        warn!(error = %e, "Transport attempt failed");
                        out.push(SessionEvent::Error(e.to_string()));
                        out.push(SessionEvent::Notice(format!("Connection failed: {e}")));
                    }
                    Err(SessionError::Transport(e))
                }
            }
        };
        self.publish_all(out);
        outcome
    }

    fn on_transport_event(self: &Arc<Self>, event: &TransportEvent) {
        if let TransportEvent::Data(frame) = event {
            self.handle_frame(frame);
            return;
        }

        let mut out = Vec::new();
        let mut refuse_channel = false;
        {
            let mut core = self.core.lock();
            match event {
                TransportEvent::Opened(identity) => {
                    if matches!(
                        core.status,
                        SessionState::Initializing | SessionState::Disconnected | SessionState::Errored
                    ) && !self.transport.has_open_channel()
                    {
                        info!(%identity, "Waiting for wallet connection");
                        core.transition(SessionState::Ready, &mut out);
                    }
                }
                TransportEvent::IncomingChannel(wallet) => {
                    if core.status.accepts_channel() {
                        refuse_channel = !self.enter_connected(&mut core, wallet, &mut out);
                    } else {
                        warn!(status = %core.status, channel = %wallet.id, "Refusing wallet channel");
                        refuse_channel = true;
                    }
                }
                TransportEvent::ChannelClosed(id) => {
                    if core.status == SessionState::Connected {
                        info!(channel = %id, "Wallet channel closed");
                        self.release_wallet(&mut core);
                        core.transition(SessionState::Disconnected, &mut out);
                        out.push(SessionEvent::Disconnected {
                            reason: DisconnectReason::ChannelClosed,
                        });
                        out.push(SessionEvent::Notice("Wallet disconnected".into()));
                    }
                }
                TransportEvent::ServerDisconnected => {
                    if matches!(core.status, SessionState::Ready | SessionState::Connected)
                        && !self.transport.has_open_channel()
                    {
                        self.release_wallet(&mut core);
                        core.transition(SessionState::Disconnected, &mut out);
                        out.push(SessionEvent::Disconnected {
                            reason: DisconnectReason::ServerLost,
                        });
                        out.push(SessionEvent::Notice(
                            "Lost connection to the signaling server".into(),
                        ));
                    }
                }
                TransportEvent::Closed => {
                    let was_connected = core.status == SessionState::Connected;
                    self.release_wallet(&mut core);
                    if core.transition(SessionState::Closed, &mut out) {
                        if was_connected {
                            out.push(SessionEvent::Disconnected {
                                reason: DisconnectReason::ChannelClosed,
                            });
                        }
                        out.push(SessionEvent::Notice("Peer connection closed".into()));
                    }
                }
                TransportEvent::Error(e) => {
                    out.push(SessionEvent::Error(e.to_string()));
                    let fatal = match core.status {
                        SessionState::Initializing => e.is_fatal_to_init(),
                        SessionState::Uninitialized | SessionState::Closed => false,
                        _ => !self.transport.has_open_channel(),
                    };
                    if fatal {
                        self.release_wallet(&mut core);
                        if core.transition(SessionState::Errored, &mut out) {
                            out.push(SessionEvent::Notice(format!("Connection error: {e}")));
                        }
                    } else {
                        debug!(error = %e, status = %core.status, "Transport error does not change state");
                    }
                }
                TransportEvent::Data(_) => {}
            }
        }

        if refuse_channel {
            self.transport.close_channel();
        }
        self.publish_all(out);
    }

    /// Enter `Connected` and start the heartbeat. `false` when the session
    /// has no identity to announce.
    fn enter_connected(
        self: &Arc<Self>,
        core: &mut SessionCore,
        wallet: &ChannelInfo,
        out: &mut Vec<SessionEvent>,
    ) -> bool {
        let Some(identity) = self.transport.identity() else {
            warn!(channel = %wallet.id, "Wallet channel before the endpoint has an identity");
            return false;
        };

        core.wallet = Some(wallet.clone());
        core.transition(SessionState::Connected, out);
        let epoch = self
            .heartbeat
            .start(Arc::new(SessionLink(Arc::downgrade(self))));
        core.heartbeat_epoch = Some(epoch);

        info!(%identity, remote = %wallet.remote, epoch, "Wallet connected");
        out.push(SessionEvent::Connected {
            identity,
            wallet: wallet.clone(),
        });
        out.push(SessionEvent::Notice(format!("Wallet connected: {}", wallet.remote)));
        true
    }

    /// Stop the heartbeat and forget the wallet and its pending calls.
    fn release_wallet(&self, core: &mut SessionCore) -> Option<ChannelInfo> {
        if core.heartbeat_epoch.take().is_some() {
            self.heartbeat.stop();
        }
        let dropped = core.pending.clear();
        if dropped > 0 {
            debug!(dropped, "Dropped pending calls");
        }
        core.wallet.take()
    }

    pub(crate) fn on_liveness_lost(&self, epoch: u64) {
        let mut out = Vec::new();
        {
            let mut core = self.core.lock();
            if core.heartbeat_epoch != Some(epoch) || core.status != SessionState::Connected {
                debug!(epoch, "Ignoring liveness loss from a stopped heartbeat");
                return;
            }
            warn!(epoch, "Wallet heartbeat timeout, forcing disconnect");
            self.release_wallet(&mut core);
            core.transition(SessionState::Disconnected, &mut out);
            out.push(SessionEvent::Disconnected {
                reason: DisconnectReason::LivenessTimeout,
            });
            out.push(SessionEvent::Notice("Wallet stopped responding".into()));
        }

        self.transport.close_channel();
        self.publish_all(out);
    }

    pub(crate) fn on_heartbeat_confirmed(&self, epoch: u64, latency: Duration) {
        if self.core.lock().heartbeat_epoch != Some(epoch) {
            return;
        }
        self.bus.publish(SessionEvent::Latency(latency));
    }

    pub(crate) fn send_envelope(&self, envelope: &Envelope) -> bool {
        let sent = self.transport.send(&encode(envelope));
        if sent {
            self.bus.publish(SessionEvent::Frame {
                direction: FrameDirection::Outbound,
                kind: envelope.kind_label(),
            });
        }
        sent
    }

    fn dispatch_request(&self, request: Envelope) -> Option<u64> {
        let (correlation_id, method) = match &request {
            Envelope::Request(r) => (r.correlation_id, r.method.clone()),
            _ => return None,
        };

        if let Some(evicted) = self.core.lock().pending.insert(correlation_id, method.as_str()) {
            warn!(
                correlation_id = evicted.correlation_id,
                method = %evicted.method,
                "Pending call table full, dropped oldest call"
            );
        }

        if self.send_envelope(&request) {
            info!(%method, correlation_id, "Request sent to wallet");
            Some(correlation_id)
        } else {
            self.core.lock().pending.remove(correlation_id);
            warn!(%method, "Failed to send request to wallet");
            None
        }
    }

    fn handle_frame(&self, frame: &str) {
        let envelope = decode(frame);
        self.bus.publish(SessionEvent::Frame {
            direction: FrameDirection::Inbound,
            kind: envelope.kind_label(),
        });

        match envelope {
            Envelope::Heartbeat(heartbeat) => match heartbeat.action {
                HeartbeatAction::Ping => {
                    if let Some(pong) = self.heartbeat.answer(&heartbeat) {
                        debug!(sent_at = heartbeat.sent_at, "Answering wallet ping");
                        self.send_envelope(&pong);
                    }
                }
                HeartbeatAction::Pong => self.heartbeat.on_pong(&heartbeat),
            },
            Envelope::Response(ref response) => {
                let matched = self.core.lock().pending.match_response(response);
                match matched {
                    Some(call) => debug!(
                        correlation_id = call.correlation_id,
                        method = %call.method,
                        "Response matched pending call"
                    ),
                    None => debug!(method = %response.method, "Response without pending call"),
                }
                self.bus.publish(SessionEvent::Message(envelope));
            }
            other => {
                self.bus.publish(SessionEvent::Message(other));
            }
        }
    }
}

//! In-process transport hub.
//!
//! Every endpoint created through [`MemoryTransport`] is recorded, so tests
//! can drive the signaling side (open, disconnect, fail, close) and play the
//! wallet through [`WalletHandle`].

use parking_lot::Mutex;
use shared_types::{ChannelId, ChannelInfo, SessionIdentity, TransportError};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::domain::TransportConfig;
use crate::ports::{DataChannel, PeerEndpoint, PeerSignal, PeerSignalReceiver, PeerTransport};

#[derive(Debug)]
struct MemoryEndpoint {
    id: SessionIdentity,
    signals: mpsc::UnboundedSender<PeerSignal>,
    open: AtomicBool,
    destroyed: AtomicBool,
    auto_open: bool,
    reconnects: Arc<AtomicUsize>,
    channels: Mutex<Vec<Arc<MemoryChannel>>>,
}

impl MemoryEndpoint {
    fn emit(&self, signal: PeerSignal) -> bool {
        self.signals.send(signal).is_ok()
    }
}

impl PeerEndpoint for MemoryEndpoint {
    fn id(&self) -> SessionIdentity {
        self.id.clone()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.is_destroyed()
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        if self.is_destroyed() || !self.auto_open {
            return;
        }
        self.open.store(true, Ordering::SeqCst);
        self.emit(PeerSignal::Open(self.id.clone()));
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        let channels = std::mem::take(&mut *self.channels.lock());
        for channel in channels {
            channel.close();
        }
    }
}

#[derive(Debug)]
struct MemoryChannel {
    info: ChannelInfo,
    open: AtomicBool,
    closed: AtomicBool,
    outbox: mpsc::UnboundedSender<String>,
    signals: mpsc::UnboundedSender<PeerSignal>,
    send_calls: Arc<AtomicUsize>,
}

impl DataChannel for MemoryChannel {
    fn info(&self) -> ChannelInfo {
        self.info.clone()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
    }

    fn send(&self, frame: &str) -> Result<(), TransportError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_open() {
            return Err(TransportError::SendFailed(format!("{} is closed", self.info.id)));
        }
        self.outbox
            .send(frame.to_string())
            .map_err(|_| TransportError::SendFailed(format!("{} has no reader", self.info.id)))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.open.store(false, Ordering::SeqCst);
            let _ = self.signals.send(PeerSignal::ChannelClose(self.info.id));
        }
    }
}

#[derive(Default)]
struct HubState {
    endpoints: Vec<Arc<MemoryEndpoint>>,
    fail_next: Option<TransportError>,
}

struct Hub {
    state: Mutex<HubState>,
    auto_open: AtomicBool,
    next_channel: AtomicU64,
    send_calls: Arc<AtomicUsize>,
    reconnects: Arc<AtomicUsize>,
}

/// In-process [`PeerTransport`].
#[derive(Clone)]
pub struct MemoryTransport {
    hub: Arc<Hub>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Hub whose endpoints open as soon as they are created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hub: Arc::new(Hub {
                state: Mutex::new(HubState::default()),
                auto_open: AtomicBool::new(true),
                next_channel: AtomicU64::new(1),
                send_calls: Arc::new(AtomicUsize::new(0)),
                reconnects: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Hub whose endpoints stay pending until [`open_endpoint`](Self::open_endpoint),
    /// both after creation and after a reconnect.
    #[must_use]
    pub fn manual_open() -> Self {
        let transport = Self::new();
        transport.hub.auto_open.store(false, Ordering::SeqCst);
        transport
    }

    /// Number of endpoints created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.hub.state.lock().endpoints.len()
    }

    /// Number of `DataChannel::send` calls made on any channel.
    #[must_use]
    pub fn send_calls(&self) -> usize {
        self.hub.send_calls.load(Ordering::SeqCst)
    }

    /// Number of `PeerEndpoint::reconnect` calls on any endpoint.
    #[must_use]
    pub fn reconnect_calls(&self) -> usize {
        self.hub.reconnects.load(Ordering::SeqCst)
    }

    /// Make the next `create` fail with `error`.
    pub fn fail_next_create(&self, error: TransportError) {
        self.hub.state.lock().fail_next = Some(error);
    }

    /// Whether the most recent endpoint is open.
    #[must_use]
    pub fn is_endpoint_open(&self) -> bool {
        self.latest().is_some_and(|endpoint| endpoint.is_open())
    }

    /// Whether the most recent endpoint has been destroyed.
    #[must_use]
    pub fn is_endpoint_destroyed(&self) -> bool {
        self.latest().is_some_and(|endpoint| endpoint.is_destroyed())
    }

    /// Accept the most recent endpoint at the signaling server.
    pub fn open_endpoint(&self) -> bool {
        self.open_endpoint_at(self.created().saturating_sub(1))
    }

    /// Accept the endpoint with the given creation index.
    pub fn open_endpoint_at(&self, index: usize) -> bool {
        let Some(endpoint) = self.endpoint_at(index) else {
            return false;
        };
        endpoint.open.store(true, Ordering::SeqCst);
        endpoint.emit(PeerSignal::Open(endpoint.id.clone()))
    }

    /// Drop the signaling link of the most recent endpoint.
    pub fn server_disconnect(&self) -> bool {
        self.latest().is_some_and(|endpoint| {
            endpoint.open.store(false, Ordering::SeqCst);
            endpoint.emit(PeerSignal::Disconnected)
        })
    }

    /// Report an endpoint-level error on the most recent endpoint.
    pub fn server_error(&self, error: TransportError) -> bool {
        self.latest()
            .is_some_and(|endpoint| endpoint.emit(PeerSignal::Error(error)))
    }

    /// Close the most recent endpoint for good.
    pub fn close_endpoint(&self) -> bool {
        self.latest().is_some_and(|endpoint| {
            endpoint.destroyed.store(true, Ordering::SeqCst);
            endpoint.open.store(false, Ordering::SeqCst);
            endpoint.emit(PeerSignal::Close)
        })
    }

    /// Deliver a raw signal through the endpoint with the given index.
    pub fn signal_at(&self, index: usize, signal: PeerSignal) -> bool {
        self.endpoint_at(index)
            .is_some_and(|endpoint| endpoint.emit(signal))
    }

    /// Start a wallet channel to the most recent endpoint without opening it.
    #[must_use]
    pub fn offer_channel(&self, remote: &str) -> Option<WalletHandle> {
        let endpoint = self.latest().filter(|endpoint| !endpoint.is_destroyed())?;
        let id = ChannelId(self.hub.next_channel.fetch_add(1, Ordering::SeqCst));
        let (outbox, inbox) = mpsc::unbounded_channel();
        let channel = Arc::new(MemoryChannel {
            info: ChannelInfo::new(id, remote),
            open: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            outbox,
            signals: endpoint.signals.clone(),
            send_calls: Arc::clone(&self.hub.send_calls),
        });

        endpoint.channels.lock().push(Arc::clone(&channel));
        endpoint.emit(PeerSignal::Connection(channel.clone()));
        Some(WalletHandle { channel, inbox })
    }

    /// Connect a wallet: offer a channel and open it.
    #[must_use]
    pub fn connect_wallet(&self, remote: &str) -> Option<WalletHandle> {
        let wallet = self.offer_channel(remote)?;
        wallet.open();
        Some(wallet)
    }

    fn latest(&self) -> Option<Arc<MemoryEndpoint>> {
        self.hub.state.lock().endpoints.last().cloned()
    }

    fn endpoint_at(&self, index: usize) -> Option<Arc<MemoryEndpoint>> {
        self.hub.state.lock().endpoints.get(index).cloned()
    }
}

impl PeerTransport for MemoryTransport {
    fn create(
        &self,
        identity: &SessionIdentity,
        _config: &TransportConfig,
    ) -> Result<(Arc<dyn PeerEndpoint>, PeerSignalReceiver), TransportError> {
        let mut state = self.hub.state.lock();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }

        let (signals, receiver) = mpsc::unbounded_channel();
        let endpoint = Arc::new(MemoryEndpoint {
            id: identity.clone(),
            signals,
            open: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            auto_open: self.hub.auto_open.load(Ordering::SeqCst),
            reconnects: Arc::clone(&self.hub.reconnects),
            channels: Mutex::new(Vec::new()),
        });

        if endpoint.auto_open {
            endpoint.open.store(true, Ordering::SeqCst);
            endpoint.emit(PeerSignal::Open(identity.clone()));
        }

        state.endpoints.push(Arc::clone(&endpoint));
        Ok((endpoint, receiver))
    }
}

/// The wallet's end of a channel.
pub struct WalletHandle {
    channel: Arc<MemoryChannel>,
    inbox: mpsc::UnboundedReceiver<String>,
}

impl WalletHandle {
    /// Channel descriptor.
    #[must_use]
    pub fn info(&self) -> ChannelInfo {
        self.channel.info.clone()
    }

    /// Channel identifier.
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.channel.info.id
    }

    /// Finish opening the channel.
    pub fn open(&self) {
        if self.channel.closed.load(Ordering::SeqCst) {
            return;
        }
        self.channel.open.store(true, Ordering::SeqCst);
        let _ = self
            .channel
            .signals
            .send(PeerSignal::ChannelOpen(self.channel.info.id));
    }

    /// Whether the channel is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Send a frame to the dApp.
    pub fn send(&self, frame: &str) -> bool {
        if !self.channel.is_open() {
            return false;
        }
        self.channel
            .signals
            .send(PeerSignal::ChannelData(self.channel.info.id, frame.to_string()))
            .is_ok()
    }

    /// Report a channel error to the dApp.
    pub fn fail(&self, error: TransportError) -> bool {
        self.channel
            .signals
            .send(PeerSignal::ChannelError(self.channel.info.id, error))
            .is_ok()
    }

    /// Close the channel from the wallet side.
    pub fn close(&self) {
        self.channel.close();
    }

    /// Wait for the next frame sent by the dApp.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbox.recv().await
    }

    /// Next frame sent by the dApp, if one is queued.
    pub fn try_recv(&mut self) -> Option<String> {
        self.inbox.try_recv().ok()
    }

    /// All queued frames sent by the dApp.
    pub fn drain(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.inbox.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

//! # Heartbeat Monitor Service
//!
//! One tokio task per run. Each run is tagged with an epoch so the session
//! can tell a late callback from a stopped run apart from the current one.

use parking_lot::Mutex;
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use wb_02_message_codec::{Envelope, Heartbeat, HeartbeatAction};

use crate::domain::{answer_ping, HeartbeatConfig, HeartbeatCycle};
use crate::ports::HeartbeatLink;

#[derive(Default)]
struct MonitorState {
    epoch: u64,
    task: Option<JoinHandle<()>>,
    pongs: Option<mpsc::UnboundedSender<u64>>,
    last_latency: Option<Duration>,
}

/// Liveness monitor for one session.
pub struct HeartbeatMonitor {
    config: HeartbeatConfig,
    clock: Arc<dyn TimeSource>,
    state: Arc<Mutex<MonitorState>>,
}

impl HeartbeatMonitor {
    /// Monitor stamping pings with the system clock.
    #[must_use]
    pub fn new(config: HeartbeatConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemTimeSource::new()))
    }

    /// Monitor stamping pings with `clock`.
    #[must_use]
    pub fn with_clock(config: HeartbeatConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            config,
            clock,
            state: Arc::new(Mutex::new(MonitorState::default())),
        }
    }

    /// Start a new run against `link`, stopping any current one.
    ///
    /// Must be called within a tokio runtime. Returns the run's epoch.
    pub fn start(&self, link: Arc<dyn HeartbeatLink>) -> u64 {
        let mut state = self.state.lock();
        if let Some(task) = state.task.take() {
            task.abort();
        }

        state.epoch += 1;
        let epoch = state.epoch;
        let (pongs, pong_rx) = mpsc::unbounded_channel();
        state.pongs = Some(pongs);
        state.task = Some(tokio::spawn(run(
            link,
            epoch,
            self.config,
            Arc::clone(&self.clock),
            pong_rx,
            Arc::clone(&self.state),
        )));

        info!(
            epoch,
            interval_ms = self.config.interval.as_millis(),
            timeout_ms = self.config.timeout.as_millis(),
            "Heartbeat started"
        );
        epoch
    }

    /// Stop the current run. Returns `false` when none was active.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        state.pongs = None;
        match state.task.take() {
            Some(task) => {
                let was_running = !task.is_finished();
                task.abort();
                if was_running {
                    info!(epoch = state.epoch, "Heartbeat stopped");
                }
                was_running
            }
            None => false,
        }
    }

    /// Feed a received pong to the current run. Other heartbeats are ignored.
    pub fn on_pong(&self, heartbeat: &Heartbeat) {
        if heartbeat.action != HeartbeatAction::Pong {
            return;
        }
        let state = self.state.lock();
        match &state.pongs {
            Some(pongs) => {
                let _ = pongs.send(heartbeat.sent_at);
            }
            None => debug!(sent_at = heartbeat.sent_at, "Pong while heartbeat is stopped"),
        }
    }

    /// Pong answering a remote ping, stamped with the local receive time.
    #[must_use]
    pub fn answer(&self, ping: &Heartbeat) -> Option<Envelope> {
        answer_ping(ping, self.clock.now_millis())
    }

    /// Whether a run is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state
            .lock()
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Epoch of the current or last run.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Round-trip time of the last answered ping.
    #[must_use]
    pub fn last_latency(&self) -> Option<Duration> {
        self.state.lock().last_latency
    }

    /// Timing in use.
    #[must_use]
    pub fn config(&self) -> HeartbeatConfig {
        self.config
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.state.lock().task.take() {
            task.abort();
        }
    }
}

async fn run(
    link: Arc<dyn HeartbeatLink>,
    epoch: u64,
    config: HeartbeatConfig,
    clock: Arc<dyn TimeSource>,
    mut pongs: mpsc::UnboundedReceiver<u64>,
    state: Arc<Mutex<MonitorState>>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle = HeartbeatCycle::new();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !cycle.can_ping() {
                    debug!(epoch, "Ping still outstanding, skipping tick");
                    continue;
                }
                let sent_at = clock.now_millis();
                if !link.send_ping(sent_at) {
                    warn!(epoch, "Failed to send heartbeat ping");
                    link.liveness_lost(epoch);
                    break;
                }
                cycle.record_ping(sent_at);
                deadline = Some(Instant::now() + config.timeout);
                debug!(epoch, sent_at, "Sent heartbeat ping");
            }
            Some(echoed) = pongs.recv() => {
                match cycle.on_pong(echoed, clock.now_millis()) {
                    Some(latency_ms) => {
                        deadline = None;
                        let latency = Duration::from_millis(latency_ms);
                        state.lock().last_latency = Some(latency);
                        debug!(epoch, latency_ms, "Wallet connection confirmed");
                        link.confirmed(epoch, latency);
                    }
                    None => debug!(epoch, echoed, "Ignoring unmatched pong"),
                }
            }
            () = expiry(deadline) => {
                warn!(epoch, timeout_ms = config.timeout.as_millis(), "Heartbeat timeout, connection may be dead");
                link.liveness_lost(epoch);
                break;
            }
        }
    }
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

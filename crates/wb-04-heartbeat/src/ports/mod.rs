//! # Ports Layer

use std::time::Duration;

/// What the monitor needs from the session it watches.
pub trait HeartbeatLink: Send + Sync {
    /// Send a ping stamped `sent_at`. `false` when it could not be sent.
    fn send_ping(&self, sent_at: u64) -> bool;

    /// The run tagged `epoch` lost liveness. Called at most once per run.
    fn liveness_lost(&self, epoch: u64);

    /// A pong answered the outstanding ping of run `epoch`.
    fn confirmed(&self, _epoch: u64, _latency: Duration) {}
}

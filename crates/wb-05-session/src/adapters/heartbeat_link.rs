//! Connects the heartbeat monitor back to its session.

use std::sync::Weak;
use std::time::Duration;
use wb_02_message_codec::Envelope;
use wb_04_heartbeat::HeartbeatLink;

use crate::service::SessionInner;

/// [`HeartbeatLink`] holding only a weak reference, so a running heartbeat
/// never keeps a dropped session alive.
pub(crate) struct SessionLink(pub(crate) Weak<SessionInner>);

impl HeartbeatLink for SessionLink {
    fn send_ping(&self, sent_at: u64) -> bool {
        self.0
            .upgrade()
            .is_some_and(|inner| inner.send_envelope(&Envelope::ping(sent_at)))
    }

    fn liveness_lost(&self, epoch: u64) {
        if let Some(inner) = self.0.upgrade() {
            inner.on_liveness_lost(epoch);
        }
    }

    fn confirmed(&self, epoch: u64, latency: Duration) {
        if let Some(inner) = self.0.upgrade() {
            inner.on_heartbeat_confirmed(epoch, latency);
        }
    }
}

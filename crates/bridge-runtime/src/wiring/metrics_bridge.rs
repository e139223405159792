//! Feeds Prometheus collectors from session events.

use bridge_telemetry::{
    log_session_event, DECODE_FALLBACKS, FRAMES_RECEIVED, FRAMES_SENT, HEARTBEAT_LATENCY,
    HEARTBEAT_TIMEOUTS, SESSION_CONNECTED, SESSION_ERRORS, SESSION_TRANSITIONS,
};
use shared_bus::{EventFilter, HandlerId};
use wb_03_peer_transport::TransportAdapter;
use wb_05_session::{DisconnectReason, FrameDirection, Session, SessionEvent};

/// Observer that records session events as metrics while attached.
pub struct MetricsBridge {
    session: Session,
    handler: HandlerId,
}

impl MetricsBridge {
    /// Start recording events of `session`.
    #[must_use]
    pub fn attach(session: &Session) -> Self {
        let transport = session.transport().clone();
        let handler = session.subscribe(EventFilter::all(), move |event| {
            record(&transport, event);
        });
        Self {
            session: session.clone(),
            handler,
        }
    }

    /// Stop recording.
    pub fn detach(self) -> bool {
        self.session.unsubscribe(self.handler)
    }
}

fn record(transport: &TransportAdapter, event: &SessionEvent) {
    match event {
        SessionEvent::StatusChanged { from, to } => {
            SESSION_TRANSITIONS.with_label_values(&[to.as_str()]).inc();
            if let Some(identity) = transport.identity() {
                log_session_event!(debug, identity, "Session transition recorded", from = %from, to = %to);
            }
        }
        SessionEvent::Connected { identity, wallet } => {
            SESSION_CONNECTED.set(1.0);
            log_session_event!(info, identity, "Wallet session connected", remote = %wallet.remote);
        }
        SessionEvent::Disconnected { reason } => {
            SESSION_CONNECTED.set(0.0);
            if *reason == DisconnectReason::LivenessTimeout {
                HEARTBEAT_TIMEOUTS.inc();
            }
            if let Some(identity) = transport.identity() {
                log_session_event!(info, identity, "Wallet session disconnected", reason = %reason);
            }
        }
        SessionEvent::Error(_) => {
            SESSION_ERRORS.with_label_values(&["transport"]).inc();
        }
        SessionEvent::Latency(latency) => {
            HEARTBEAT_LATENCY.observe(latency.as_secs_f64());
        }
        SessionEvent::Frame { direction, kind } => {
            match direction {
                FrameDirection::Outbound => FRAMES_SENT.with_label_values(&[*kind]).inc(),
                FrameDirection::Inbound => {
                    FRAMES_RECEIVED.with_label_values(&[*kind]).inc();
                    if *kind == "opaque" {
                        DECODE_FALLBACKS.inc();
                    }
                }
            }
        }
        SessionEvent::Message(_) | SessionEvent::Notice(_) => {}
    }
}

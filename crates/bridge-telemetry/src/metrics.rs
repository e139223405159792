//! Prometheus metrics for the wallet session.
//!
//! All metrics follow the naming convention: `wb_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., frames_sent_total)
//! - **Gauge**: Value that can go up or down (e.g., session_connected)
//! - **Histogram**: Distribution of values (e.g., heartbeat_latency_seconds)

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SESSION METRICS
    // =========================================================================

    /// Session state transitions by target state
    pub static ref SESSION_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("wb_session_transitions_total", "Session state transitions"),
        &["to"]
    ).expect("metric creation failed");

    /// 1 while a wallet channel is connected
    pub static ref SESSION_CONNECTED: Gauge = Gauge::new(
        "wb_session_connected",
        "Whether a wallet channel is currently connected"
    ).expect("metric creation failed");

    /// Session errors by origin
    pub static ref SESSION_ERRORS: CounterVec = CounterVec::new(
        Opts::new("wb_session_errors_total", "Session errors"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // HEARTBEAT METRICS
    // =========================================================================

    /// Heartbeat round-trip latency
    pub static ref HEARTBEAT_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "wb_heartbeat_latency_seconds",
            "Round-trip time of heartbeat ping/pong"
        ).buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5])
    ).expect("metric creation failed");

    /// Heartbeat timeouts (forced disconnects)
    pub static ref HEARTBEAT_TIMEOUTS: Counter = Counter::new(
        "wb_heartbeat_timeouts_total",
        "Pongs not received within the heartbeat timeout"
    ).expect("metric creation failed");

    // =========================================================================
    // PROTOCOL METRICS
    // =========================================================================

    /// Frames handed to the transport
    pub static ref FRAMES_SENT: CounterVec = CounterVec::new(
        Opts::new("wb_protocol_frames_sent_total", "Frames sent to the wallet"),
        &["kind"]
    ).expect("metric creation failed");

    /// Frames received from the wallet
    pub static ref FRAMES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("wb_protocol_frames_received_total", "Frames received from the wallet"),
        &["kind"]
    ).expect("metric creation failed");

    /// Frames that did not decode and were passed through verbatim
    pub static ref DECODE_FALLBACKS: Counter = Counter::new(
        "wb_protocol_decode_fallbacks_total",
        "Frames passed through as opaque text"
    ).expect("metric creation failed");
}

/// Handle to the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Session
        Box::new(SESSION_TRANSITIONS.clone()),
        Box::new(SESSION_CONNECTED.clone()),
        Box::new(SESSION_ERRORS.clone()),
        // Heartbeat
        Box::new(HEARTBEAT_LATENCY.clone()),
        Box::new(HEARTBEAT_TIMEOUTS.clone()),
        // Protocol
        Box::new(FRAMES_SENT.clone()),
        Box::new(FRAMES_RECEIVED.clone()),
        Box::new(DECODE_FALLBACKS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

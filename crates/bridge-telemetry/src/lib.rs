//! # Bridge Telemetry
//!
//! Observability for the wallet bridge.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter` and a pretty or
//!   JSON formatter, chosen by [`TelemetryConfig`].
//! - **Metrics**: Prometheus collectors for session transitions, heartbeat
//!   latency and frame traffic.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WB_SERVICE_NAME` | `wallet-bridge` | Service name attached to logs |
//! | `WB_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `WB_JSON_LOGS` | `false` | Emit JSON log lines |
//! | `WB_CONSOLE_OUTPUT` | `true` | Emit logs at all |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, DECODE_FALLBACKS, FRAMES_RECEIVED,
    FRAMES_SENT, HEARTBEAT_LATENCY, HEARTBEAT_TIMEOUTS, SESSION_CONNECTED, SESSION_ERRORS,
    SESSION_TRANSITIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

//! # Wallet Bridge Demo
//!
//! Runs the session stack end to end in one process. The wallet side is
//! simulated over the in-memory transport: it answers heartbeats, signs
//! every `signTx` request and echoes text messages.
//!
//! ## Environment
//!
//! - `WB_CONFIG` - path of a TOML config file
//! - `WB_IN_APP_DEMO` - pretend to run inside the wallet browser
//! - `WB_DEMO_SECONDS` - how long to run before shutting down (default 12)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bridge_runtime::adapters::ScriptedWallet;
use bridge_runtime::{
    build_session, log_wallet_messages, BridgeConfig, InAppWalletService, InPageWallet,
    MetricsBridge, ServiceManager, TxRequest,
};
use bridge_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use shared_types::{ConnectionMode, SystemTimeSource, TimeSource};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use wb_02_message_codec::{decode, encode, Envelope, HeartbeatAction, WalletMethod};
use wb_03_peer_transport::{MemoryTransport, WalletHandle};

const DEFAULT_DEMO_SECONDS: u64 = 12;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let config_path = std::env::var("WB_CONFIG").ok().map(PathBuf::from);
    let config = BridgeConfig::resolve(config_path.as_deref()).context("loading configuration")?;
    let run_for = Duration::from_secs(
        std::env::var("WB_DEMO_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DEMO_SECONDS),
    );

    info!("===========================================");
    info!("  Wallet Bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let transport = MemoryTransport::new();
    let session = build_session(&config, Arc::new(transport.clone()));
    let metrics = MetricsBridge::attach(&session);
    let messages = log_wallet_messages(&session);

    let in_page: Option<Arc<dyn InPageWallet>> = std::env::var("WB_IN_APP_DEMO")
        .is_ok()
        .then(|| Arc::new(ScriptedWallet::new("demoWallet").with_balance("25000000")) as _);
    let manager = ServiceManager::new(session.clone(), Arc::new(InAppWalletService::new(in_page)));

    let mode = manager
        .initialize()
        .await
        .context("initializing services")?;
    info!(%mode, identity = ?session.identity(), "Services ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    match mode {
        ConnectionMode::InAppBrowser => {
            let request = TxRequest {
                product_name: Some("Demo NFT".to_string()),
                ..TxRequest::payment("5 ADA", "addr_test1qdemo")
            };
            match manager.in_app().sign_transaction(request).await {
                Ok(signature) => info!(%signature, "Transaction SIGNED!"),
                Err(e) => warn!(error = %e, "Transaction REJECTED"),
            }
        }
        ConnectionMode::P2p => {
            let wallet = transport
                .connect_wallet("demo-wallet")
                .context("no endpoint to connect the demo wallet to")?;
            tokio::spawn(simulate_wallet(wallet, shutdown_rx));

            tokio::time::sleep(Duration::from_millis(100)).await;
            session.send_text("Hello from the dApp");
            session.sign_transaction(None);
        }
    }

    info!(seconds = run_for.as_secs(), "Demo running. Press Ctrl+C to stop.");
    tokio::select! {
        () = tokio::time::sleep(run_for) => {}
        result = tokio::signal::ctrl_c() => result?,
    }

    let _ = shutdown_tx.send(true);
    if let Some(latency) = session.latency() {
        info!(latency_ms = latency.as_millis(), "Last heartbeat round trip");
    }
    debug!(metrics = %encode_metrics()?, "Final metrics");

    session.unsubscribe(messages);
    metrics.detach();
    manager.cleanup();
    info!("Wallet bridge stopped");
    Ok(())
}

/// Play the wallet: answer pings, sign `signTx` requests, echo text.
async fn simulate_wallet(mut wallet: WalletHandle, mut shutdown: watch::Receiver<bool>) {
    let clock = SystemTimeSource::new();
    loop {
        let frame = tokio::select! {
            frame = wallet.recv() => frame,
            _ = shutdown.changed() => None,
        };
        let Some(frame) = frame else {
            break;
        };

        let reply = match decode(&frame) {
            Envelope::Heartbeat(hb) if hb.action == HeartbeatAction::Ping => {
                Some(Envelope::pong(hb.sent_at, clock.now_millis()))
            }
            Envelope::Request(request)
                if WalletMethod::from_wire(&request.method) == Some(WalletMethod::SignTx) =>
            {
                Some(Envelope::response(
                    request.method,
                    serde_json::json!({
                        "signature": format!("demo-sig-{}", request.correlation_id),
                        "status": "submitted",
                    }),
                    Some(request.correlation_id),
                ))
            }
            Envelope::Text(text) => Some(Envelope::text(format!("Wallet received: {}", text.message))),
            _ => None,
        };

        if let Some(reply) = reply {
            if !wallet.send(&encode(&reply)) {
                break;
            }
        }
    }
    debug!("Demo wallet stopped");
}

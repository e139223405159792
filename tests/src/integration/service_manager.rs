//! # Service Manager
//!
//! Mode detection and the services behind each mode, wired as the binary
//! wires them.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bridge_runtime::adapters::ScriptedWallet;
    use bridge_runtime::{
        build_session, BridgeConfig, InAppEvent, InAppTopic, InAppWalletService, InPageWallet,
        MetricsBridge, ServiceManager, TxRequest, WalletError,
    };
    use bridge_telemetry::{FRAMES_RECEIVED, FRAMES_SENT, SESSION_TRANSITIONS};
    use serde_json::json;
    use shared_bus::EventFilter;
    use shared_types::{ConnectionMode, SessionState};
    use wb_02_message_codec::{decode, encode, Envelope};
    use wb_03_peer_transport::MemoryTransport;
    use wb_05_session::{LifecycleTrigger, SessionTopic};

    use crate::integration::fixtures::settle;

    fn manager(transport: &MemoryTransport, wallet: Option<ScriptedWallet>) -> Arc<ServiceManager> {
        let session = build_session(&BridgeConfig::default(), Arc::new(transport.clone()));
        let wallet = wallet.map(|w| Arc::new(w) as Arc<dyn InPageWallet>);
        Arc::new(ServiceManager::new(
            session,
            Arc::new(InAppWalletService::new(wallet)),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_p2p_round_trip_is_recorded() {
        let transport = MemoryTransport::new();
        let manager = manager(&transport, None);
        let metrics = MetricsBridge::attach(manager.session());
        let ready_before = SESSION_TRANSITIONS.with_label_values(&["ready"]).get();
        let sent_before = FRAMES_SENT.with_label_values(&["request"]).get();
        let received_before = FRAMES_RECEIVED.with_label_values(&["response"]).get();

        assert_eq!(manager.initialize().await, Ok(ConnectionMode::P2p));
        let mut wallet = transport.connect_wallet("wallet-1").unwrap();
        settle().await;
        assert!(manager.session().is_connected());

        let mut messages = manager
            .session()
            .events(EventFilter::topic(SessionTopic::Message));
        assert!(manager.session().call("getBalance", json!(null)));

        let Envelope::Request(request) = decode(&wallet.try_recv().unwrap()) else {
            panic!("expected request");
        };
        let reply = Envelope::response("getBalance", json!("25000000"), Some(request.correlation_id));
        assert!(wallet.send(&encode(&reply)));
        settle().await;

        assert_eq!(messages.drain().len(), 1);
        assert!(SESSION_TRANSITIONS.with_label_values(&["ready"]).get() > ready_before);
        assert!(FRAMES_SENT.with_label_values(&["request"]).get() > sent_before);
        assert!(FRAMES_RECEIVED.with_label_values(&["response"]).get() > received_before);

        assert!(metrics.detach());
        assert!(manager.cleanup());
        assert_eq!(manager.session().status(), SessionState::Closed);
        assert!(!wallet.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_app_mode_signs_through_wallet() {
        let transport = MemoryTransport::new();
        let wallet = ScriptedWallet::new("demoWallet").with_balance("25000000");
        let signed = wallet.signed();
        let manager = manager(&transport, Some(wallet));

        assert_eq!(manager.initialize().await, Ok(ConnectionMode::InAppBrowser));
        assert_eq!(manager.wait_for_mode().await, Some(ConnectionMode::InAppBrowser));
        assert_eq!(transport.created(), 0);

        let in_app = manager.in_app();
        let mut events = in_app.events(EventFilter::topic(InAppTopic::TransactionSigned));
        assert_eq!(in_app.get_balance().await, Ok("25000000".to_string()));

        let request = TxRequest {
            product_name: Some("Demo NFT".to_string()),
            ..TxRequest::payment("5 ADA", "addr_test1qdemo")
        };
        let signature = in_app.sign_transaction(request.clone()).await.unwrap();

        assert_eq!(
            events.drain(),
            vec![InAppEvent::TransactionSigned { signature, request }]
        );
        let signed = signed.lock();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].amount, "5 ADA");
        assert_eq!(signed[0].fee, "0.17 ADA");

        // Lifecycle triggers belong to the peer session only.
        assert!(!manager.handle_lifecycle(LifecycleTrigger::FocusGained).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_signature_reaches_caller_and_observers() {
        let transport = MemoryTransport::new();
        let manager = manager(&transport, Some(ScriptedWallet::new("demoWallet").rejecting()));
        manager.initialize().await.unwrap();

        let mut rejected = manager
            .in_app()
            .events(EventFilter::topic(InAppTopic::TransactionRejected));
        let result = manager
            .in_app()
            .sign_transaction(TxRequest::payment("1 ADA", "addr_test1qdemo"))
            .await;

        assert!(matches!(result, Err(WalletError::Rejected(_))));
        assert_eq!(rejected.drain().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_watch_follows_cleanup() {
        let transport = MemoryTransport::new();
        let manager = manager(&transport, None);
        let mut modes = manager.mode_watch();
        assert_eq!(*modes.borrow(), None);

        manager.initialize().await.unwrap();
        modes.changed().await.unwrap();
        assert_eq!(*modes.borrow_and_update(), Some(ConnectionMode::P2p));

        manager.cleanup();
        modes.changed().await.unwrap();
        assert_eq!(*modes.borrow_and_update(), None);
    }
}

//! # Session Flows
//!
//! End-to-end behaviour of the session over the in-memory transport:
//!
//! 1. **Initialisation**: concurrent callers share one endpoint
//! 2. **Heartbeat**: one ping in flight, latency, liveness timeout
//! 3. **Messaging**: fail-closed sends, request/response correlation
//! 4. **Recovery**: wallet reconnects, lifecycle-triggered reconnect

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use shared_types::{FixedTimeSource, SessionState};
    use wb_02_message_codec::{decode, encode, Envelope, HeartbeatAction};
    use wb_03_peer_transport::MemoryTransport;
    use wb_05_session::{DisconnectReason, LifecycleTrigger, SessionConfig, SessionEvent, SessionTopic};

    use crate::integration::fixtures::{advance, settle, Bridge};

    fn expect_ping(frame: &str) -> u64 {
        match decode(frame) {
            Envelope::Heartbeat(hb) if hb.action == HeartbeatAction::Ping => hb.sent_at,
            other => panic!("expected ping, got {other:?}"),
        }
    }

    // =========================================================================
    // INITIALISATION
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_initialize_creates_one_endpoint() {
        let bridge = Bridge::manual_open();
        let mut statuses = bridge.events(SessionTopic::StatusChanged);

        let first = tokio::spawn({
            let session = bridge.session.clone();
            async move { session.initialize().await }
        });
        let second = tokio::spawn({
            let session = bridge.session.clone();
            async move { session.initialize().await }
        });
        settle().await;
        assert_eq!(bridge.session.status(), SessionState::Initializing);

        bridge.transport.open_endpoint();
        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(bridge.transport.created(), 1);
        assert_eq!(
            statuses.drain(),
            vec![
                SessionEvent::StatusChanged {
                    from: SessionState::Uninitialized,
                    to: SessionState::Initializing
                },
                SessionEvent::StatusChanged {
                    from: SessionState::Initializing,
                    to: SessionState::Ready
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_timeout_leaves_session_errored() {
        let bridge = Bridge::manual_open();
        let mut errors = bridge.events(SessionTopic::Error);

        let result = bridge.session.initialize().await;

        assert!(result.is_err());
        assert_eq!(bridge.session.status(), SessionState::Errored);
        assert_eq!(errors.drain().len(), 1);
    }

    // =========================================================================
    // HEARTBEAT
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_pong_within_timeout_measures_latency() {
        let bridge = Bridge::with_heartbeat(1_000, 3_000);
        let mut disconnects = bridge.events(SessionTopic::Disconnected);
        let mut wallet = bridge.connect().await;

        let sent_at = expect_ping(&wallet.recv().await.unwrap());
        assert_eq!(sent_at, 1_000);

        advance(400).await;
        assert!(wallet.send(&encode(&Envelope::pong(sent_at, 1_400))));
        settle().await;

        assert_eq!(bridge.session.latency(), Some(Duration::from_millis(400)));
        advance(3_000).await;
        assert!(bridge.session.is_connected());
        assert!(disconnects.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_pong_disconnects_at_deadline() {
        let bridge = Bridge::with_heartbeat(1_000, 3_000);
        let _wallet = bridge.connect().await;

        advance(3_985).await;
        assert!(bridge.session.is_connected());

        advance(20).await;
        assert_eq!(bridge.session.status(), SessionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_liveness_loss_disconnects_exactly_once() {
        let bridge = Bridge::new();
        let mut disconnects = bridge.events(SessionTopic::Disconnected);
        let wallet = bridge.connect().await;

        advance(30_000).await;

        assert_eq!(
            disconnects.drain(),
            vec![SessionEvent::Disconnected {
                reason: DisconnectReason::LivenessTimeout
            }]
        );
        assert_eq!(bridge.session.status(), SessionState::Disconnected);
        assert!(!bridge.session.heartbeat_running());
        assert!(!wallet.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_ping_outstanding_across_round_trips() {
        let bridge = Bridge::with_heartbeat(1_000, 3_000);
        let mut wallet = bridge.connect().await;
        let mut pings = Vec::new();

        for _ in 0..3 {
            let sent_at = expect_ping(&wallet.recv().await.unwrap());
            pings.push(sent_at);

            // Two ticks pass while the ping is unanswered.
            advance(1_500).await;
            assert!(wallet.try_recv().is_none());

            assert!(wallet.send(&encode(&Envelope::pong(sent_at, sent_at + 10))));
            settle().await;
        }
        assert_eq!(pings, vec![1_000, 3_000, 5_000]);

        wallet.close();
        settle().await;
        assert!(!bridge.session.heartbeat_running());

        advance(1_000).await;
        assert!(wallet.try_recv().is_none());
        assert_eq!(bridge.session.status(), SessionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_ping_gets_pong() {
        let bridge = Bridge::new();
        let mut wallet = bridge.connect().await;

        assert!(wallet.send(r#"{"kind":"heartbeat","action":"ping","sentAt":77}"#));
        settle().await;

        match decode(&wallet.try_recv().unwrap()) {
            Envelope::Heartbeat(pong) => {
                assert_eq!(pong.action, HeartbeatAction::Pong);
                assert_eq!(pong.sent_at, 77);
            }
            other => panic!("expected pong, got {other:?}"),
        }
    }

    // =========================================================================
    // MESSAGING
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_sends_without_channel_touch_nothing() {
        let bridge = Bridge::new();
        assert!(!bridge.session.transport().send("{}"));

        bridge.session.initialize().await.unwrap();
        assert!(!bridge.session.transport().send("{}"));
        assert!(!bridge.session.send_text("hello"));
        assert!(!bridge.session.sign_transaction(None));
        assert_eq!(bridge.transport.send_calls(), 0);

        let wallet = bridge.connect().await;
        wallet.close();
        settle().await;
        assert!(!bridge.session.send_text("hello"));
        assert_eq!(bridge.transport.send_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_tx_response_is_published_once() {
        let bridge = Bridge::build(
            MemoryTransport::new(),
            SessionConfig::default(),
            None,
            Some(Arc::new(FixedTimeSource::new(42))),
        );
        let mut messages = bridge.events(SessionTopic::Message);
        let mut wallet = bridge.connect().await;

        let id = bridge
            .session
            .call_with_id("signTx", json!({"cbor": "84a4", "partial": false}))
            .unwrap();
        assert_eq!(id, 42);

        let request = wallet.try_recv().unwrap();
        assert!(request.contains(r#""correlationId":42"#));
        assert!(request.contains(r#""method":"signTx""#));

        assert!(wallet.send(
            r#"{"kind":"response","method":"signTx","payload":{"signature":"84a100","status":"submitted"},"correlationId":42}"#
        ));
        settle().await;

        let events = messages.drain();
        assert_eq!(events.len(), 1);
        let SessionEvent::Message(Envelope::Response(response)) = &events[0] else {
            panic!("expected response, got {:?}", events[0]);
        };
        assert_eq!(response.payload, json!({"signature": "84a100", "status": "submitted"}));
        assert_eq!(bridge.session.pending_calls(), 0);
        assert_eq!(
            Envelope::Response(response.clone()).display_lines(),
            vec!["Transaction SIGNED!", "Signature: 84a100", "Status: submitted"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_without_id_matches_by_method() {
        let bridge = Bridge::new();
        let mut messages = bridge.events(SessionTopic::Message);
        let wallet = bridge.connect().await;

        assert!(bridge.session.sign_transaction(None));
        assert_eq!(bridge.session.pending_calls(), 1);

        assert!(wallet.send(r#"{"kind":"response","method":"signTx","error":"User rejected"}"#));
        settle().await;

        assert_eq!(bridge.session.pending_calls(), 0);
        let events = messages.drain();
        assert_eq!(events.len(), 1);
        let SessionEvent::Message(envelope) = &events[0] else {
            panic!("expected message");
        };
        assert_eq!(envelope.summary(), "Transaction REJECTED: User rejected");
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_and_garbage_reach_observers() {
        let bridge = Bridge::new();
        let mut messages = bridge.events(SessionTopic::Message);
        let mut wallet = bridge.connect().await;

        assert!(bridge.session.send_text("hi wallet"));
        assert_eq!(wallet.try_recv().unwrap(), r#"{"message":"hi wallet"}"#);

        wallet.send(r#"{"message":"hi dApp"}"#);
        wallet.send("not json");
        settle().await;

        assert_eq!(
            messages.drain(),
            vec![
                SessionEvent::Message(Envelope::text("hi dApp")),
                SessionEvent::Message(Envelope::Opaque("not json".into())),
            ]
        );
    }

    // =========================================================================
    // RECOVERY
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_wallet_can_reconnect_after_drop() {
        let bridge = Bridge::new();
        let mut connects = bridge.events(SessionTopic::Connected);
        let first = bridge.connect().await;

        first.close();
        settle().await;
        assert_eq!(bridge.session.status(), SessionState::Disconnected);

        let second = bridge.transport.connect_wallet("wallet-1").unwrap();
        settle().await;

        assert!(bridge.session.is_connected());
        assert_eq!(bridge.session.wallet(), Some(second.info()));
        assert_eq!(connects.drain().len(), 2);
        assert_eq!(bridge.transport.created(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_regained_reconnects_after_server_loss() {
        let bridge = Bridge::new();
        bridge.session.initialize().await.unwrap();
        settle().await;

        bridge.transport.server_disconnect();
        settle().await;
        assert_eq!(bridge.session.status(), SessionState::Disconnected);

        assert!(
            bridge
                .session
                .handle_lifecycle(LifecycleTrigger::VisibilityRegained)
                .await
        );
        settle().await;

        assert_eq!(bridge.session.status(), SessionState::Ready);
        let _wallet = bridge.transport.connect_wallet("wallet-1").unwrap();
        settle().await;
        assert!(bridge.session.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_wallet_is_refused() {
        let bridge = Bridge::new();
        let first = bridge.connect().await;

        let second = bridge.transport.connect_wallet("wallet-2").unwrap();
        settle().await;

        assert!(first.is_open());
        assert!(!second.is_open());
        assert_eq!(bridge.session.wallet(), Some(first.info()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_publishes_disconnect_then_closes() {
        let bridge = Bridge::new();
        let mut events = bridge.events(SessionTopic::Disconnected);
        let wallet = bridge.connect().await;

        bridge.session.destroy();
        settle().await;

        assert_eq!(bridge.session.status(), SessionState::Closed);
        assert!(!wallet.is_open());
        assert!(bridge.transport.is_endpoint_destroyed());
        assert_eq!(
            events.drain(),
            vec![SessionEvent::Disconnected {
                reason: DisconnectReason::LocalRequest
            }]
        );
    }
}

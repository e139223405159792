//! # Identity Persistence
//!
//! The identity survives restarts when a file store is configured.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use bridge_runtime::{build_session, BridgeConfig};
    use wb_03_peer_transport::MemoryTransport;

    fn config_with_store(path: &std::path::Path) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.identity.store_path = Some(path.to_path_buf());
        config
    }

    #[tokio::test]
    async fn test_persisted_identity_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        fs::write(&path, r#"{"dapp-peer-id":"dapp-abc123-xy9"}"#).unwrap();
        let config = config_with_store(&path);

        let first = build_session(&config, Arc::new(MemoryTransport::new()));
        let identity = first.initialize().await.unwrap();
        assert_eq!(identity.as_str(), "dapp-abc123-xy9");
        first.destroy();

        let second = build_session(&config, Arc::new(MemoryTransport::new()));
        assert_eq!(second.initialize().await.unwrap().as_str(), "dapp-abc123-xy9");
    }

    #[tokio::test]
    async fn test_generated_identity_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("identity.json");
        let config = config_with_store(&path);

        let first = build_session(&config, Arc::new(MemoryTransport::new()))
            .initialize()
            .await
            .unwrap();
        let stored = fs::read_to_string(&path).unwrap();
        assert!(stored.contains(first.as_str()));

        let second = build_session(&config, Arc::new(MemoryTransport::new()))
            .initialize()
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_storage_key_separates_identities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        fs::write(&path, r#"{"dapp-peer-id":"dapp-abc123-xy9"}"#).unwrap();

        let mut config = config_with_store(&path);
        config.identity.storage_key = "other-app".into();

        let identity = build_session(&config, Arc::new(MemoryTransport::new()))
            .initialize()
            .await
            .unwrap();
        assert_ne!(identity.as_str(), "dapp-abc123-xy9");
        assert!(identity.as_str().starts_with("dapp-"));
    }
}

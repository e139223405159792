//! # Bridge Configuration
//!
//! Settings for every session component, loaded from a TOML file and then
//! overridden from `WB_*` environment variables. Every field has a default,
//! so an empty file (or no file) is a valid configuration.
//!
//! ## Config File Format
//!
//! ```toml
//! [heartbeat]
//! interval_ms = 5000
//! timeout_ms = 3000
//!
//! [identity]
//! storage_key = "dapp-peer-id"
//! store_path = "./data/identity.json"
//!
//! [transport]
//! open_timeout_ms = 20000
//! ice_servers = ["stun:stun.l.google.com:19302"]
//! debug = 1
//!
//! [session]
//! max_pending_calls = 64
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `WB_HEARTBEAT_INTERVAL_MS` | `heartbeat.interval_ms` |
//! | `WB_HEARTBEAT_TIMEOUT_MS` | `heartbeat.timeout_ms` |
//! | `WB_STORAGE_KEY` | `identity.storage_key` |
//! | `WB_STORE_PATH` | `identity.store_path` |
//! | `WB_OPEN_TIMEOUT_MS` | `transport.open_timeout_ms` |
//! | `WB_ICE_SERVERS` | `transport.ice_servers` (comma separated) |
//! | `WB_TRANSPORT_DEBUG` | `transport.debug` |
//! | `WB_MAX_PENDING_CALLS` | `session.max_pending_calls` |

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use wb_01_identity::DAPP_PEER_ID_KEY;
use wb_03_peer_transport::TransportConfig;
use wb_04_heartbeat::HeartbeatConfig;
use wb_05_session::{SessionConfig, DEFAULT_MAX_PENDING_CALLS};

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// The file is not valid TOML or has fields of the wrong type.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Values parse but cannot work together.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Heartbeat timing.
    pub heartbeat: HeartbeatSection,
    /// Identity persistence.
    pub identity: IdentitySection,
    /// Peer transport settings.
    pub transport: TransportSection,
    /// Session limits.
    pub session: SessionSection,
}

/// `[heartbeat]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeartbeatSection {
    /// Milliseconds between pings.
    pub interval_ms: u64,
    /// Milliseconds to wait for a pong.
    pub timeout_ms: u64,
}

impl Default for HeartbeatSection {
    fn default() -> Self {
        let defaults = HeartbeatConfig::default();
        Self {
            interval_ms: millis(defaults.interval),
            timeout_ms: millis(defaults.timeout),
        }
    }
}

/// `[identity]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentitySection {
    /// Key the identity is persisted under.
    pub storage_key: String,
    /// JSON file backing the store. In-memory when unset.
    pub store_path: Option<PathBuf>,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            storage_key: DAPP_PEER_ID_KEY.to_string(),
            store_path: None,
        }
    }
}

/// `[transport]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportSection {
    /// Milliseconds to wait for the signaling server.
    pub open_timeout_ms: u64,
    /// STUN/TURN server URLs.
    pub ice_servers: Vec<String>,
    /// Transport verbosity.
    pub debug: u8,
}

impl Default for TransportSection {
    fn default() -> Self {
        let defaults = TransportConfig::default();
        Self {
            open_timeout_ms: millis(defaults.open_timeout),
            ice_servers: defaults.ice_servers,
            debug: defaults.debug,
        }
    }
}

/// `[session]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Bound on requests awaiting a response.
    pub max_pending_calls: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            max_pending_calls: DEFAULT_MAX_PENDING_CALLS,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path` when given, then apply environment overrides and
    /// validate.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                info!(path = %path.display(), "Loading bridge configuration");
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `WB_*` environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// Values that do not parse are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "WB_HEARTBEAT_INTERVAL_MS", &mut self.heartbeat.interval_ms);
        override_parsed(&lookup, "WB_HEARTBEAT_TIMEOUT_MS", &mut self.heartbeat.timeout_ms);
        override_parsed(&lookup, "WB_OPEN_TIMEOUT_MS", &mut self.transport.open_timeout_ms);
        override_parsed(&lookup, "WB_TRANSPORT_DEBUG", &mut self.transport.debug);
        override_parsed(&lookup, "WB_MAX_PENDING_CALLS", &mut self.session.max_pending_calls);

        if let Some(key) = lookup("WB_STORAGE_KEY") {
            self.identity.storage_key = key;
        }
        if let Some(path) = lookup("WB_STORE_PATH") {
            self.identity.store_path = Some(PathBuf::from(path));
        }
        if let Some(servers) = lookup("WB_ICE_SERVERS") {
            self.transport.ice_servers = servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Reject values no component can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat.interval_ms == 0 {
            return Err(ConfigError::Invalid("heartbeat.interval_ms must be > 0".into()));
        }
        if self.heartbeat.timeout_ms == 0 {
            return Err(ConfigError::Invalid("heartbeat.timeout_ms must be > 0".into()));
        }
        if self.transport.open_timeout_ms == 0 {
            return Err(ConfigError::Invalid("transport.open_timeout_ms must be > 0".into()));
        }
        if self.session.max_pending_calls == 0 {
            return Err(ConfigError::Invalid("session.max_pending_calls must be > 0".into()));
        }
        if self.identity.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("identity.storage_key must not be empty".into()));
        }
        Ok(())
    }

    /// Heartbeat timing for the monitor.
    #[must_use]
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::from_millis(self.heartbeat.interval_ms, self.heartbeat.timeout_ms)
    }

    /// Settings for the transport adapter.
    #[must_use]
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            open_timeout: Duration::from_millis(self.transport.open_timeout_ms),
            ice_servers: self.transport.ice_servers.clone(),
            debug: self.transport.debug,
        }
    }

    /// Settings for the session manager.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            heartbeat: self.heartbeat_config(),
            max_pending_calls: self.session.max_pending_calls,
        }
    }
}

fn override_parsed<T, F>(lookup: &F, key: &str, target: &mut T)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = %raw, "Ignoring unparseable config override"),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_components() {
        let config = BridgeConfig::default();
        assert_eq!(config.heartbeat.interval_ms, 5_000);
        assert_eq!(config.heartbeat.timeout_ms, 3_000);
        assert_eq!(config.identity.storage_key, "dapp-peer-id");
        assert_eq!(config.transport.open_timeout_ms, 20_000);
        assert_eq!(config.transport.ice_servers.len(), 2);
        assert_eq!(config.session.max_pending_calls, 64);
        assert_eq!(config.transport_config(), TransportConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(BridgeConfig::parse("").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = BridgeConfig::parse(
            r#"
            [heartbeat]
            interval_ms = 1000

            [identity]
            store_path = "/tmp/wb/identity.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.heartbeat.interval_ms, 1_000);
        assert_eq!(config.heartbeat.timeout_ms, 3_000);
        assert_eq!(
            config.identity.store_path,
            Some(PathBuf::from("/tmp/wb/identity.json"))
        );
        assert_eq!(config.identity.storage_key, "dapp-peer-id");
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = BridgeConfig::parse("[heartbeat]\ninterval_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = BridgeConfig::load("/nonexistent/wallet-bridge.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        fs::write(&path, "[session]\nmax_pending_calls = 8\n").unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.session.max_pending_calls, 8);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BridgeConfig::default();
        config.apply_overrides(env(&[
            ("WB_HEARTBEAT_INTERVAL_MS", "2500"),
            ("WB_STORAGE_KEY", "custom-key"),
            ("WB_ICE_SERVERS", "stun:a:1, ,stun:b:2"),
            ("WB_TRANSPORT_DEBUG", "3"),
        ]));

        assert_eq!(config.heartbeat.interval_ms, 2_500);
        assert_eq!(config.identity.storage_key, "custom-key");
        assert_eq!(config.transport.ice_servers, vec!["stun:a:1", "stun:b:2"]);
        assert_eq!(config.transport.debug, 3);
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let mut config = BridgeConfig::default();
        config.apply_overrides(env(&[("WB_MAX_PENDING_CALLS", "lots")]));
        assert_eq!(config.session.max_pending_calls, 64);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = BridgeConfig::default();
        config.heartbeat.timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = BridgeConfig::default();
        config.identity.storage_key = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_config_conversion() {
        let mut config = BridgeConfig::default();
        config.heartbeat.interval_ms = 100;
        config.session.max_pending_calls = 4;

        let session = config.session_config();
        assert_eq!(session.heartbeat.interval, Duration::from_millis(100));
        assert_eq!(session.max_pending_calls, 4);
    }
}

use chrono::{Local, Offset};

use crate::domain::Fingerprint;
use crate::ports::FingerprintSource;

/// Fingerprint of the running process environment.
///
/// There is no screen in a native process, so screen metrics are `0x0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFingerprint;

impl SystemFingerprint {
    /// Create a new system fingerprint source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FingerprintSource for SystemFingerprint {
    fn fingerprint(&self) -> Fingerprint {
        let user_agent = format!(
            "wallet-bridge/{} ({}; {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        );

        let language = std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .map(|lang| lang.split('.').next().unwrap_or_default().replace('_', "-"))
            .unwrap_or_else(|_| "unknown".to_string());

        // Same sign convention as a browser: minutes to add to local time
        // to reach UTC.
        let local_minus_utc = Local::now().offset().fix().local_minus_utc();

        Fingerprint {
            user_agent,
            language,
            screen: (0, 0),
            timezone_offset_minutes: -(local_minus_utc / 60),
            concurrency: std::thread::available_parallelism().ok().map(usize::from),
        }
    }
}

/// Fixed fingerprint, for tests and embedded hosts that supply their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFingerprint(pub Fingerprint);

impl Default for StaticFingerprint {
    fn default() -> Self {
        Self(Fingerprint {
            user_agent: "wallet-bridge-test".into(),
            language: "en-US".into(),
            screen: (1280, 720),
            timezone_offset_minutes: 0,
            concurrency: Some(4),
        })
    }
}

impl FingerprintSource for StaticFingerprint {
    fn fingerprint(&self) -> Fingerprint {
        self.0.clone()
    }
}

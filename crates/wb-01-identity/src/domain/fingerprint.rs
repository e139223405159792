//! Device fingerprint and identity formatting.

use sha2::{Digest, Sha256};

use crate::IDENTITY_PREFIX;

/// Low-entropy description of the host device.
///
/// Only used to make identities of different devices unlikely to collide;
/// it is not a security boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// User-agent-like product string.
    pub user_agent: String,
    /// Preferred locale, e.g. `de-DE`.
    pub language: String,
    /// Screen width and height in pixels (`0x0` when headless).
    pub screen: (u32, u32),
    /// Minutes to add to local time to get UTC.
    pub timezone_offset_minutes: i32,
    /// Available parallelism, when known.
    pub concurrency: Option<usize>,
}

impl Fingerprint {
    /// Canonical `|`-joined form that is hashed.
    #[must_use]
    pub fn canonical(&self) -> String {
        let concurrency = self
            .concurrency
            .map_or_else(|| "unknown".to_string(), |c| c.to_string());
        format!(
            "{}|{}|{}x{}|{}|{}",
            self.user_agent,
            self.language,
            self.screen.0,
            self.screen.1,
            self.timezone_offset_minutes,
            concurrency
        )
    }

    /// Short base-36 token derived from the canonical form.
    #[must_use]
    pub fn token(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        let mut head = [0u8; 4];
        head.copy_from_slice(&digest[..4]);
        to_radix(u64::from(u32::from_be_bytes(head)), 36)
    }
}

/// Render `value` in the given radix (2..=36) with lowercase digits.
#[must_use]
pub fn to_radix(mut value: u64, radix: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let radix = u64::from(radix.clamp(2, 36));

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        let digit = usize::try_from(value % radix).unwrap_or(0);
        out.push(DIGITS.get(digit).copied().unwrap_or(b'0'));
        value /= radix;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// `dapp-<fingerprint token>-<creation time in base 24>`.
#[must_use]
pub fn format_identity(fingerprint: &Fingerprint, created_at_millis: u64) -> String {
    format!(
        "{}-{}-{}",
        IDENTITY_PREFIX,
        fingerprint.token(),
        to_radix(created_at_millis, 24)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Fingerprint {
        Fingerprint {
            user_agent: "wallet-bridge/0.1.0 (linux; x86_64)".into(),
            language: "en-US".into(),
            screen: (1920, 1080),
            timezone_offset_minutes: -60,
            concurrency: Some(8),
        }
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(
            sample().canonical(),
            "wallet-bridge/0.1.0 (linux; x86_64)|en-US|1920x1080|-60|8"
        );

        let headless = Fingerprint {
            concurrency: None,
            ..sample()
        };
        assert!(headless.canonical().ends_with("|unknown"));
    }

    #[test]
    fn test_token_is_stable_and_short() {
        let token = sample().token();
        assert_eq!(token, sample().token());
        assert!(token.len() <= 7);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_token_differs_between_devices() {
        let other = Fingerprint {
            language: "de-DE".into(),
            ..sample()
        };
        assert_ne!(sample().token(), other.token());
    }

    #[test]
    fn test_to_radix() {
        assert_eq!(to_radix(0, 36), "0");
        assert_eq!(to_radix(35, 36), "z");
        assert_eq!(to_radix(36, 36), "10");
        assert_eq!(to_radix(23, 24), "n");
        assert_eq!(to_radix(24, 24), "10");
        assert_eq!(to_radix(255, 16), "ff");
    }

    #[test]
    fn test_format_identity() {
        let id = format_identity(&sample(), 24 * 24);
        assert!(id.starts_with("dapp-"));
        assert!(id.ends_with("-100"));
        assert_eq!(id.matches('-').count(), 2);
    }
}

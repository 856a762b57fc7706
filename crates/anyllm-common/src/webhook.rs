use std::fmt::Write;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Default replay window for webhook timestamps.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

/// Verify an inbound webhook's authenticity.
///
/// `timestamp` is the Unix-seconds value the sender signed alongside the
/// body; anything older than `max_age` is rejected before the signature is
/// even looked at, so a captured request cannot be replayed later. The
/// signature format is `sha256=<hex of HMAC-SHA256(secret, raw_body)>`,
/// compared in constant time. Returns `false` on any malformed input, never
/// an error.
pub fn verify_signature(
    raw_body: &str,
    signature: &str,
    secret: &str,
    timestamp: &str,
    max_age: Duration,
) -> bool {
    let Ok(signed_at) = timestamp.trim().parse::<i64>() else {
        tracing::warn!(timestamp, "webhook timestamp is not a unix-seconds value");
        return false;
    };

    let now = chrono::Utc::now().timestamp();
    if now - signed_at > max_age.as_secs() as i64 {
        tracing::warn!(
            age_seconds = now - signed_at,
            "webhook timestamp too old, possible replay"
        );
        return false;
    }

    let Some(expected) = expected_signature(raw_body, secret) else {
        return false;
    };

    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

fn expected_signature(raw_body: &str, secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(raw_body.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut rendered = String::with_capacity("sha256=".len() + digest.len() * 2);
    rendered.push_str("sha256=");
    for byte in digest {
        let _ = write!(rendered, "{byte:02x}");
    }
    Some(rendered)
}

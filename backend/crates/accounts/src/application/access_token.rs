//! Access Tokens
//!
//! Stateless bearer tokens handed out on login: `<public_id>.<expiry_ms>.
//! <signature>` with an HMAC-SHA256 signature over the first two parts.
//! Verification is purely cryptographic; role checks re-read the account so
//! a demotion takes effect immediately.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Claims carried by a verified access token
#[derive(Debug, Clone)]
pub struct AccessClaims {
    /// Public ID of the authenticated account
    pub public_id: String,
    /// Expiry (Unix timestamp ms)
    pub expires_at_ms: i64,
}

/// Issue a signed access token for an account
pub fn issue_access_token(secret: &[u8; 32], public_id: &str, ttl_ms: i64) -> (String, i64) {
    let expires_at_ms = Utc::now().timestamp_millis() + ttl_ms;
    let payload = format!("{}.{}", public_id, expires_at_ms);

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    (format!("{}.{}", payload, signature), expires_at_ms)
}

/// Verify a presented access token
///
/// Returns the claims when the signature checks out and the token is
/// unexpired; `None` for anything else.
pub fn verify_access_token(secret: &[u8; 32], token: &str) -> Option<AccessClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload = format!("{}.{}", parts[0], parts[1]);

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());

    let signature = URL_SAFE_NO_PAD.decode(parts[2]).ok()?;
    mac.verify_slice(&signature).ok()?;

    let expires_at_ms: i64 = parts[1].parse().ok()?;
    if expires_at_ms <= Utc::now().timestamp_millis() {
        return None;
    }

    Some(AccessClaims {
        public_id: parts[0].to_string(),
        expires_at_ms,
    })
}

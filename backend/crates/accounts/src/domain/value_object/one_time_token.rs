//! One-Time Token Value Object
//!
//! Opaque single-use tokens for the email-verification and password-reset
//! flows. A token is usable exactly once: consumption clears the slot on the
//! owning account, and issuing a new token of the same kind discards the old
//! one with no grace period.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Token length in random bytes (256 bits)
const TOKEN_BYTES: usize = 32;

// ============================================================================
// Token Kind
// ============================================================================

/// The two independent token purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Proves ownership of the registered email address
    EmailVerification,
    /// Authorizes a password reset
    PasswordReset,
}

impl TokenKind {
    /// Validity window for newly issued tokens of this kind
    pub fn ttl(&self) -> Duration {
        match self {
            Self::EmailVerification => Duration::hours(24),
            Self::PasswordReset => Duration::hours(1),
        }
    }

    /// String code for logging
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// One-Time Token
// ============================================================================

/// An opaque random token with an absolute expiry instant
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl OneTimeToken {
    /// Issue a fresh token of the given kind
    ///
    /// 32 bytes from the secure random source, URL-safe base64 without
    /// padding; expiry is `now` plus the kind's TTL.
    pub fn issue(kind: TokenKind, now: DateTime<Utc>) -> Self {
        Self {
            value: platform::crypto::random_token(TOKEN_BYTES),
            expires_at: now + kind.ttl(),
        }
    }

    /// Reconstruct from stored parts
    pub fn from_parts(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// The opaque token string
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The absolute expiry instant
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token is still usable at `now`
    ///
    /// Expiry is strict: a token whose expiry equals the current instant is
    /// already dead.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Exact string comparison against a presented token
    pub fn matches(&self, presented: &str) -> bool {
        self.value == presented
    }
}

impl fmt::Debug for OneTimeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Token strings are credentials; keep them out of logs
        f.debug_struct("OneTimeToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

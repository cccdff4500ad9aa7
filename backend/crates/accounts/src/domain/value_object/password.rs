//! Password Value Objects
//!
//! `RawPassword` is the plaintext side: validated user input whose memory is
//! zeroized on drop and whose Debug output is redacted. `StoredPassword` is
//! the persisted side: the encoded credential produced by the platform codec.
//! The plaintext is never stored and never logged.

use platform::credential::{CredentialError, PasswordCredentialCodec};
use std::fmt;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password is too long
    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Password contains only whitespace
    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Password contains control characters
    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Plaintext password with automatic memory zeroization
///
/// Does not implement `Clone` to prevent accidental copies.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RawPassword(String);

impl RawPassword {
    /// Create a new raw password with validation
    ///
    /// Unicode is normalized using NFKC before validation, so the same
    /// password composed differently hashes identically.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        // Count Unicode code points, not bytes
        let char_count = normalized.chars().count();

        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        for ch in normalized.chars() {
            if ch.is_control() && ch != ' ' && ch != '\t' {
                return Err(PasswordPolicyError::InvalidCharacter);
            }
        }

        Ok(Self(normalized))
    }

    /// Access the normalized plaintext for derivation
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Stored Password (Encoded credential)
// ============================================================================

/// Encoded password credential for database storage
///
/// Holds either the self-describing Argon2id encoding or a legacy
/// fixed-layout credential; the codec distinguishes them on verify.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredPassword(String);

impl StoredPassword {
    /// Hash a raw password into a storable credential
    pub fn from_raw(
        codec: &PasswordCredentialCodec,
        raw: &RawPassword,
    ) -> Result<Self, CredentialError> {
        codec.hash(raw.as_str()).map(Self)
    }

    /// Create from a database value
    ///
    /// No format validation here: legacy credentials are indistinguishable
    /// from arbitrary base64, so unrecognized values surface as a failed
    /// verify rather than a load error.
    pub fn from_db(credential: impl Into<String>) -> Self {
        Self(credential.into())
    }

    /// Get the encoded credential for storage
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify a raw password against this credential
    pub fn verify(&self, codec: &PasswordCredentialCodec, raw: &RawPassword) -> bool {
        codec.verify(raw.as_str(), &self.0)
    }
}

impl fmt::Debug for StoredPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredPassword")
            .field("credential", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

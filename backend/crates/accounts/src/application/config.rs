//! Application Configuration
//!
//! Configuration for the Accounts application layer. Derivation cost
//! parameters live here explicitly (not in ambient statics) so tests can run
//! with cheap costs.

use std::time::Duration;

pub use platform::credential::CredentialParams;

/// Accounts application configuration
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// Password derivation cost parameters
    pub credential_params: CredentialParams,
    /// Secret key for HMAC-signing access tokens (32 bytes)
    pub access_token_secret: [u8; 32],
    /// Access token TTL
    pub access_token_ttl: Duration,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            credential_params: CredentialParams::default(),
            access_token_secret: [0u8; 32],
            access_token_ttl: Duration::from_secs(30 * 60), // 30 minutes
        }
    }
}

impl AccountsConfig {
    /// Create config with a random access-token secret
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            access_token_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development and tests
    ///
    /// Cheap derivation costs so hashing does not dominate test time.
    pub fn development() -> Self {
        Self {
            credential_params: CredentialParams::low_cost(),
            ..Self::with_random_secret()
        }
    }

    /// Get access token TTL in milliseconds
    pub fn access_token_ttl_ms(&self) -> i64 {
        self.access_token_ttl.as_millis() as i64
    }
}
